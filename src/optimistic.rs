//! Optimistic toggles with single-flight locking and rollback.
//!
//! A toggle publishes its guessed state immediately, performs exactly one
//! remote call and then publishes either the server's authoritative state or
//! the original state again. While a toggle for a `(kind, entity)` pair is in
//! flight, further toggles for the same pair are dropped, not queued.

use crate::error::ApiError;
use dashmap::DashSet;
use feedcore::types::events::{CoreEventBus, Event, NoticeKind, TogglePhase, ToggleUpdate};
use feedcore::types::toggle::{MutationKey, ToggleKind, ToggleableState};
use log::{debug, warn};
use std::future::Future;

#[derive(Debug)]
pub enum ToggleOutcome {
    /// Another mutation for the same entity was in flight; nothing happened.
    Skipped(ToggleableState),
    /// The server accepted the mutation; this is its authoritative state.
    Confirmed(ToggleableState),
    /// The remote call failed and the original state was restored.
    RolledBack {
        state: ToggleableState,
        error: ApiError,
    },
}

impl ToggleOutcome {
    /// The final published state.
    pub fn state(&self) -> &ToggleableState {
        match self {
            ToggleOutcome::Skipped(state) | ToggleOutcome::Confirmed(state) => state,
            ToggleOutcome::RolledBack { state, .. } => state,
        }
    }

    pub fn into_state(self) -> ToggleableState {
        match self {
            ToggleOutcome::Skipped(state) | ToggleOutcome::Confirmed(state) => state,
            ToggleOutcome::RolledBack { state, .. } => state,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ToggleOutcome::RolledBack { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, ToggleOutcome::Confirmed(_))
    }
}

#[derive(Debug)]
pub struct MutationController {
    in_flight: DashSet<MutationKey>,
    event_bus: CoreEventBus,
}

impl MutationController {
    pub fn new(event_bus: CoreEventBus) -> Self {
        Self {
            in_flight: DashSet::new(),
            event_bus,
        }
    }

    pub fn is_pending(&self, kind: ToggleKind, entity_id: &str) -> bool {
        self.in_flight
            .contains(&MutationKey::new(kind, entity_id))
    }

    fn publish(&self, kind: ToggleKind, state: &ToggleableState, phase: TogglePhase) {
        self.event_bus.dispatch(&Event::ToggleUpdated(ToggleUpdate {
            kind,
            state: state.clone(),
            phase,
        }));
    }

    /// Toggles `current` optimistically and reconciles with `remote_call`.
    ///
    /// Never returns an error: failures roll back, are reported in the
    /// outcome, and raise an `Event::Notice`.
    pub async fn toggle<F, Fut>(
        &self,
        kind: ToggleKind,
        current: ToggleableState,
        remote_call: F,
    ) -> ToggleOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ToggleableState, ApiError>>,
    {
        let key = MutationKey::new(kind, &current.entity_id);
        if !self.in_flight.insert(key.clone()) {
            debug!(target: "Optimistic", "Ignoring toggle of {key}: one is already in flight");
            return ToggleOutcome::Skipped(current);
        }
        // Released on every exit path, including the future being dropped.
        let _guard = scopeguard::guard(key, |key| {
            self.in_flight.remove(&key);
        });

        let optimistic = current.optimistic_next();
        debug!(
            target: "Optimistic",
            "{kind} {}: {}/{} -> {}/{} (pending)",
            current.entity_id, current.flag, current.count, optimistic.flag, optimistic.count
        );
        self.publish(kind, &optimistic, TogglePhase::Optimistic);

        match remote_call().await {
            Ok(mut confirmed) => {
                confirmed.entity_id.clone_from(&current.entity_id);
                if confirmed != optimistic {
                    debug!(
                        target: "Optimistic",
                        "{kind} {}: server corrected guess to {}/{}",
                        confirmed.entity_id, confirmed.flag, confirmed.count
                    );
                }
                self.publish(kind, &confirmed, TogglePhase::Confirmed);
                ToggleOutcome::Confirmed(confirmed)
            }
            Err(error) => {
                warn!(
                    target: "Optimistic",
                    "{kind} {} failed, rolling back: {error}",
                    current.entity_id
                );
                self.publish(kind, &current, TogglePhase::RolledBack);
                self.event_bus.dispatch(&Event::Notice(
                    error.notice(NoticeKind::ToggleFailed(kind), format!("{kind} failed")),
                ));
                ToggleOutcome::RolledBack {
                    state: current,
                    error,
                }
            }
        }
    }
}
