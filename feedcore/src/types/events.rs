use super::toggle::{ToggleKind, ToggleableState};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Where a published toggle state sits in its optimistic lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TogglePhase {
    /// Applied locally, server not yet answered.
    Optimistic,
    /// Replaced by the server's authoritative state.
    Confirmed,
    /// The remote call failed and the original state was restored.
    RolledBack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleUpdate {
    pub kind: ToggleKind,
    pub state: ToggleableState,
    pub phase: TogglePhase,
}

/// Coarse classification of a failure, enough for the UI to pick a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Timeout or connectivity loss; retrying later may succeed.
    Transient,
    /// Missing or rejected session; the UI should prompt a new login.
    Auth,
    /// The server answered with a shape the client could not interpret.
    Malformed,
    /// Any other non-success status from the backend.
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeKind {
    ToggleFailed(ToggleKind),
    PageFailed,
    SessionExpired,
}

/// A short, non-blocking message for the user (a toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub error: ErrorKind,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterUpdate {
    pub counter: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Event {
    ToggleUpdated(ToggleUpdate),
    Notice(Notice),
    CounterUpdated(CounterUpdate),
    RealtimeConnected { user_id: String },
    RealtimeDisconnected,
}

pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: &Event);
}

impl<F> EventHandler for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn handle_event(&self, event: &Event) {
        self(event)
    }
}

#[derive(Default, Clone)]
pub struct CoreEventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
}

impl fmt::Debug for CoreEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreEventBus")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl CoreEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&self, handler: Arc<dyn EventHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(handler);
    }

    /// Returns true if there are any event handlers registered.
    pub fn has_handlers(&self) -> bool {
        self.handler_count() > 0
    }

    fn handler_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn dispatch(&self, event: &Event) {
        // Snapshot so a handler may register another handler without deadlocking.
        let handlers: Vec<_> = self
            .handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for handler in handlers {
            handler.handle_event(event);
        }
    }
}
