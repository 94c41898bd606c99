//! Follow graph mutations.
//!
//! The endpoint depends on the target's privacy: private accounts get a
//! follow request instead of a follow. That branch is decided from a freshly
//! fetched [`FollowStatus`] before the optimistic toggle starts, and every
//! variant shares the `Follow` lock of the target account.

use crate::client::Client;
use crate::error::ApiError;
use crate::optimistic::ToggleOutcome;
use feedcore::api::{FollowStatusSpec, ToggleMembershipSpec};
use feedcore::types::follow::{FollowAction, FollowStatus};
use feedcore::types::toggle::{ToggleKind, ToggleableState};
use log::debug;

/// Feature handle for follow operations.
pub struct Follows<'a> {
    client: &'a Client,
}

impl<'a> Follows<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Fetch the viewer's relationship with `target_id`.
    pub async fn status(&self, target_id: &str) -> Result<FollowStatus, ApiError> {
        let viewer_id = self.client.current_user_id().await?;
        self.client
            .execute(FollowStatusSpec::new(target_id, &viewer_id))
            .await
    }

    /// Toggle the relationship with the account in `current.entity_id`.
    ///
    /// For follow/unfollow the state is "following" plus the follower count;
    /// for request send/cancel it is "requested" plus the pending request
    /// count, as reported by the server's `requests` list.
    pub async fn toggle(&self, status: &FollowStatus, current: ToggleableState) -> ToggleOutcome {
        let action = FollowAction::decide(status);
        let target_id = current.entity_id.clone();
        debug!(target: "Follows", "{action:?} on {target_id}");
        self.client
            .mutations()
            .toggle(ToggleKind::Follow, current, || async {
                let user_id = self.client.current_user_id().await?;
                self.client
                    .execute(ToggleMembershipSpec::follow(action, &target_id, &user_id))
                    .await
            })
            .await
    }
}

impl Client {
    /// Access follow operations.
    pub fn follows(&self) -> Follows<'_> {
        Follows::new(self)
    }
}
