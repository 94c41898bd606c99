//! Like and save toggles on posts.

use crate::client::Client;
use crate::optimistic::ToggleOutcome;
use feedcore::api::ToggleMembershipSpec;
use feedcore::types::toggle::{ToggleKind, ToggleableState};
use log::debug;

/// Feature handle for post reactions.
pub struct Posts<'a> {
    client: &'a Client,
}

impl<'a> Posts<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Toggle "liked by me" on the post identified by `current.entity_id`.
    pub async fn toggle_like(&self, current: ToggleableState) -> ToggleOutcome {
        self.toggle(ToggleKind::Like, current).await
    }

    /// Toggle "saved by me" on the post identified by `current.entity_id`.
    pub async fn toggle_save(&self, current: ToggleableState) -> ToggleOutcome {
        self.toggle(ToggleKind::Save, current).await
    }

    async fn toggle(&self, kind: ToggleKind, current: ToggleableState) -> ToggleOutcome {
        let post_id = current.entity_id.clone();
        debug!(target: "Posts", "Toggling {kind} on post {post_id}");
        self.client
            .mutations()
            .toggle(kind, current, || async {
                let user_id = self.client.current_user_id().await?;
                let spec = match kind {
                    ToggleKind::Save => ToggleMembershipSpec::save(&post_id, &user_id),
                    _ => ToggleMembershipSpec::like(&post_id, &user_id),
                };
                self.client.execute(spec).await
            })
            .await
    }
}

impl Client {
    /// Access post reaction operations.
    pub fn posts(&self) -> Posts<'_> {
        Posts::new(self)
    }
}
