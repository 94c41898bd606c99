use crate::api::spec::{ApiRequest, ApiSpec, path_segment};
use crate::types::follow::FollowStatus;
use anyhow::Context;

/// Fetches the viewer's relationship with `target_id`. Parsing is strict: the
/// follow endpoint choice depends on `isPrivate`, so guessing is not safe.
#[derive(Debug, Clone)]
pub struct FollowStatusSpec {
    pub target_id: String,
    pub viewer_id: String,
}

impl FollowStatusSpec {
    pub fn new(target_id: &str, viewer_id: &str) -> Self {
        Self {
            target_id: target_id.to_string(),
            viewer_id: viewer_id.to_string(),
        }
    }
}

impl ApiSpec for FollowStatusSpec {
    type Response = FollowStatus;

    fn build_request(&self) -> ApiRequest {
        ApiRequest::get(format!(
            "/users/{}/follow-status",
            path_segment(&self.target_id)
        ))
            .query("viewerId", &self.viewer_id)
    }

    fn parse_response(&self, body: &[u8]) -> Result<FollowStatus, anyhow::Error> {
        serde_json::from_slice(body)
            .with_context(|| format!("invalid follow status for {}", self.target_id))
    }
}
