//! Membership-toggling endpoints (like, save, follow and follow requests).
//!
//! All of them take `{ "entityId": ..., "userId": ... }` and answer with the full membership
//! list, from which the authoritative state is derived.

use crate::api::spec::{ApiRequest, ApiSpec, path_segment};
use crate::types::follow::FollowAction;
use crate::types::membership::MembershipList;
use crate::types::toggle::ToggleableState;
use log::warn;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleMembershipSpec {
    pub entity_id: String,
    pub user_id: String,
    path: String,
    list_field: &'static str,
}

impl ToggleMembershipSpec {
    fn new(
        entity_id: &str,
        user_id: &str,
        path: String,
        list_field: &'static str,
    ) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            user_id: user_id.to_string(),
            path,
            list_field,
        }
    }

    pub fn like(post_id: &str, user_id: &str) -> Self {
        let path = format!("/posts/{}/like", path_segment(post_id));
        Self::new(post_id, user_id, path, "likes")
    }

    pub fn save(post_id: &str, user_id: &str) -> Self {
        let path = format!("/posts/{}/save", path_segment(post_id));
        Self::new(post_id, user_id, path, "saved")
    }

    pub fn follow(action: FollowAction, target_id: &str, user_id: &str) -> Self {
        let (suffix, field) = match action {
            FollowAction::Follow => ("follow", "followers"),
            FollowAction::Unfollow => ("unfollow", "followers"),
            FollowAction::SendRequest => ("follow-request", "requests"),
            FollowAction::CancelRequest => ("follow-request/cancel", "requests"),
        };
        let path = format!("/users/{}/{suffix}", path_segment(target_id));
        Self::new(target_id, user_id, path, field)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn list_field(&self) -> &'static str {
        self.list_field
    }
}

impl ApiSpec for ToggleMembershipSpec {
    type Response = ToggleableState;

    fn build_request(&self) -> ApiRequest {
        ApiRequest::post(self.path.clone()).json(json!({
            "entityId": self.entity_id,
            "userId": self.user_id,
        }))
    }

    /// Never fails: a reply without the membership list resolves to the
    /// cleared state instead of an error.
    fn parse_response(&self, body: &[u8]) -> Result<ToggleableState, anyhow::Error> {
        let list = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|value| MembershipList::from_field(&value, self.list_field));
        match list {
            Some(list) => Ok(list.to_state(&self.entity_id, &self.user_id)),
            None => {
                warn!(
                    target: "Api/Toggle",
                    "Response for {} has no '{}' list, treating as cleared",
                    self.path, self.list_field
                );
                Ok(ToggleableState::cleared(&self.entity_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::spec::Method;

    #[test]
    fn test_like_request_shape() {
        let spec = ToggleMembershipSpec::like("p1", "me");
        let request = spec.build_request();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path, "/posts/p1/like");
        assert_eq!(request.body, Some(json!({ "entityId": "p1", "userId": "me" })));
    }

    #[test]
    fn test_follow_actions_pick_endpoint_and_list() {
        let spec = ToggleMembershipSpec::follow(FollowAction::SendRequest, "u2", "me");
        assert_eq!(spec.path(), "/users/u2/follow-request");
        assert_eq!(spec.list_field(), "requests");

        let spec = ToggleMembershipSpec::follow(FollowAction::Unfollow, "u2", "me");
        assert_eq!(spec.path(), "/users/u2/unfollow");
        assert_eq!(spec.list_field(), "followers");
    }

    #[test]
    fn test_ids_are_escaped_in_path() {
        let spec = ToggleMembershipSpec::like("p/1?x=2", "me");
        assert_eq!(spec.path(), "/posts/p%2F1%3Fx%3D2/like");
        assert_eq!(spec.entity_id, "p/1?x=2");
        assert_eq!(
            spec.build_request().body,
            Some(json!({ "entityId": "p/1?x=2", "userId": "me" }))
        );

        let spec = ToggleMembershipSpec::follow(FollowAction::Follow, "u/2", "me");
        assert_eq!(spec.path(), "/users/u%2F2/follow");
    }

    #[test]
    fn test_parse_derives_state_from_server_list() {
        let spec = ToggleMembershipSpec::save("p1", "me");
        let state = spec
            .parse_response(br#"{"saved":["x","me"]}"#)
            .expect("parse never fails");
        assert_eq!(state, ToggleableState::new("p1", true, 2));
    }

    #[test]
    fn test_parse_malformed_is_cleared() {
        let spec = ToggleMembershipSpec::like("p1", "me");
        let bodies: [&[u8]; 3] = [b"not json", br#"{"message":"ok"}"#, br#"{"likes":null}"#];
        for body in bodies {
            let state = spec.parse_response(body).expect("parse never fails");
            assert_eq!(state, ToggleableState::cleared("p1"));
        }
    }
}
