use serde::{Deserialize, Serialize};

/// Relationship between the viewer and a target account, fetched before a
/// follow toggle so the right endpoint can be picked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatus {
    pub is_private: bool,
    #[serde(default)]
    pub is_following: bool,
    #[serde(default)]
    pub is_requested: bool,
    #[serde(default)]
    pub followers_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowAction {
    Follow,
    Unfollow,
    SendRequest,
    CancelRequest,
}

impl FollowAction {
    pub fn decide(status: &FollowStatus) -> Self {
        if status.is_following {
            FollowAction::Unfollow
        } else if status.is_private && status.is_requested {
            FollowAction::CancelRequest
        } else if status.is_private {
            FollowAction::SendRequest
        } else {
            FollowAction::Follow
        }
    }

    /// Whether the toggled flag tracks a pending request rather than an
    /// established follow.
    pub fn is_request(&self) -> bool {
        matches!(self, FollowAction::SendRequest | FollowAction::CancelRequest)
    }
}
