//! Wire shapes of the collections the client pages through.

use super::membership::MembershipList;
use super::toggle::ToggleableState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Items that carry the timestamp screens sort by.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Stable newest-first ordering, applied by callers before a window reset.
pub fn sort_newest_first<T: Timestamped>(items: &mut [T]) {
    items.sort_by_key(|item| std::cmp::Reverse(item.timestamp()));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub saved: Vec<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn like_state(&self, user_id: &str) -> ToggleableState {
        MembershipList::new(self.likes.clone()).to_state(&self.id, user_id)
    }

    pub fn save_state(&self, user_id: &str) -> ToggleableState {
        MembershipList::new(self.saved.clone()).to_state(&self.id, user_id)
    }
}

impl Timestamped for Post {
    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub unread_count: u64,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Timestamped for Conversation {
    fn timestamp(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub from_user: Option<String>,
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Timestamped for Notification {
    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}
