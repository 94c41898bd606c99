//! Authoritative membership lists returned by toggle endpoints.
//!
//! The server answers a like/save/follow mutation with the full list of
//! members (`likes`, `saved`, `followers`, `requests`). The flag is whether the
//! current user is in the list and the count is its length, so a client never
//! trusts its own optimistic guess once the server has spoken.

use super::toggle::ToggleableState;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipList {
    members: Vec<String>,
}

impl MembershipList {
    pub fn new(members: Vec<String>) -> Self {
        Self { members }
    }

    /// Reads `field` out of a JSON object. Members may be plain ids or objects
    /// carrying `_id`/`id` (populated documents). Returns `None` when the field
    /// is missing or not an array.
    pub fn from_field(value: &Value, field: &str) -> Option<Self> {
        let entries = value.get(field)?.as_array()?;
        let members = entries.iter().filter_map(member_id).collect();
        Some(Self { members })
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn to_state(&self, entity_id: impl Into<String>, user_id: &str) -> ToggleableState {
        ToggleableState::new(entity_id, self.contains(user_id), self.len() as u64)
    }
}

fn member_id(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj
            .get("_id")
            .or_else(|| obj.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_derived_from_list() {
        let body = json!({ "likes": ["u1", "u2", "me", "u4"] });
        let list = MembershipList::from_field(&body, "likes").expect("list present");
        let state = list.to_state("post-1", "me");
        assert!(state.flag);
        assert_eq!(state.count, 4);
        assert_eq!(state.entity_id, "post-1");
    }

    #[test]
    fn test_populated_members_are_read_by_id() {
        let body = json!({
            "followers": [{ "_id": "a", "username": "alice" }, { "id": "me" }, 42]
        });
        let list = MembershipList::from_field(&body, "followers").expect("list present");
        assert_eq!(list.len(), 2);
        assert!(list.contains("me"));
    }

    #[test]
    fn test_missing_or_wrong_shape_is_none() {
        assert!(MembershipList::from_field(&json!({}), "likes").is_none());
        assert!(MembershipList::from_field(&json!({ "likes": 3 }), "likes").is_none());
        assert!(MembershipList::from_field(&json!([1, 2]), "likes").is_none());
    }
}
