//! Boolean-plus-count state owned by a single entity (a post's like, a
//! post's save, a relationship's follow flag).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of toggle a state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleKind {
    Like,
    Save,
    /// Follow, unfollow, follow-request send and cancel all share this kind so
    /// that at most one relationship change per account is in flight.
    Follow,
}

impl ToggleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleKind::Like => "like",
            ToggleKind::Save => "save",
            ToggleKind::Follow => "follow",
        }
    }
}

impl fmt::Display for ToggleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleableState {
    pub entity_id: String,
    pub flag: bool,
    pub count: u64,
}

impl ToggleableState {
    pub fn new(entity_id: impl Into<String>, flag: bool, count: u64) -> Self {
        Self {
            entity_id: entity_id.into(),
            flag,
            count,
        }
    }

    /// The safe default used when the server reply cannot be interpreted.
    pub fn cleared(entity_id: impl Into<String>) -> Self {
        Self::new(entity_id, false, 0)
    }

    /// The state the UI shows before the server confirms: the flag flips and
    /// the count moves with it. Turning off at zero stays at zero.
    pub fn optimistic_next(&self) -> Self {
        let flag = !self.flag;
        let count = if flag {
            self.count.saturating_add(1)
        } else {
            self.count.saturating_sub(1)
        };
        Self {
            entity_id: self.entity_id.clone(),
            flag,
            count,
        }
    }
}

/// Identifies the single in-flight mutation allowed for one toggleable state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MutationKey {
    pub kind: ToggleKind,
    pub entity_id: String,
}

impl MutationKey {
    pub fn new(kind: ToggleKind, entity_id: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
        }
    }
}

impl fmt::Display for MutationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.entity_id)
    }
}
