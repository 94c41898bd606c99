pub mod events;
pub mod feed;
pub mod follow;
pub mod membership;
pub mod toggle;

pub use follow::{FollowAction, FollowStatus};
pub use membership::MembershipList;
pub use toggle::{MutationKey, ToggleKind, ToggleableState};
