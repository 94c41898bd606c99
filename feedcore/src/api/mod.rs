//! Endpoint contracts: each spec builds its request and parses its reply, so
//! the runtime crate only has to move bytes.

pub mod follow;
pub mod list;
pub mod spec;
pub mod toggle;

pub use follow::FollowStatusSpec;
pub use list::{CollectionSpec, Page, PageRequest, PagedListSpec};
pub use spec::{ApiRequest, ApiSpec, Method};
pub use toggle::ToggleMembershipSpec;
