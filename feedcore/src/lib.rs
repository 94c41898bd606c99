//! Runtime-agnostic building blocks shared by the `feedsync` client: state
//! types, paging arithmetic, endpoint specs and the network seams.

pub mod api;
pub mod net;
pub mod store;
pub mod types;
pub mod window;

pub use types::{ToggleKind, ToggleableState};
pub use window::{ListWindow, PagingMode};
