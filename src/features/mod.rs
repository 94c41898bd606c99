mod collections;
mod follows;
mod posts;

pub use collections::{Collections, EndpointPageSource};

pub use follows::Follows;

pub use posts::Posts;
