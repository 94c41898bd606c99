// Re-export the shared core so downstream crates need a single dependency
pub use feedcore::{api, net, types, window};

pub mod client;
pub mod config;
pub mod error;
pub mod features;
pub mod http;
pub mod optimistic;
pub mod paginator;
pub mod realtime;
pub mod session;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use client::Client;
pub use config::ClientConfig;
pub use error::ApiError;
pub use paginator::{LoadOutcome, Paginator};
pub use realtime::RealtimeChannel;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
