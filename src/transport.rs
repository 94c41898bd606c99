pub use feedcore::net::{Transport, TransportEvent, TransportFactory};
pub use feedsync_tokio_transport::TokioWebSocketTransportFactory;
