//! Realtime channel: one long-lived socket per logged-in user delivering
//! out-of-band events such as unread counters.
//!
//! Frames are JSON objects `{"event": <name>, "data": <payload>}`. Handlers are
//! registered per event name; one handler per name, a later `on` replaces the
//! earlier one. Reconnection is left to the transport.

use crate::transport::{Transport, TransportEvent, TransportFactory};
use dashmap::DashMap;
use feedcore::types::events::{CoreEventBus, CounterUpdate, Event};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

pub type RealtimeHandler = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("realtime channel is already connected")]
    AlreadyConnected,
    #[error("realtime channel is not connected")]
    NotConnected,
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Value,
}

type TransportSlot = Arc<Mutex<Option<Arc<dyn Transport>>>>;

pub struct RealtimeChannel {
    url: String,
    transport_factory: Arc<dyn TransportFactory>,
    handlers: Arc<DashMap<String, RealtimeHandler>>,
    transport: TransportSlot,
    reader: Mutex<Option<JoinHandle<()>>>,
    connected: Arc<AtomicBool>,
    event_bus: CoreEventBus,
}

impl RealtimeChannel {
    pub fn new(
        url: impl Into<String>,
        transport_factory: Arc<dyn TransportFactory>,
        event_bus: CoreEventBus,
    ) -> Self {
        Self {
            url: url.into(),
            transport_factory,
            handlers: Arc::new(DashMap::new()),
            transport: Arc::new(Mutex::new(None)),
            reader: Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
            event_bus,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn url_for(&self, user_id: &str) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}userId={}", self.url, urlencoding::encode(user_id))
    }

    /// Opens the socket for `user_id` and announces the user with a `join` frame.
    pub async fn connect(&self, user_id: &str) -> Result<(), RealtimeError> {
        let mut slot = self.transport.lock().await;
        if slot.is_some() {
            return Err(RealtimeError::AlreadyConnected);
        }

        let url = self.url_for(user_id);
        info!(target: "Realtime", "Connecting to {url}");
        let (transport, events) = self.transport_factory.create_transport(&url).await?;

        let join = Frame {
            event: "join".to_string(),
            data: json!({ "userId": user_id }),
        };
        if let Err(e) = transport.send_text(&serde_json::to_string(&join)?).await {
            transport.disconnect().await;
            return Err(e.into());
        }

        *slot = Some(transport);
        drop(slot);
        self.connected.store(true, Ordering::Release);
        self.event_bus.dispatch(&Event::RealtimeConnected {
            user_id: user_id.to_string(),
        });

        let handle = tokio::spawn(read_loop(
            events,
            self.handlers.clone(),
            self.transport.clone(),
            self.connected.clone(),
            self.event_bus.clone(),
        ));
        if let Some(previous) = self.reader.lock().await.replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    /// Closes the socket. Calling it while disconnected does nothing.
    pub async fn disconnect(&self) {
        if let Some(reader) = self.reader.lock().await.take() {
            reader.abort();
        }
        let transport = self.transport.lock().await.take();
        if let Some(transport) = transport {
            transport.disconnect().await;
            self.connected.store(false, Ordering::Release);
            self.event_bus.dispatch(&Event::RealtimeDisconnected);
            info!(target: "Realtime", "Disconnected");
        }
    }

    /// Registers `handler` for frames named `event`, replacing any previous one.
    pub fn on<F>(&self, event: &str, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.handlers.insert(event.to_string(), Arc::new(handler));
    }

    pub fn off(&self, event: &str) {
        self.handlers.remove(event);
    }

    /// Sends a client frame on the open socket.
    pub async fn emit(&self, event: &str, data: Value) -> Result<(), RealtimeError> {
        let transport = self
            .transport
            .lock()
            .await
            .clone()
            .ok_or(RealtimeError::NotConnected)?;
        let frame = Frame {
            event: event.to_string(),
            data,
        };
        transport.send_text(&serde_json::to_string(&frame)?).await?;
        Ok(())
    }

    /// Tracks a server-pushed counter (for example unread messages).
    ///
    /// `data[field]` (or `data` itself when it is a bare number) of every
    /// `event` frame is published to the returned receiver and as
    /// `Event::CounterUpdated`.
    pub fn counter(&self, event: &str, field: &str) -> watch::Receiver<u64> {
        let (tx, rx) = watch::channel(0u64);
        let counter = event.to_string();
        let field = field.to_string();
        let event_bus = self.event_bus.clone();
        self.on(event, move |data| {
            let value = data
                .get(&field)
                .and_then(Value::as_u64)
                .or_else(|| data.as_u64());
            match value {
                Some(value) => {
                    tx.send_replace(value);
                    event_bus.dispatch(&Event::CounterUpdated(CounterUpdate {
                        counter: counter.clone(),
                        value,
                    }));
                }
                None => {
                    warn!(target: "Realtime", "'{counter}' frame without a numeric '{field}': {data}");
                }
            }
        });
        rx
    }
}

fn dispatch_frame(handlers: &DashMap<String, RealtimeHandler>, raw: &[u8]) {
    let frame: Frame = match serde_json::from_slice(raw) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(target: "Realtime", "Dropping undecodable frame: {e}");
            return;
        }
    };
    // Cloned out so a handler may call `on`/`off` without deadlocking the map.
    let handler = handlers.get(&frame.event).map(|h| h.value().clone());
    match handler {
        Some(handler) => handler(&frame.data),
        None => debug!(target: "Realtime", "No handler for '{}'", frame.event),
    }
}

async fn read_loop(
    mut events: mpsc::Receiver<TransportEvent>,
    handlers: Arc<DashMap<String, RealtimeHandler>>,
    transport: TransportSlot,
    connected: Arc<AtomicBool>,
    event_bus: CoreEventBus,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Connected => debug!(target: "Realtime", "Transport connected"),
            TransportEvent::DataReceived(data) => dispatch_frame(&handlers, &data),
            TransportEvent::Disconnected => break,
        }
    }
    info!(target: "Realtime", "Connection closed by transport");
    transport.lock().await.take();
    connected.store(false, Ordering::Release);
    event_bus.dispatch(&Event::RealtimeDisconnected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransportFactory;
    use std::time::Duration;
    use tokio::sync::mpsc::unbounded_channel;
    use tokio::time::timeout;

    fn channel() -> (Arc<MockTransportFactory>, RealtimeChannel) {
        let factory = Arc::new(MockTransportFactory::new());
        let realtime = RealtimeChannel::new(
            "ws://backend.test/socket",
            factory.clone(),
            CoreEventBus::new(),
        );
        (factory, realtime)
    }

    #[tokio::test]
    async fn test_connect_joins_with_user_id() {
        let (factory, realtime) = channel();
        realtime.connect("me").await.expect("connect");

        assert!(realtime.is_connected());
        assert_eq!(factory.urls(), vec!["ws://backend.test/socket?userId=me"]);
        assert_eq!(
            factory.sent_frames(),
            vec![r#"{"event":"join","data":{"userId":"me"}}"#]
        );
        assert!(matches!(
            realtime.connect("me").await,
            Err(RealtimeError::AlreadyConnected)
        ));
    }

    #[tokio::test]
    async fn test_handlers_receive_payloads_until_removed() {
        let (factory, realtime) = channel();
        let (tx, mut rx) = unbounded_channel();
        let typing_tx = tx.clone();
        realtime.on("typing", move |data| {
            let _ = typing_tx.send(format!("typing:{data}"));
        });
        realtime.on("message", move |data| {
            let _ = tx.send(format!("message:{}", data["text"].as_str().unwrap_or("")));
        });
        realtime.connect("me").await.expect("connect");

        factory.inject_json(r#"{"event":"typing","data":true}"#).await;
        let got = timeout(Duration::from_secs(1), rx.recv()).await.expect("in time");
        assert_eq!(got.as_deref(), Some("typing:true"));

        realtime.off("typing");
        factory.inject_json(r#"{"event":"typing","data":true}"#).await;
        factory.inject_json("garbage").await;
        factory
            .inject_json(r#"{"event":"message","data":{"text":"hi"}}"#)
            .await;
        // Frames are handled in order, so the next delivery is the message.
        let got = timeout(Duration::from_secs(1), rx.recv()).await.expect("in time");
        assert_eq!(got.as_deref(), Some("message:hi"));
    }

    #[tokio::test]
    async fn test_counter_tracks_unread_count() {
        let (factory, realtime) = channel();
        let mut unread = realtime.counter("unreadCount", "count");
        realtime.connect("me").await.expect("connect");

        factory
            .inject_json(r#"{"event":"unreadCount","data":{"count":4}}"#)
            .await;
        timeout(Duration::from_secs(1), unread.changed())
            .await
            .expect("in time")
            .expect("sender alive");
        assert_eq!(*unread.borrow(), 4);

        factory.inject_json(r#"{"event":"unreadCount","data":7}"#).await;
        timeout(Duration::from_secs(1), unread.changed())
            .await
            .expect("in time")
            .expect("sender alive");
        assert_eq!(*unread.borrow_and_update(), 7);
    }

    #[tokio::test]
    async fn test_remote_close_allows_reconnect() {
        let factory = Arc::new(MockTransportFactory::new());
        let bus = CoreEventBus::new();
        let (tx, mut rx) = unbounded_channel();
        bus.add_handler(Arc::new(move |event: &Event| {
            if matches!(event, Event::RealtimeDisconnected) {
                let _ = tx.send(());
            }
        }));
        let realtime = RealtimeChannel::new("ws://backend.test/socket", factory.clone(), bus);
        realtime.connect("me").await.expect("connect");

        factory.inject(TransportEvent::Disconnected).await;
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("in time");
        assert!(!realtime.is_connected());

        realtime.connect("me").await.expect("reconnect");
        assert!(realtime.is_connected());
        realtime.disconnect().await;
        realtime.disconnect().await;
        assert!(!realtime.is_connected());
        assert!(matches!(
            realtime.emit("typing", json!(true)).await,
            Err(RealtimeError::NotConnected)
        ));
    }
}
