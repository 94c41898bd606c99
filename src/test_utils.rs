use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::Client;
use crate::config::ClientConfig;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::session::{MemorySessionStore, Session, SessionStore};
use tokio::sync::Semaphore;

#[derive(Default)]
struct MockState {
    responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

/// Scripted HTTP client: answers requests in push order and records them.
#[derive(Clone, Default)]
pub struct MockHttpClient {
    state: Arc<MockState>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request waits for one permit on `gate` before being answered.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn push_json(&self, status_code: u16, body: &str) {
        self.state.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status_code,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub fn push_failure(&self, message: &str) {
        self.state
            .responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, anyhow::Error> {
        self.state.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.state.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("no scripted response left")),
        }
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::default()
        .with_base_url("http://backend.test/api/")
        .with_request_timeout(Duration::from_secs(5))
}

pub fn create_test_client(http: MockHttpClient) -> Arc<Client> {
    create_test_client_with(
        http,
        Arc::new(MemorySessionStore::with_session(Session::new(
            "test-token",
            "me",
        ))),
        Duration::from_secs(5),
    )
}

pub fn create_test_client_with(
    http: MockHttpClient,
    session_store: Arc<dyn SessionStore>,
    request_timeout: Duration,
) -> Arc<Client> {
    let _ = env_logger::builder().is_test(true).try_init();
    Client::new(
        test_config().with_request_timeout(request_timeout),
        Arc::new(http),
        session_store,
    )
}

/// Collects every dispatched event for later assertions.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<feedcore::types::events::Event>>>,
}

impl EventRecorder {
    pub fn attach(client: &Client) -> Self {
        let recorder = Self::default();
        client.add_event_handler(Arc::new(recorder.clone()));
        recorder
    }

    pub fn events(&self) -> Vec<feedcore::types::events::Event> {
        self.events.lock().unwrap().clone()
    }
}

impl feedcore::types::events::EventHandler for EventRecorder {
    fn handle_event(&self, event: &feedcore::types::events::Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}
