use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpClient, HttpRequest};
use crate::optimistic::MutationController;
use crate::realtime::RealtimeChannel;
use crate::session::{Session, SessionStore};
use crate::transport::TransportFactory;
use feedcore::api::{ApiRequest, ApiSpec, Method};
use feedcore::types::events::{CoreEventBus, EventHandler};
use log::{debug, warn};
use std::sync::Arc;
use tokio::time::timeout;

/// Longest slice of an error body quoted in `ApiError::Status`.
const MAX_ERROR_BODY: usize = 200;

/// Entry point of the client core: authenticated HTTP plus the shared event
/// bus and mutation controller every feature handle goes through.
pub struct Client {
    pub(crate) config: ClientConfig,
    /// HTTP client used for every backend call
    pub http_client: Arc<dyn HttpClient>,
    pub(crate) session_store: Arc<dyn SessionStore>,
    pub(crate) event_bus: CoreEventBus,
    pub(crate) mutations: MutationController,
}

impl Client {
    pub fn new(
        config: ClientConfig,
        http_client: Arc<dyn HttpClient>,
        session_store: Arc<dyn SessionStore>,
    ) -> Arc<Self> {
        let event_bus = CoreEventBus::new();
        let mutations = MutationController::new(event_bus.clone());
        Arc::new(Self {
            config,
            http_client,
            session_store,
            event_bus,
            mutations,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &CoreEventBus {
        &self.event_bus
    }

    pub fn add_event_handler(&self, handler: Arc<dyn EventHandler>) {
        self.event_bus.add_handler(handler);
    }

    pub fn mutations(&self) -> &MutationController {
        &self.mutations
    }

    /// Builds a realtime channel on the configured socket URL that publishes
    /// to this client's event bus. Nothing is dialed until `connect`.
    pub fn realtime(&self, transport_factory: Arc<dyn TransportFactory>) -> RealtimeChannel {
        RealtimeChannel::new(
            self.config.realtime_url.clone(),
            transport_factory,
            self.event_bus.clone(),
        )
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.session_store
    }

    /// Reads the persisted session. An unreadable store counts as logged out.
    pub async fn session(&self) -> Option<Session> {
        match self.session_store.load().await {
            Ok(session) => session,
            Err(e) => {
                warn!(target: "Client", "Failed to read session store: {e}");
                None
            }
        }
    }

    pub async fn current_user_id(&self) -> Result<String, ApiError> {
        self.session()
            .await
            .map(|s| s.user_id)
            .ok_or(ApiError::Unauthorized)
    }

    pub(crate) fn build_url(&self, request: &ApiRequest) -> String {
        let mut url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            request.path
        );
        for (i, (key, value)) in request.query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn to_http_request(&self, request: &ApiRequest) -> Result<HttpRequest, ApiError> {
        let url = self.build_url(request);
        let mut http = match request.method {
            Method::Get => HttpRequest::get(url),
            Method::Post => HttpRequest::post(url),
            Method::Delete => HttpRequest::delete(url),
        }
        .with_header("accept", "application/json")
        .with_header("user-agent", self.config.user_agent.clone());

        match self.session().await {
            Some(session) => {
                http = http.with_header("authorization", format!("Bearer {}", session.token));
            }
            None => {
                debug!(target: "Client/Http", "No session stored, sending {} unauthenticated", request.path);
            }
        }

        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Transport(e.into()))?;
            http = http
                .with_header("content-type", "application/json")
                .with_body(bytes);
        }
        Ok(http)
    }

    /// Executes an endpoint spec: attaches the bearer token, applies the
    /// configured timeout, maps the status code and parses the body.
    pub async fn execute<S>(&self, spec: S) -> Result<S::Response, ApiError>
    where
        S: ApiSpec + Send,
    {
        let request = spec.build_request();
        let http_request = self.to_http_request(&request).await?;
        debug!(target: "Client/Http", "--> {} {}", http_request.method, http_request.url);

        let response = timeout(
            self.config.request_timeout,
            self.http_client.execute(http_request),
        )
        .await
        .map_err(|_| ApiError::Timeout(self.config.request_timeout))??;

        debug!(
            target: "Client/Http",
            "<-- {} {} ({} bytes)",
            response.status_code,
            request.path,
            response.body.len()
        );

        if response.status_code == 401 {
            return Err(ApiError::Unauthorized);
        }
        if !response.is_success() {
            return Err(ApiError::Status {
                status: response.status_code,
                message: error_message(&response.body),
            });
        }

        spec.parse_response(&response.body)
            .map_err(ApiError::Malformed)
    }
}

/// Prefers the backend's `{"message": ...}` field, falling back to raw text.
fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            String::from_utf8_lossy(body)
                .chars()
                .take(MAX_ERROR_BODY)
                .collect()
        })
}
