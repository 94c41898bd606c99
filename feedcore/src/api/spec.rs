use serde_json::Value;
use std::borrow::Cow;

/// Percent-encodes an id for use as one path segment, so `/` or `?` inside
/// an id cannot change the route.
pub fn path_segment(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// A backend call described relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A reusable endpoint description that pairs a request builder with a
/// response parser.
///
/// This keeps wire-level logic in `feedcore`, while runtime orchestration
/// (auth headers, timeouts, status mapping) stays in the main crate.
pub trait ApiSpec {
    /// The output type produced by parsing the response body.
    type Response;

    fn build_request(&self) -> ApiRequest;

    /// Parse a successful (2xx) response body into the typed response.
    fn parse_response(&self, body: &[u8]) -> Result<Self::Response, anyhow::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment_escapes_route_characters() {
        assert_eq!(path_segment("65f0c2a1"), "65f0c2a1");
        assert_eq!(path_segment("a/b?c#d"), "a%2Fb%3Fc%23d");
        assert_eq!(path_segment("with space"), "with%20space");
    }
}
