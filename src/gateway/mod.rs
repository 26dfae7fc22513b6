//! Transport to the social graph and to the dashboard.
//!
//! Gateways only attach credentials and turn non-2xx responses into an
//! [`UpstreamError`] carrying the parsed body. Everything else lives in the
//! importer.

use async_trait::async_trait;
use log::debug;
use reqwest::Method;
use serde_json::Value;

mod dashboard;
mod graph;

pub use dashboard::DashboardClient;
pub use graph::GraphClient;

/// A rejected upstream call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("upstream request failed ({}): {}", status_label(.status), .body)]
pub struct UpstreamError {
    /// HTTP status, absent when the request never got a response.
    pub status: Option<u16>,
    /// Error body: JSON when parseable, otherwise the raw text.
    pub body: Value,
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "no response".to_string(), |s| s.to_string())
}

impl UpstreamError {
    pub fn new(status: Option<u16>, body: Value) -> Self {
        Self { status, body }
    }

    pub fn transport(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            body: Value::String(err.to_string()),
        }
    }

    /// A 2xx body that did not have the expected shape.
    pub fn malformed(err: serde_json::Error) -> Self {
        Self {
            status: None,
            body: Value::String(format!("unexpected response body: {err}")),
        }
    }

    /// Best human-readable text in the body.
    ///
    /// Understands `{"error": "..."}`, the graph's
    /// `{"error": {"message": "..."}}` and `{"message": "..."}`, and falls
    /// back to the raw body.
    pub fn message(&self) -> String {
        let text = match &self.body {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => match map.get("error") {
                Some(Value::String(s)) => Some(s.as_str()),
                Some(Value::Object(inner)) => inner.get("message").and_then(Value::as_str),
                _ => map.get("message").and_then(Value::as_str),
            },
            _ => None,
        };
        text.map(str::to_string)
            .unwrap_or_else(|| self.body.to_string())
    }
}

/// Read access to the social graph.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// `path` is either relative to the versioned graph root or an absolute
    /// paging URL handed back by a previous response.
    async fn get(&self, path: &str) -> Result<Value, UpstreamError>;
}

/// A single dashboard API call.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    pub method: Method,
    /// Path below `/api`, e.g. `/events/fb`.
    pub path: String,
    pub body: Option<Value>,
    pub csrf_token: Option<String>,
}

impl DashboardRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            csrf_token: None,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn csrf_token(mut self, token: Option<String>) -> Self {
        self.csrf_token = token;
        self
    }
}

#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn send(&self, request: DashboardRequest) -> Result<Value, UpstreamError>;
}

/// Reads a response body as JSON, rejecting non-2xx statuses.
///
/// Empty bodies read as `null`; bodies that are not JSON are kept as strings.
pub(crate) async fn read_response(
    response: reqwest::Response,
) -> Result<Value, UpstreamError> {
    let status = response.status();
    let text = response.text().await.map_err(UpstreamError::transport)?;

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    if status.is_success() {
        Ok(body)
    } else {
        debug!("Upstream responded {} with {}", status, body);
        Err(UpstreamError::new(Some(status.as_u16()), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_from_error_string() {
        let err = UpstreamError::new(Some(422), json!({ "error": "Event already imported" }));
        assert_eq!(err.message(), "Event already imported");
    }

    #[test]
    fn test_message_from_graph_error_object() {
        let err = UpstreamError::new(
            Some(400),
            json!({ "error": { "message": "Invalid OAuth access token.", "code": 190 } }),
        );
        assert_eq!(err.message(), "Invalid OAuth access token.");
    }

    #[test]
    fn test_message_falls_back_to_raw_body() {
        let err = UpstreamError::new(Some(500), json!({ "exception": "boom" }));
        assert_eq!(err.message(), r#"{"exception":"boom"}"#);

        let err = UpstreamError::new(Some(502), Value::String("Bad Gateway".to_string()));
        assert_eq!(err.message(), "Bad Gateway");
    }

    #[test]
    fn test_display_includes_status() {
        let err = UpstreamError::new(None, Value::String("connection refused".to_string()));
        assert_eq!(
            err.to_string(),
            r#"upstream request failed (no response): "connection refused""#
        );
    }
}
