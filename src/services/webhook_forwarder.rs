//! Forwards raw gateway webhook events to an external serverless handler.
//!
//! The inbound HTTP request is captured into a transport-neutral envelope,
//! POSTed to the configured endpoint, and the handler's response envelope is
//! replayed to the gateway verbatim. One client instance, one fixed timeout,
//! no internal retry: the gateway's own redelivery protocol governs retries.

use crate::error::{AppError, AppErrorKind, ExternalError};
use axum::http::{HeaderMap, Method, Uri};
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::form_urlencoded;

#[derive(Debug, Error)]
pub enum ForwarderError {
    #[error("upstream request failed: {message}")]
    Unreachable { message: String },

    #[error("upstream request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("malformed upstream envelope: {message}")]
    MalformedEnvelope { message: String },
}

impl From<ForwarderError> for AppError {
    fn from(err: ForwarderError) -> Self {
        let kind = match err {
            ForwarderError::Unreachable { message } => {
                AppErrorKind::External(ExternalError::UpstreamUnreachable { message })
            }
            ForwarderError::Timeout { timeout_secs } => {
                AppErrorKind::External(ExternalError::UpstreamTimeout { timeout_secs })
            }
            ForwarderError::MalformedEnvelope { message } => {
                AppErrorKind::External(ExternalError::MalformedUpstreamResponse { message })
            }
        };
        AppError::new(kind)
    }
}

/// Transport-neutral capture of one inbound HTTP request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardedEvent {
    #[serde(rename = "httpMethod")]
    pub http_method: String,
    pub path: String,
    #[serde(rename = "queryStringParameters")]
    pub query_string_parameters: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: String,
    #[serde(rename = "isBase64Encoded")]
    pub is_base64_encoded: bool,
}

impl ForwardedEvent {
    /// Capture method, path, query, headers and raw body. A body that is not
    /// valid UTF-8 travels base64-encoded.
    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap, body: &[u8]) -> Self {
        let query_string_parameters = uri
            .query()
            .map(|query| {
                form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let (body, is_base64_encoded) = match std::str::from_utf8(body) {
            Ok(text) => (text.to_string(), false),
            Err(_) => (
                base64::engine::general_purpose::STANDARD.encode(body),
                true,
            ),
        };

        Self {
            http_method: method.to_string(),
            path: uri.path().to_string(),
            query_string_parameters,
            headers,
            body,
            is_base64_encoded,
        }
    }
}

/// Response envelope the external handler answers with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardedResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

pub struct WebhookForwarder {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl WebhookForwarder {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, ForwarderError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ForwarderError::Unreachable {
                message: format!("failed to initialize HTTP client: {}", e),
            }
        })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the event envelope and decode the handler's response envelope.
    pub async fn forward(&self, event: &ForwardedEvent) -> Result<ForwardedResponse, ForwarderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("User-Agent", "storefront-webhook-proxy/1.0")
            .json(event)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ForwarderError::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    warn!(endpoint = %self.endpoint, error = %e, "Webhook forwarding failed");
                    ForwarderError::Unreachable {
                        message: e.to_string(),
                    }
                }
            })?;

        let text = response
            .text()
            .await
            .map_err(|e| ForwarderError::Unreachable {
                message: format!("failed to read upstream response: {}", e),
            })?;

        serde_json::from_str::<ForwardedResponse>(&text).map_err(|e| {
            ForwarderError::MalformedEnvelope {
                message: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn event_envelope_uses_documented_field_names() {
        let event = ForwardedEvent {
            http_method: "POST".to_string(),
            path: "/api/webhooks/vnpay".to_string(),
            query_string_parameters: HashMap::from([(
                "vnp_TxnRef".to_string(),
                "ORDER_42_1000".to_string(),
            )]),
            headers: HashMap::new(),
            body: "{}".to_string(),
            is_base64_encoded: false,
        };

        let json = serde_json::to_value(&event).expect("serialization should succeed");
        assert_eq!(json["httpMethod"], "POST");
        assert_eq!(
            json["queryStringParameters"]["vnp_TxnRef"],
            "ORDER_42_1000"
        );
        assert_eq!(json["isBase64Encoded"], false);
        assert!(json.get("http_method").is_none());
    }

    #[test]
    fn response_envelope_tolerates_missing_headers_and_body() {
        let parsed: ForwardedResponse =
            serde_json::from_str(r#"{"statusCode":200}"#).expect("parse should succeed");
        assert_eq!(parsed.status_code, 200);
        assert!(parsed.headers.is_empty());
        assert!(parsed.body.is_empty());
    }

    #[test]
    fn from_parts_captures_query_and_headers() {
        let uri: Uri = "/api/webhooks/vnpay?vnp_TxnRef=ORDER_42_1000&vnp_ResponseCode=00"
            .parse()
            .expect("valid URI");
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let event = ForwardedEvent::from_parts(&Method::GET, &uri, &headers, b"");

        assert_eq!(event.http_method, "GET");
        assert_eq!(event.path, "/api/webhooks/vnpay");
        assert_eq!(
            event.query_string_parameters.get("vnp_ResponseCode"),
            Some(&"00".to_string())
        );
        assert_eq!(
            event.headers.get("content-type"),
            Some(&"application/json".to_string())
        );
        assert!(!event.is_base64_encoded);
    }

    #[test]
    fn non_utf8_body_is_base64_encoded() {
        let uri: Uri = "/api/webhooks/vnpay".parse().expect("valid URI");
        let event =
            ForwardedEvent::from_parts(&Method::POST, &uri, &HeaderMap::new(), &[0xff, 0xfe]);

        assert!(event.is_base64_encoded);
        assert_eq!(
            base64::engine::general_purpose::STANDARD
                .decode(&event.body)
                .expect("body should be valid base64"),
            vec![0xff, 0xfe]
        );
    }
}
