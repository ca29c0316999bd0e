use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::error::AppError;
use crate::middleware::error::{app_error_response, get_request_id_from_headers};
use crate::services::webhook_forwarder::{ForwardedEvent, ForwardedResponse, WebhookForwarder};

pub struct ProxyState {
    /// Present only when forwarding is enabled and a target is configured
    pub forwarder: Option<Arc<WebhookForwarder>>,
}

/// GET+POST /api/webhooks/vnpay
///
/// Answers locally when no forwarder is configured; otherwise relays the raw
/// event to the external handler and replays its response.
pub async fn handle_gateway_event(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    uri: Uri,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = get_request_id_from_headers(&headers);

    let Some(forwarder) = state.forwarder.as_deref() else {
        info!("Webhook processed locally");
        return (
            StatusCode::OK,
            Json(json!({
                "message": "Webhook processed locally",
                "note": "forwarding to the external handler is disabled",
            })),
        )
            .into_response();
    };

    let event = ForwardedEvent::from_parts(&method, &uri, &headers, &body);
    info!(endpoint = %forwarder.endpoint(), method = %event.http_method, "Forwarding webhook event");

    match forwarder.forward(&event).await {
        Ok(upstream) => replay_response(upstream, request_id),
        Err(err) => {
            let (status, payload) = app_error_response(AppError::from(err), request_id);
            (status, payload).into_response()
        }
    }
}

/// Replay the upstream envelope verbatim: status, headers, body.
fn replay_response(upstream: ForwardedResponse, request_id: Option<String>) -> Response {
    let status = match StatusCode::from_u16(upstream.status_code) {
        Ok(status) => status,
        Err(_) => {
            let err = AppError::new(crate::error::AppErrorKind::External(
                crate::error::ExternalError::MalformedUpstreamResponse {
                    message: format!("invalid status code {}", upstream.status_code),
                },
            ));
            let (status, payload) = app_error_response(err, request_id);
            return (status, payload).into_response();
        }
    };

    let mut response = (status, upstream.body).into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in &upstream.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn disabled_forwarding_acknowledges_locally() {
        let state = Arc::new(ProxyState { forwarder: None });
        let uri: Uri = "/api/webhooks/vnpay?vnp_TxnRef=ORDER_42_1000"
            .parse()
            .expect("valid URI");

        let response = handle_gateway_event(
            State(state),
            Method::POST,
            uri,
            axum::http::HeaderMap::new(),
            Bytes::new(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let payload: serde_json::Value =
            serde_json::from_slice(&body).expect("body should be JSON");
        assert_eq!(payload["message"], "Webhook processed locally");
    }

    #[test]
    fn replay_preserves_status_and_headers() {
        let upstream = ForwardedResponse {
            status_code: 201,
            headers: HashMap::from([("x-handler".to_string(), "ipn".to_string())]),
            body: r#"{"RspCode":"00"}"#.to_string(),
        };

        let response = replay_response(upstream, None);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get("x-handler").map(|v| v.as_bytes()),
            Some(&b"ipn"[..])
        );
        assert_eq!(
            response.headers().get(CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(&b"application/json"[..])
        );
    }

    #[test]
    fn invalid_upstream_status_is_a_bad_gateway() {
        let upstream = ForwardedResponse {
            status_code: 99,
            headers: HashMap::new(),
            body: String::new(),
        };

        let response = replay_response(upstream, None);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
