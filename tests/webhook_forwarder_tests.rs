use axum::{routing::post, Json, Router};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use storefront_backend::services::webhook_forwarder::{
    ForwardedEvent, ForwarderError, WebhookForwarder,
};

fn sample_event() -> ForwardedEvent {
    ForwardedEvent {
        http_method: "POST".to_string(),
        path: "/api/webhooks/vnpay".to_string(),
        query_string_parameters: HashMap::from([
            ("vnp_TxnRef".to_string(), "ORDER_42_1000".to_string()),
            ("vnp_ResponseCode".to_string(), "00".to_string()),
        ]),
        headers: HashMap::new(),
        body: String::new(),
        is_base64_encoded: false,
    }
}

async fn spawn_handler(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("local addr should resolve");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server should run");
    });
    addr
}

#[tokio::test]
async fn forwarded_event_is_replayed_from_the_handler_envelope() {
    let app = Router::new().route(
        "/ipn",
        post(|Json(event): Json<ForwardedEvent>| async move {
            assert_eq!(event.http_method, "POST");
            assert_eq!(
                event.query_string_parameters.get("vnp_TxnRef"),
                Some(&"ORDER_42_1000".to_string())
            );
            Json(serde_json::json!({
                "statusCode": 200,
                "headers": {"x-handled-by": "ipn-handler"},
                "body": "{\"RspCode\":\"00\",\"Message\":\"Success\"}",
            }))
        }),
    );
    let addr = spawn_handler(app).await;

    let forwarder = WebhookForwarder::new(
        format!("http://{}/ipn", addr),
        Duration::from_secs(5),
    )
    .expect("forwarder should build");

    let response = forwarder
        .forward(&sample_event())
        .await
        .expect("forwarding should succeed");

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.headers.get("x-handled-by"),
        Some(&"ipn-handler".to_string())
    );
    assert!(response.body.contains("\"RspCode\":\"00\""));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_distinct_upstream_failure() {
    // Nothing listens on this port.
    let forwarder = WebhookForwarder::new(
        "http://127.0.0.1:9/ipn".to_string(),
        Duration::from_secs(2),
    )
    .expect("forwarder should build");

    let err = forwarder
        .forward(&sample_event())
        .await
        .expect_err("forwarding should fail");

    assert!(matches!(
        err,
        ForwarderError::Unreachable { .. } | ForwarderError::Timeout { .. }
    ));

    let app_err: storefront_backend::error::AppError = err.into();
    assert!(app_err.status_code() == 502 || app_err.status_code() == 504);
}

#[tokio::test]
async fn non_envelope_response_is_a_malformed_envelope_error() {
    let app = Router::new().route("/ipn", post(|| async { "plain text, not an envelope" }));
    let addr = spawn_handler(app).await;

    let forwarder = WebhookForwarder::new(
        format!("http://{}/ipn", addr),
        Duration::from_secs(5),
    )
    .expect("forwarder should build");

    let err = forwarder
        .forward(&sample_event())
        .await
        .expect_err("forwarding should fail");

    assert!(matches!(err, ForwarderError::MalformedEnvelope { .. }));

    let app_err: storefront_backend::error::AppError = err.into();
    assert_eq!(app_err.status_code(), 502);
}

#[tokio::test]
async fn slow_handler_trips_the_bounded_timeout() {
    let app = Router::new().route(
        "/ipn",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(serde_json::json!({"statusCode": 200}))
        }),
    );
    let addr = spawn_handler(app).await;

    let forwarder = WebhookForwarder::new(
        format!("http://{}/ipn", addr),
        Duration::from_millis(300),
    )
    .expect("forwarder should build");

    let err = forwarder
        .forward(&sample_event())
        .await
        .expect_err("forwarding should time out");

    assert!(matches!(
        err,
        ForwarderError::Timeout { .. } | ForwarderError::Unreachable { .. }
    ));
}
