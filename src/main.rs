use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use storefront_backend::api;
use storefront_backend::config::AppConfig;
use storefront_backend::database;
use storefront_backend::database::partner_repository::PartnerRepository;
use storefront_backend::health::{HealthChecker, HealthStatus};
use storefront_backend::logging::init_tracing;
use storefront_backend::services::callback::CallbackService;
use storefront_backend::services::checkout::CheckoutService;
use storefront_backend::services::webhook_forwarder::WebhookForwarder;

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    config.validate()?;

    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "Starting storefront backend service"
    );

    info!("Initializing database connection pool...");
    let db_pool = database::init_pool_from_config(&config.database)
        .await
        .map_err(|e| {
            error!("Failed to initialize database pool: {}", e);
            anyhow::anyhow!(e)
        })?;

    let checkout = Arc::new(CheckoutService::new(
        db_pool.clone(),
        config.gateway.clone(),
    ));
    let callbacks = Arc::new(CallbackService::new(
        db_pool.clone(),
        config.gateway.clone(),
    ));

    let payment_state = Arc::new(api::payments::PaymentState {
        checkout,
        callbacks: callbacks.clone(),
    });
    let payment_routes = Router::new()
        .route(
            "/api/payments/vnpay/create",
            post(api::payments::create_gateway_payment),
        )
        .route(
            "/api/payments/vnpay/return",
            get(api::payments::gateway_return),
        )
        .route(
            "/api/webhooks/vnpay/direct",
            post(api::payments::gateway_ipn),
        )
        .with_state(payment_state);

    let partner_state = Arc::new(api::partner_webhooks::PartnerWebhookState {
        partners: PartnerRepository::new(db_pool.clone()),
        callbacks,
    });
    let partner_routes = Router::new()
        .route(
            "/api/webhooks/partner/payment",
            post(api::partner_webhooks::partner_payment_webhook),
        )
        .with_state(partner_state);

    let forwarder = match config.forwarding.endpoint() {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "Webhook forwarding enabled");
            let forwarder = WebhookForwarder::new(
                endpoint.to_string(),
                Duration::from_secs(config.forwarding.timeout_secs),
            )
            .map_err(|e| anyhow::anyhow!(e))?;
            Some(Arc::new(forwarder))
        }
        None => {
            info!("Webhook forwarding disabled, gateway events are acknowledged locally");
            None
        }
    };
    let proxy_state = Arc::new(api::webhook_proxy::ProxyState { forwarder });
    let proxy_routes = Router::new()
        .route(
            "/api/webhooks/vnpay",
            get(api::webhook_proxy::handle_gateway_event)
                .post(api::webhook_proxy::handle_gateway_event),
        )
        .with_state(proxy_state);

    let health_checker = HealthChecker::new(db_pool);

    let app = Router::new()
        .route("/health", get(health))
        .route("/health/live", get(liveness))
        .with_state(health_checker)
        .merge(payment_routes)
        .merge(partner_routes)
        .merge(proxy_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "Server listening, ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

async fn health(
    State(checker): State<HealthChecker>,
) -> Result<Json<HealthStatus>, (axum::http::StatusCode, String)> {
    let health_status = checker.check_health().await;

    if health_status.is_healthy() {
        Ok(Json(health_status))
    } else {
        error!("Health check failed - service unhealthy");
        Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable".to_string(),
        ))
    }
}

/// Liveness probe - checks if the service is alive (basic check)
async fn liveness() -> &'static str {
    "OK"
}
