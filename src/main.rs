use axum::routing::{get, post};
use axum::{Json, Router};
use checkout_gateway::api;
use checkout_gateway::config::AppConfig;
use checkout_gateway::health::{self, HealthChecker};
use checkout_gateway::logging::init_tracing;
use checkout_gateway::middleware::logging::{request_logging_middleware, UuidRequestId};
use std::net::SocketAddr;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::info;

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "checkout-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
    }))
}

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

pub fn build_router(health_checker: HealthChecker) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health::health))
        .route(
            "/callback",
            post(api::callback::handle_callback_post).get(api::callback::handle_callback_get),
        )
        .route("/api/payment", post(api::payment::submit_payment))
        .with_state(health_checker)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env()?;
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        gateway = %config.gateway.base_url,
        poll_interval_ms = config.resolver.poll_delay.as_millis() as u64,
        max_poll_attempts = config.resolver.max_attempts,
        "🚀 Starting checkout gateway service"
    );

    let health_checker = HealthChecker::new(config.gateway.base_url.clone());
    let app = build_router(health_checker);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("checkout gateway service stopped");
    Ok(())
}
