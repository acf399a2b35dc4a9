use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use super::{handlers, middleware::{handle_panic, track_http_metrics}};
use crate::{
    backend::{HttpBackend, MetricsBackend},
    config::GatewayConfig,
    GatewayError, Result,
};

#[derive(Clone)]
pub struct GatewayState {
    pub backend: Arc<dyn MetricsBackend>,
    pub config: Arc<GatewayConfig>,
}

impl GatewayState {
    pub fn new(backend: Arc<dyn MetricsBackend>, config: GatewayConfig) -> Self {
        Self {
            backend,
            config: Arc::new(config),
        }
    }
}

pub fn gateway_router(state: GatewayState) -> Result<Router> {
    let origin = HeaderValue::from_str(&state.config.cors_origin).map_err(|e| {
        GatewayError::Config(format!(
            "invalid CORS_ORIGIN {:?}: {}",
            state.config.cors_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Ok(Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/services/status", get(handlers::services_status))
        .route(
            "/api/service/:service_name/metrics",
            get(handlers::service_metrics),
        )
        .route("/api/business-metrics", get(handlers::business_metrics))
        .route("/api/metrics/history", get(handlers::metrics_history))
        .route_layer(middleware::from_fn(track_http_metrics))
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

pub async fn start_gateway(config: GatewayConfig) -> Result<()> {
    let backend: Arc<dyn MetricsBackend> = Arc::new(HttpBackend::from_config(&config));
    let addr = format!("0.0.0.0:{}", config.port);
    info!(
        "Polling {} for {} known services",
        config.prometheus_url,
        config.known_services.len()
    );

    let app = gateway_router(GatewayState::new(backend, config))?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        GatewayError::Internal(format!("Failed to bind to {}: {}", addr, e))
    })?;
    info!("Metrics gateway listening on {}", addr);
    info!("Dashboard: http://localhost:{}/api/dashboard", listener.local_addr()?.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GatewayError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
