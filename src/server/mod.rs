pub mod api;
pub mod dtos;
pub mod error;
pub mod services;
pub mod utils;

use std::{sync::Arc, time::Instant};

use anyhow::Context;
use axum::{
    Extension, Router,
    extract::Request,
    http::{HeaderValue, Method, header},
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use once_cell::sync::Lazy;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    normalize_path::NormalizePathLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::AppConfig;

use self::{
    api::{download_controller::DownloadController, health_controller::health_endpoint},
    services::relay_services::RelayServices,
};

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

pub fn get_uptime_seconds() -> u64 {
    START_TIME.elapsed().as_secs()
}

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub struct RelayApplicationServer;

impl RelayApplicationServer {
    /// every route the relay exposes, with services injected as an extension
    pub fn router(services: RelayServices, metrics: Option<PrometheusHandle>) -> Router {
        let cors = Self::cors_layer(&services.config.cors_origin);

        let mut router = Router::new()
            .nest("/api/download", DownloadController::app())
            .route("/health", get(health_endpoint));

        if let Some(handle) = metrics {
            router = router.route(
                "/metrics",
                get(move || {
                    let handle = handle.clone();
                    async move { handle.render() }
                }),
            );
        }

        router
            .layer(Extension(services))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    pub async fn serve(
        config: Arc<AppConfig>,
        metrics: Option<PrometheusHandle>,
    ) -> anyhow::Result<()> {
        // touch it so uptime counts from boot rather than the first health check
        Lazy::force(&START_TIME);

        let services = RelayServices::new(config.clone())?;
        let router = Self::router(services, metrics);

        // has to wrap the router itself, a layer inside it runs after routing
        let app = NormalizePathLayer::trim_trailing_slash().layer(router);

        let addr = format!("0.0.0.0:{}", config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        info!("relay listening on {}", addr);

        axum::serve(
            listener,
            axum::ServiceExt::<Request>::into_make_service(app),
        )
        .with_graceful_shutdown(Self::shutdown_signal())
        .await
        .context("server error")?;

        info!("relay shut down");
        Ok(())
    }

    fn cors_layer(cors_origin: &str) -> CorsLayer {
        let allow_origin = if cors_origin.trim() == "*" {
            AllowOrigin::any()
        } else {
            let origins: Vec<HeaderValue> = cors_origin
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!("ignoring invalid cors origin {}: {}", o, e);
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
            // the browser needs to read the file name off the response
            .expose_headers([header::CONTENT_DISPOSITION, header::CONTENT_LENGTH])
    }

    async fn shutdown_signal() {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for ctrl-c: {}", e);
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
                    warn!("failed to listen for SIGTERM: {}", e);
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

        info!("shutdown signal received");
    }
}
