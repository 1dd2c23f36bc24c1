use axum::Extension;
use axum::Json;
use axum::http::StatusCode;
use chrono::Utc;

use crate::server::dtos::health_dto::{HealthResponse, HealthStatus};
use crate::server::services::relay_services::RelayServices;
use crate::server::{get_app_version, get_uptime_seconds};

/// health endpoint, the relay keeps no connections of its own so if this answers it's healthy
pub async fn health_endpoint(
    Extension(services): Extension<RelayServices>,
) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        timestamp: Utc::now(),
        uptime_seconds: get_uptime_seconds(),
        version: get_app_version().to_string(),
        environment: format!("{:?}", services.config.cargo_env).to_lowercase(),
        download_mode: services.config.download_mode.as_str().to_string(),
    };

    (StatusCode::OK, Json(response))
}
