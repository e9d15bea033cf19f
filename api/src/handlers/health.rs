use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use tracing::info;

use crate::{
    error::ApiResult,
    models::{HealthResponse, RegistryHealth},
    AppState,
};

/// Health check endpoint
///
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    info!("Health check requested");

    let registry = state.evaluator.registry();
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        registry: RegistryHealth {
            permissions: registry.known_permissions().len(),
            routes: registry.route_count(),
            accounts: state.users.directory().len(),
        },
    };

    Ok(Json(response))
}
