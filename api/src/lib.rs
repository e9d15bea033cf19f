use authz::{codes, AccessEvaluator, NavigationGate, PermissionCode};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use user::{SessionConfig, UserManager};
use utoipa::OpenApi;

pub mod error;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod server;

#[cfg(test)]
mod middleware_hooks_tests;

// Re-export server functions for convenience
pub use server::{
    build_state, spawn_server, spawn_server_with_config, start_server, start_server_with_config,
    ApiConfig,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub evaluator: AccessEvaluator,
    pub users: UserManager,
    pub gate: NavigationGate,
    pub session: SessionConfig,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_current_user,
        handlers::access::accessible_routes,
        handlers::access::check_permission,
        handlers::access::evaluate_guard,
        handlers::access::navigate,
        handlers::access::registry,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::LoginRequest,
            models::LoginResponse,
            models::UserView,
            models::MeResponse,
            models::RoutesResponse,
            models::CheckResponse,
            models::GuardRequest,
            models::GuardResponse,
            models::NavigateResponse,
            models::RouteView,
            models::RegistryResponse,
            models::HealthResponse,
            models::RegistryHealth,
            models::SuccessResponse,
            error::ApiErrorResponse,
            error::ErrorDetail,
        )
    ),
    tags(
        (name = "auth", description = "Login, logout and session user"),
        (name = "access", description = "Permission and route checks"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Campus Access API",
        version = "1.0.0",
        description = "Role-based access control for the campus CRM",
    ),
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Routes that need a signed-in user
    let session_routes = Router::new()
        .route("/access/check", get(handlers::access::check_permission))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::session_gate,
        ));

    // Routes gated on a permission code
    let admin_routes = Router::new()
        .route("/access/registry", get(handlers::access::registry))
        .route_layer(middleware::from_fn_with_state(
            (
                state.clone(),
                PermissionCode::from(codes::MANAGE_PERMISSIONS),
            ),
            middleware_hooks::permission_gate,
        ));

    // API v1 routes
    let api_v1 = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::get_current_user))
        .route("/access/routes", get(handlers::access::accessible_routes))
        .route("/access/guard", post(handlers::access::evaluate_guard))
        .route("/access/navigate", get(handlers::access::navigate))
        .route("/health", get(handlers::health::health_check))
        .route("/openapi.json", get(openapi_json))
        .merge(session_routes)
        .merge(admin_routes)
        // Apply middleware to all API routes
        .layer(middleware::from_fn(
            middleware_hooks::authentication_middleware,
        ))
        .layer(middleware::from_fn(middleware_hooks::request_middleware))
        .layer(middleware::from_fn(middleware_hooks::response_middleware));

    let session_layer = state.session.layer();

    // Main router
    Router::new()
        .nest("/api/v1", api_v1)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(session_layer),
        )
        .with_state(state)
}
