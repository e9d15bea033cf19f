//! Session handlers: password login, logout and the current-user view.

use axum::{extract::State, response::Json, Extension};
use tower_sessions::Session;
use tracing::info;
use user::{RequiredUser, SessionManager};

use crate::{
    error::{ApiError, ApiErrorResponse, ApiResult},
    models::{codes_to_strings, LoginRequest, LoginResponse, MeResponse, SuccessResponse, UserView},
    AppState,
};

/// Password login
///
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created", body = LoginResponse),
        (status = 401, description = "Invalid username or password", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if req.username.trim().is_empty() {
        return Err(ApiError::InvalidCredentials);
    }

    let user = state.users.authenticate(&req.username, &req.password)?;
    SessionManager::create_session(&session, &user).await?;

    let permissions = codes_to_strings(&state.evaluator.effective_permissions(Some(&user)));
    info!("Login for {} ({} permissions)", user.username, permissions.len());

    Ok(Json(LoginResponse {
        user: UserView::from(&user),
        permissions,
    }))
}

/// Logout
///
/// POST /api/v1/auth/logout
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Session cleared", body = SuccessResponse)
    ),
    tag = "auth"
)]
pub async fn logout(Extension(session): Extension<Session>) -> ApiResult<Json<SuccessResponse>> {
    SessionManager::destroy_session(&session).await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    }))
}

/// Current user with resolved permissions and reachable routes
///
/// GET /api/v1/auth/me
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current session user", body = MeResponse),
        (status = 401, description = "No session", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    RequiredUser(user): RequiredUser,
) -> ApiResult<Json<MeResponse>> {
    SessionManager::update_activity(&session).await?;

    Ok(Json(MeResponse {
        user: UserView::from(&user),
        permissions: codes_to_strings(&state.evaluator.effective_permissions(Some(&user))),
        routes: state.evaluator.accessible_routes(Some(&user)),
    }))
}
