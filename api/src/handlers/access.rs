//! Access queries: reachable routes, single permission checks, guard
//! evaluation for conditional rendering and the navigation gate.

use authz::{GuardRequirement, NavigationDecision};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Redirect, Response},
    Extension,
};
use tracing::{debug, info};

use crate::{
    error::{ApiErrorResponse, ApiResult},
    middleware_hooks::RequestUser,
    models::{
        CheckParams, CheckResponse, GuardRequest, GuardResponse, NavigateParams,
        NavigateResponse, RegistryResponse, RoutesResponse,
    },
    AppState,
};

/// Routes the caller may open, in registry order
///
/// GET /api/v1/access/routes
#[utoipa::path(
    get,
    path = "/api/v1/access/routes",
    responses(
        (status = 200, description = "Accessible routes", body = RoutesResponse)
    ),
    tag = "access"
)]
pub async fn accessible_routes(
    State(state): State<AppState>,
    Extension(current): Extension<RequestUser>,
) -> Json<RoutesResponse> {
    Json(RoutesResponse {
        routes: state.evaluator.accessible_routes(current.user()),
    })
}

/// Check a single permission code for the session user
///
/// GET /api/v1/access/check?permission=CODE
#[utoipa::path(
    get,
    path = "/api/v1/access/check",
    params(
        ("permission" = String, Query, description = "Permission code to test")
    ),
    responses(
        (status = 200, description = "Decision", body = CheckResponse),
        (status = 401, description = "No session", body = ApiErrorResponse)
    ),
    tag = "access"
)]
pub async fn check_permission(
    State(state): State<AppState>,
    Extension(current): Extension<RequestUser>,
    Query(params): Query<CheckParams>,
) -> ApiResult<Json<CheckResponse>> {
    let allowed = state
        .evaluator
        .can_access(current.user(), params.permission.trim());

    Ok(Json(CheckResponse {
        permission: params.permission,
        allowed,
    }))
}

/// Evaluate a guard requirement (conditional rendering)
///
/// POST /api/v1/access/guard
#[utoipa::path(
    post,
    path = "/api/v1/access/guard",
    request_body = GuardRequest,
    responses(
        (status = 200, description = "Whether the guarded element renders", body = GuardResponse)
    ),
    tag = "access"
)]
pub async fn evaluate_guard(
    State(state): State<AppState>,
    Extension(current): Extension<RequestUser>,
    Json(req): Json<GuardRequest>,
) -> Json<GuardResponse> {
    let requirement = GuardRequirement::from(req);
    let render = requirement.evaluate(&state.evaluator, current.user());
    debug!("Guard {:?} evaluated to {}", requirement, render);

    Json(GuardResponse { render })
}

/// Navigation gate
///
/// GET /api/v1/access/navigate?to=/route
///
/// Answers 200 when the target may be opened, otherwise 303 to the login
/// page (no session) or the forbidden page.
#[utoipa::path(
    get,
    path = "/api/v1/access/navigate",
    params(
        ("to" = String, Query, description = "Target application route")
    ),
    responses(
        (status = 200, description = "Navigation allowed", body = NavigateResponse),
        (status = 303, description = "Redirect to login or forbidden page")
    ),
    tag = "access"
)]
pub async fn navigate(
    State(state): State<AppState>,
    Extension(current): Extension<RequestUser>,
    Query(params): Query<NavigateParams>,
) -> Response {
    match state
        .gate
        .decide(&state.evaluator, current.user(), &params.to)
    {
        NavigationDecision::Allow => Json(NavigateResponse {
            allowed: true,
            target: params.to,
        })
        .into_response(),
        NavigationDecision::Redirect(location) => {
            info!("Navigation to {} redirected to {}", params.to, location);
            Redirect::to(&location).into_response()
        }
    }
}

/// Dump of the active registry (gated on MANAGE_PERMISSIONS)
///
/// GET /api/v1/access/registry
#[utoipa::path(
    get,
    path = "/api/v1/access/registry",
    responses(
        (status = 200, description = "Registry tables", body = RegistryResponse),
        (status = 401, description = "No session", body = ApiErrorResponse),
        (status = 403, description = "Missing permission", body = ApiErrorResponse)
    ),
    tag = "access"
)]
pub async fn registry(State(state): State<AppState>) -> Json<RegistryResponse> {
    Json(RegistryResponse::from(state.evaluator.registry()))
}
