use authz::{PermissionCode, User};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info, warn};
use user::CurrentUser;

use crate::{error::ApiError, AppState};

/// The user resolved for the current request, `None` when there is no
/// session. Handlers read it with `Extension<RequestUser>`.
#[derive(Debug, Clone, Default)]
pub struct RequestUser(pub Option<User>);

impl RequestUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

/// Authentication middleware
///
/// Reads the session once per request and stores the snapshot as a
/// [`RequestUser`] extension, so gates and handlers evaluate against the
/// same user. Must run inside the session layer.
pub async fn authentication_middleware(
    CurrentUser(user): CurrentUser,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match &user {
        Some(user) => debug!(
            "AUTHN MIDDLEWARE: {} {} as {} ({})",
            request.method(),
            request.uri(),
            user.username,
            user.role
        ),
        None => debug!(
            "AUTHN MIDDLEWARE: {} {} without session",
            request.method(),
            request.uri()
        ),
    }

    request.extensions_mut().insert(RequestUser(user));
    next.run(request).await
}

fn request_user(request: &Request<Body>) -> Option<&User> {
    request
        .extensions()
        .get::<RequestUser>()
        .and_then(RequestUser::user)
}

/// Session gate
///
/// Rejects the request with 401 before the handler runs when nobody is
/// signed in.
pub async fn session_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if !state
        .evaluator
        .capabilities(request_user(&request))
        .is_authenticated()
    {
        warn!("SESSION GATE: No session for {}", request.uri());
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Permission gate
///
/// Installed per route with `from_fn_with_state((state, code), permission_gate)`.
/// Absent users get 401, users without the code get 403. The response body
/// never names the missing code.
pub async fn permission_gate(
    State((state, code)): State<(AppState, PermissionCode)>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request_user(&request);

    if !state.evaluator.capabilities(user).is_authenticated() {
        warn!(
            "AUTHZ MIDDLEWARE: Access DENIED for anonymous request to {}",
            request.uri()
        );
        return Err(ApiError::Unauthorized);
    }

    let username = user.map(|u| u.username.as_str()).unwrap_or_default();
    if !state.evaluator.can_access(user, code.as_str()) {
        warn!(
            "AUTHZ MIDDLEWARE: Access DENIED for {} on {} (requires {})",
            username,
            request.uri(),
            code
        );
        return Err(ApiError::Forbidden);
    }

    info!(
        "AUTHZ MIDDLEWARE: Access ALLOWED for {} on {}",
        username,
        request.uri()
    );
    Ok(next.run(request).await)
}

/// Request processing middleware hook
/// Logs the incoming request and how long the handler chain took
pub async fn request_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    info!(
        "REQUEST MIDDLEWARE: Processing incoming {} request to {}",
        method, uri
    );

    let response = next.run(request).await;

    debug!(
        "REQUEST MIDDLEWARE: {} {} processed in {:?}",
        method,
        uri,
        start.elapsed()
    );
    response
}

/// Response processing middleware hook
/// Stamps every response with the service headers
pub async fn response_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        "x-campus-version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    headers.insert("x-campus-processed", HeaderValue::from_static("true"));

    debug!(
        "RESPONSE MIDDLEWARE: Response {} postprocessing complete",
        response.status()
    );
    response
}
