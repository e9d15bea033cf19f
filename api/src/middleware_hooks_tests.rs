//! Router tests for the session binding, the permission gates and the
//! access endpoints. Requests go through the full middleware stack with
//! `tower::ServiceExt::oneshot`.

#[cfg(test)]
mod tests {
    use crate::{create_router, AppState};
    use authz::{AccessEvaluator, NavigationGate, PermissionCode, Registry, Role};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use user::{password::hash_password, Account, AccountDirectory, SessionConfig, UserManager};

    fn account(username: &str, hash: &str, role: Role, grants: &[&str]) -> Account {
        Account {
            username: username.to_string(),
            password_hash: hash.to_string(),
            role,
            permissions: grants.iter().map(|c| PermissionCode::from(*c)).collect(),
            sub_roles: Vec::new(),
        }
    }

    fn app() -> Router {
        let hash = hash_password("secret").unwrap();
        let directory = AccountDirectory::new(vec![
            account("admin", &hash, Role::Superuser, &[]),
            account("amina", &hash, Role::Teacher, &["VIEW_REPORTS"]),
            account("sam", &hash, Role::Student, &[]),
        ])
        .unwrap();

        let state = AppState {
            evaluator: AccessEvaluator::new(Arc::new(Registry::school_default().unwrap())),
            users: UserManager::new(directory),
            gate: NavigationGate::default(),
            session: SessionConfig::default(),
        };
        create_router(state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    /// Logs in and returns the session cookie pair (`id=...`).
    async fn login(app: &Router, username: &str) -> String {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/auth/login",
                json!({ "username": username, "password": "secret" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login sets a session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = app().oneshot(get("/api/v1/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-campus-processed"], "true");

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["registry"]["accounts"], 3);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/auth/login",
                json!({ "username": "amina", "password": "nope" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_login_returns_effective_permissions() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/auth/login",
                json!({ "username": "amina", "password": "secret" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["user"]["role"], "teacher");
        let permissions = body["permissions"].as_array().unwrap();
        assert!(permissions.contains(&json!("CRUD_STUDENT")));
        assert!(permissions.contains(&json!("VIEW_REPORTS")));
        assert!(!permissions.contains(&json!("CRUD_PAYMENT")));
    }

    #[tokio::test]
    async fn test_me_requires_session() {
        let response = app().oneshot(get("/api/v1/auth/me", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_lists_routes_for_student() {
        let app = app();
        let cookie = login(&app, "sam").await;

        let response = app
            .oneshot(get("/api/v1/auth/me", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let routes = body["routes"].as_array().unwrap();
        assert!(routes.contains(&json!("/my/grades")));
        assert!(!routes.contains(&json!("/students")));
    }

    #[tokio::test]
    async fn test_anonymous_routes_are_public_only() {
        let response = app()
            .oneshot(get("/api/v1/access/routes", None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["routes"], json!(["/login", "/unauthorized"]));
    }

    #[tokio::test]
    async fn test_check_permission() {
        let app = app();
        let cookie = login(&app, "amina").await;

        let allowed = body_json(
            app.clone()
                .oneshot(get("/api/v1/access/check?permission=CRUD_GRADE", Some(&cookie)))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(allowed["allowed"], true);

        let denied = body_json(
            app.oneshot(get("/api/v1/access/check?permission=CRUD_DEBT", Some(&cookie)))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(denied["allowed"], false);
    }

    #[tokio::test]
    async fn test_registry_gate() {
        let app = app();

        let anonymous = app
            .clone()
            .oneshot(get("/api/v1/access/registry", None))
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let teacher = login(&app, "amina").await;
        let forbidden = app
            .clone()
            .oneshot(get("/api/v1/access/registry", Some(&teacher)))
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        let body = body_json(forbidden).await;
        assert_eq!(body["error"]["code"], "FORBIDDEN");
        assert!(!body.to_string().contains("MANAGE_PERMISSIONS"));

        let admin = login(&app, "admin").await;
        let allowed = app
            .oneshot(get("/api/v1/access/registry", Some(&admin)))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
        let body = body_json(allowed).await;
        assert_eq!(body["unregistered_routes"], "deny");
        assert_eq!(
            body["roles"]["superuser"].as_array().unwrap().len(),
            body["permissions"].as_array().unwrap().len()
        );
    }

    #[tokio::test]
    async fn test_guard_evaluation() {
        let app = app();
        let cookie = login(&app, "sam").await;

        let hidden = body_json(
            app.clone()
                .oneshot(post_json(
                    "/api/v1/access/guard",
                    json!({
                        "permissions": ["CRUD_PAYMENT", "VIEW_OWN_GRADES"],
                        "requireAll": true
                    }),
                    Some(&cookie),
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(hidden["render"], false);

        let shown = body_json(
            app.clone()
                .oneshot(post_json(
                    "/api/v1/access/guard",
                    json!({ "permissions": ["CRUD_PAYMENT", "VIEW_OWN_GRADES"] }),
                    Some(&cookie),
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(shown["render"], true);

        let anonymous = body_json(
            app.oneshot(post_json("/api/v1/access/guard", json!({}), None))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(anonymous["render"], false);
    }

    #[tokio::test]
    async fn test_navigation_redirects() {
        let app = app();

        let anonymous = app
            .clone()
            .oneshot(get("/api/v1/access/navigate?to=/reports", None))
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
        assert_eq!(anonymous.headers()[header::LOCATION], "/login");

        let student = login(&app, "sam").await;
        let forbidden = app
            .clone()
            .oneshot(get("/api/v1/access/navigate?to=/reports", Some(&student)))
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::SEE_OTHER);
        assert_eq!(forbidden.headers()[header::LOCATION], "/unauthorized");

        let teacher = login(&app, "amina").await;
        let allowed = app
            .oneshot(get("/api/v1/access/navigate?to=/reports", Some(&teacher)))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(body_json(allowed).await["allowed"], true);
    }

    #[tokio::test]
    async fn test_unregistered_route_denied_for_superuser() {
        let app = app();
        let admin = login(&app, "admin").await;

        let response = app
            .oneshot(get("/api/v1/access/navigate?to=/new-feature", Some(&admin)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/unauthorized");
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let app = app();
        let cookie = login(&app, "amina").await;

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/auth/logout", json!({}), Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let after = app
            .oneshot(get("/api/v1/auth/me", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let response = app()
            .oneshot(get("/api/v1/openapi.json", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(body["paths"]["/api/v1/access/navigate"].is_object());
    }
}
