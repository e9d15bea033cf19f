use crate::{create_router, AppState};
use authz::{load_registry, AccessEvaluator, NavigationGate};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use user::{SessionConfig, UserManager};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    /// YAML policy file; the built-in school registry when unset
    pub policy_path: Option<PathBuf>,
    /// YAML accounts file
    pub accounts_path: Option<PathBuf>,
    pub session: SessionConfig,
    pub login_route: String,
    pub forbidden_route: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let gate = NavigationGate::default();
        Self {
            port: 3030,
            policy_path: None,
            accounts_path: None,
            session: SessionConfig::default(),
            login_route: gate.login_route,
            forbidden_route: gate.forbidden_route,
        }
    }
}

impl ApiConfig {
    /// Create a new API configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `PORT`, `POLICY_PATH`, `ACCOUNTS_PATH`, `SESSION_TTL_MINUTES`,
    /// `LOGIN_ROUTE` and `FORBIDDEN_ROUTE`. Unset or unparsable values keep
    /// their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(port) = parse_env::<u16>("PORT") {
            config.port = port;
        }
        if let Ok(path) = std::env::var("POLICY_PATH") {
            config.policy_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("ACCOUNTS_PATH") {
            config.accounts_path = Some(PathBuf::from(path));
        }
        if let Some(ttl) = parse_env::<u32>("SESSION_TTL_MINUTES") {
            config.session.ttl_minutes = ttl;
        }
        if let Ok(route) = std::env::var("LOGIN_ROUTE") {
            config.login_route = route;
        }
        if let Ok(route) = std::env::var("FORBIDDEN_ROUTE") {
            config.forbidden_route = route;
        }

        config
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the policy file
    pub fn with_policy(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_path = Some(path.into());
        self
    }

    /// Set the accounts file
    pub fn with_accounts(mut self, path: impl Into<PathBuf>) -> Self {
        self.accounts_path = Some(path.into());
        self
    }

    /// Set the session inactivity timeout
    pub fn with_session_ttl(mut self, minutes: u32) -> Self {
        self.session.ttl_minutes = minutes;
        self
    }

    pub fn with_redirects(
        mut self,
        login_route: impl Into<String>,
        forbidden_route: impl Into<String>,
    ) -> Self {
        self.login_route = login_route.into();
        self.forbidden_route = forbidden_route.into();
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring invalid {}={}", key, value);
            None
        }
    }
}

/// Loads the registry and the accounts the configuration points at.
pub fn build_state(config: &ApiConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    config.session.validate()?;
    let registry = Arc::new(load_registry(config.policy_path.as_deref())?);
    let users = UserManager::from_path(config.accounts_path.as_deref())?;

    let undeclared = users.directory().undeclared_grants(&registry);
    if !undeclared.is_empty() {
        warn!(
            "{} account grants name undeclared permissions and will never match",
            undeclared.len()
        );
    }

    Ok(AppState {
        evaluator: AccessEvaluator::new(registry),
        users,
        gate: NavigationGate::new(&config.login_route, &config.forbidden_route),
        session: config.session.clone(),
    })
}

/// Start the API server with the given configuration
pub async fn start_server_with_config(config: ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(&config)?;
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);
    info!(
        "OpenAPI document available at http://localhost:{}/api/v1/openapi.json",
        config.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Start the API server with configuration from the environment
pub async fn start_server() -> Result<(), Box<dyn std::error::Error>> {
    start_server_with_config(ApiConfig::from_env()).await
}

/// Start the API server in a background task
pub fn spawn_server() -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_server().await {
            tracing::error!("API server error: {}", e);
        }
    })
}

/// Start the API server in a background task with custom configuration
pub fn spawn_server_with_config(config: ApiConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_server_with_config(config).await {
            tracing::error!("API server error: {}", e);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ApiConfig::new()
            .with_port(8080)
            .with_session_ttl(5)
            .with_redirects("/signin", "/403");

        assert_eq!(config.port, 8080);
        assert_eq!(config.session.ttl_minutes, 5);
        assert_eq!(config.login_route, "/signin");
        assert_eq!(config.forbidden_route, "/403");
        assert!(config.policy_path.is_none());
    }

    #[test]
    fn test_build_state_defaults() {
        let state = build_state(&ApiConfig::default()).unwrap();
        assert!(state.users.directory().is_empty());
        assert!(state.evaluator.registry().route_count() > 0);
        assert_eq!(state.gate, NavigationGate::default());
    }

    #[test]
    fn test_build_state_missing_policy_file() {
        let config = ApiConfig::default().with_policy("/nonexistent/policy.yaml");
        assert!(build_state(&config).is_err());
    }

    #[test]
    fn test_build_state_rejects_session_ttl_out_of_range() {
        for ttl in [0, u32::MAX] {
            let config = ApiConfig::default().with_session_ttl(ttl);
            let err = build_state(&config).err().unwrap();
            assert!(err.to_string().contains("Session TTL"));
        }
    }
}
