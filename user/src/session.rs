//! Session binding: stores the [`User`] snapshot in a tower-sessions
//! [`Session`] at login and hands it back to each request.

use authz::User;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing::{debug, error};

use crate::error::{Result, UserError};

/// Session keys used for storing data
pub struct SessionKeys;

impl SessionKeys {
    pub const DATA: &'static str = "campus.session";
}

/// What a session carries between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user: User,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Longest accepted inactivity timeout: one year.
pub const MAX_SESSION_TTL_MINUTES: u32 = 525_600;

/// Cookie session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Inactivity timeout, 1..=[`MAX_SESSION_TTL_MINUTES`].
    pub ttl_minutes: u32,
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 30,
            secure_cookie: false,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ttl_minutes == 0 || self.ttl_minutes > MAX_SESSION_TTL_MINUTES {
            return Err(UserError::InvalidSessionTtl(self.ttl_minutes));
        }
        Ok(())
    }

    /// Session layer backed by an in-process store. An out-of-range TTL is
    /// clamped here; call [`SessionConfig::validate`] to reject it instead.
    pub fn layer(&self) -> SessionManagerLayer<MemoryStore> {
        let minutes = self.ttl_minutes.clamp(1, MAX_SESSION_TTL_MINUTES);
        SessionManagerLayer::new(MemoryStore::default())
            .with_secure(self.secure_cookie)
            .with_expiry(Expiry::OnInactivity(time::Duration::minutes(i64::from(minutes))))
    }
}

pub struct SessionManager;

impl SessionManager {
    /// Binds `user` to the session under a fresh session id.
    pub async fn create_session(session: &Session, user: &User) -> Result<SessionData> {
        let now = Utc::now();
        let data = SessionData {
            user: user.clone(),
            created_at: now,
            last_activity: now,
        };

        session
            .cycle_id()
            .await
            .map_err(|e| UserError::Session(format!("Failed to cycle session id: {}", e)))?;

        session
            .insert(SessionKeys::DATA, &data)
            .await
            .map_err(|e| UserError::Session(format!("Failed to store session data: {}", e)))?;

        session
            .save()
            .await
            .map_err(|e| UserError::Session(format!("Failed to save session: {}", e)))?;

        debug!("Session created for user: {}", user.username);
        Ok(data)
    }

    pub async fn get_session_data(session: &Session) -> Result<Option<SessionData>> {
        session
            .get(SessionKeys::DATA)
            .await
            .map_err(|e| UserError::Session(format!("Failed to read session data: {}", e)))
    }

    /// The user bound to this session, if any.
    pub async fn current_user(session: &Session) -> Result<Option<User>> {
        Ok(Self::get_session_data(session).await?.map(|data| data.user))
    }

    /// Update last activity timestamp
    pub async fn update_activity(session: &Session) -> Result<()> {
        let Some(mut data) = Self::get_session_data(session).await? else {
            return Ok(());
        };
        data.last_activity = Utc::now();

        session
            .insert(SessionKeys::DATA, &data)
            .await
            .map_err(|e| UserError::Session(format!("Failed to update last_activity: {}", e)))
    }

    /// Destroy a session (logout)
    pub async fn destroy_session(session: &Session) -> Result<()> {
        session
            .flush()
            .await
            .map_err(|e| UserError::Session(format!("Failed to flush session: {}", e)))?;

        debug!("Session destroyed");
        Ok(())
    }
}

/// Extractor for the optional session user.
pub struct CurrentUser(pub Option<User>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Extension(session): Extension<Session> = Extension::from_request_parts(parts, state)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        let user = SessionManager::current_user(&session).await.map_err(|e| {
            error!("Failed to get session user: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        Ok(CurrentUser(user))
    }
}

/// Extractor for a required session user (401 when absent).
pub struct RequiredUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequiredUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        match user {
            Some(user) if user.authenticated => Ok(RequiredUser(user)),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }
}
