/*!
 * # Authentication
 *
 * Credentials are checked by an [`IdentityProvider`]; a successful login
 * yields an opaque bearer token tracked by the [`SessionManager`]. Handlers
 * take an [`AuthUser`] argument to require a live session.
 */

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{Role, SessionUser, User, ALL_FIRMS};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Source of truth for who may log in.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, id: &str, password: &str) -> Result<SessionUser, ServiceError>;
}

/// Fixed credential table, optionally loaded from a JSON file.
#[derive(Clone, Debug)]
pub struct StaticIdentityProvider {
    users: Vec<User>,
}

impl StaticIdentityProvider {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// The built-in table: one master plus an admin and a user per firm.
    pub fn seeded() -> Self {
        let user = |id: &str, password: &str, role: Role, firm: &str, name: &str| User {
            id: id.into(),
            password: password.into(),
            role,
            firm: firm.into(),
            name: name.into(),
        };

        Self::new(vec![
            user("master", "master123", Role::Master, ALL_FIRMS, "Master Admin"),
            user("admin1", "adminA", Role::Admin, "AAA", "AAA Admin"),
            user("admin2", "adminBBB", Role::Admin, "BBB", "BBB Admin"),
            user("admin3", "adminref", Role::Admin, "CCC", "CCC Admin"),
            user("admin4", "adminDDD", Role::Admin, "DDD", "DDD Admin"),
            user("user1", "userA", Role::User, "AAA", "AAA User"),
            user("user2", "userBBB", Role::User, "BBB", "BBB User"),
            user("user3", "userref", Role::Admin, "CCC", "CCC User"),
            user("user4", "userDDD", Role::User, "DDD", "DDD User"),
        ])
    }

    /// Reads a JSON array of users, replacing the seed table entirely.
    pub fn from_file(path: &Path) -> Result<Self, ServiceError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::StorageError(format!("cannot read users file {}: {}", path.display(), e))
        })?;
        let users: Vec<User> = serde_json::from_str(&raw)?;
        info!(count = users.len(), path = %path.display(), "loaded users file");
        Ok(Self::new(users))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn authenticate(&self, id: &str, password: &str) -> Result<SessionUser, ServiceError> {
        self.users
            .iter()
            .find(|u| u.id == id && u.password == password)
            .map(SessionUser::from)
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()))
    }
}

/// Live sessions keyed by token.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<String, SessionUser>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, user: SessionUser) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), user);
        token
    }

    pub fn resolve(&self, token: &str) -> Option<SessionUser> {
        self.sessions.get(token).map(|entry| entry.value().clone())
    }

    pub fn close(&self, token: &str) -> Option<SessionUser> {
        self.sessions.remove(token).map(|(_, user)| user)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "id is required"))]
    pub id: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

/// Login, logout and token resolution over an identity provider.
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    sessions: SessionManager,
    event_sender: Arc<EventSender>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityProvider>, event_sender: Arc<EventSender>) -> Self {
        Self {
            identity,
            sessions: SessionManager::new(),
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(user_id = %request.id))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ServiceError> {
        request.validate()?;
        let user = match self.identity.authenticate(&request.id, &request.password).await {
            Ok(user) => user,
            Err(err) => {
                warn!("login rejected");
                return Err(err);
            }
        };

        let token = self.sessions.open(user.clone());
        info!(role = %user.role, firm = %user.firm, "session opened");
        self.event_sender
            .publish(Event::SessionStarted {
                user_id: user.id.clone(),
            })
            .await;
        Ok(LoginResponse { token, user })
    }

    /// Drops the session; an unknown token is not an error.
    pub async fn logout(&self, token: &str) -> Option<SessionUser> {
        let closed = self.sessions.close(token);
        if let Some(user) = &closed {
            info!(user_id = %user.id, "session closed");
            self.event_sender
                .publish(Event::SessionEnded {
                    user_id: user.id.clone(),
                })
                .await;
        }
        closed
    }

    pub fn resolve(&self, token: &str) -> Result<SessionUser, ServiceError> {
        self.sessions
            .resolve(token)
            .ok_or_else(|| ServiceError::Unauthorized("Session expired or invalid".to_string()))
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The authenticated caller of a request.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: SessionUser,
    pub token: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AuthService>: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = Arc::<AuthService>::from_ref(state);
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            debug!("request without bearer token");
            ServiceError::Unauthorized("Missing bearer token".to_string())
        })?;

        let user = auth.resolve(token)?;
        Ok(AuthUser {
            user,
            token: token.to_string(),
        })
    }
}
