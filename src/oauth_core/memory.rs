//! In-memory implementation of the capability contract.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::provider::OAuthStore;
use super::types::{AccessToken, OAuthError, RefreshToken, User, UserId};

/// A registered resource owner.
///
/// Passwords are compared in plaintext: hashing is the integrator's
/// concern, and this store is meant for tests and examples rather than
/// production credential storage.
#[derive(Debug, Clone)]
pub struct MemoryUser {
    /// Opaque identifier returned on successful authentication.
    pub user_id: UserId,
    /// The password the user authenticates with.
    pub password: String,
    /// The maximal space-delimited scope the user may be granted.
    pub scope: String,
}

/// In-memory storage backend for users, access tokens and refresh tokens.
///
/// Token values are v4 UUIDs. Clones share the same underlying maps.
#[derive(Clone)]
pub struct MemoryStore {
    users: Arc<DashMap<String, MemoryUser>>,
    access_tokens: Arc<RwLock<HashMap<String, AccessToken>>>,
    refresh_tokens: Arc<RwLock<HashMap<String, RefreshToken>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore {
            users: Arc::new(DashMap::new()),
            access_tokens: Arc::new(RwLock::new(HashMap::new())),
            refresh_tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a user under the given username.
    pub fn add_user(&self, username: impl Into<String>, user: MemoryUser) {
        self.users.insert(username.into(), user);
    }

    /// Drops every access and refresh token past its expiry.
    ///
    /// The engine never calls this; scheduled cleanup is the integrator's
    /// job, and this method is the hook for it.
    pub async fn purge_expired(&self) {
        let now = Utc::now();
        self.access_tokens.write().await.retain(|_, t| t.expires > now);
        self.refresh_tokens.write().await.retain(|_, t| t.expires > now);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OAuthStore for MemoryStore {
    async fn authenticate_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, OAuthError> {
        let entry = self
            .users
            .get(username)
            .ok_or_else(|| OAuthError::invalid_grant("unknown user"))?;
        if entry.password != password {
            return Err(OAuthError::invalid_grant("wrong password"));
        }
        Ok(User {
            user_id: entry.user_id.clone(),
            scope: entry.scope.clone(),
        })
    }

    async fn create_access_token(
        &self,
        expires: DateTime<Utc>,
        scope: &str,
        user_id: &UserId,
    ) -> Result<AccessToken, OAuthError> {
        let token = AccessToken {
            token: Uuid::new_v4().to_string(),
            scope: scope.to_string(),
            user_id: user_id.clone(),
            expires,
        };
        self.access_tokens
            .write()
            .await
            .insert(token.token.clone(), token.clone());
        Ok(token)
    }

    async fn create_refresh_token(
        &self,
        access_token: &str,
        expires: DateTime<Utc>,
        user_id: &UserId,
    ) -> Result<RefreshToken, OAuthError> {
        let token = RefreshToken {
            token: Uuid::new_v4().to_string(),
            access_token: access_token.to_string(),
            user_id: user_id.clone(),
            expires,
        };
        self.refresh_tokens
            .write()
            .await
            .insert(token.token.clone(), token.clone());
        Ok(token)
    }

    async fn get_access_token(&self, token: &str) -> Result<Option<AccessToken>, OAuthError> {
        Ok(self.access_tokens.read().await.get(token).cloned())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, OAuthError> {
        Ok(self.refresh_tokens.read().await.get(token).cloned())
    }

    async fn revoke_access_token(&self, token: &str) -> Result<(), OAuthError> {
        if self.access_tokens.write().await.remove(token).is_none() {
            return Err(OAuthError::invalid_token("unknown access token"));
        }
        self.refresh_tokens
            .write()
            .await
            .retain(|_, refresh| refresh.access_token != token);
        Ok(())
    }
}
