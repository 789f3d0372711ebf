//! Capability contract the engine requires from its integrator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::{AccessToken, OAuthError, RefreshToken, User, UserId};

/// Storage and authentication operations backing the engine.
///
/// All six operations may fail; the engine re-wraps each failure into the
/// taxonomy kind fitting the step that invoked it. Every call is a single
/// suspension point: the engine never retries and never issues overlapping
/// calls within one flow. Concurrency control for token state, including
/// at-most-once consumption of a refresh token under concurrent exchange,
/// belongs to the implementation of this trait.
#[async_trait]
pub trait OAuthStore: Send + Sync + 'static {
    /// Verifies resource-owner credentials, returning the user with their
    /// maximal scope. An error means unknown user or wrong password.
    async fn authenticate_user(&self, username: &str, password: &str)
    -> Result<User, OAuthError>;

    /// Mints and persists a new access token. The store owns token-value
    /// generation; the returned `token` must be unique.
    async fn create_access_token(
        &self,
        expires: DateTime<Utc>,
        scope: &str,
        user_id: &UserId,
    ) -> Result<AccessToken, OAuthError>;

    /// Mints and persists a refresh token bound to an existing access token
    /// value.
    async fn create_refresh_token(
        &self,
        access_token: &str,
        expires: DateTime<Utc>,
        user_id: &UserId,
    ) -> Result<RefreshToken, OAuthError>;

    /// Looks up an access token by value. `Ok(None)` means the token does
    /// not exist; `Err` means the lookup itself failed.
    async fn get_access_token(&self, token: &str) -> Result<Option<AccessToken>, OAuthError>;

    /// Looks up a refresh token by value.
    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, OAuthError>;

    /// Deletes an access token together with every refresh token bound to
    /// it. An unknown token is an error.
    async fn revoke_access_token(&self, token: &str) -> Result<(), OAuthError>;
}
