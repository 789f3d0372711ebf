//! Engine facade: grant dispatch, the authorization gate and revocation.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use super::grants::{PasswordFlow, RefreshTokenFlow};
use super::provider::OAuthStore;
use super::scope::scope_included;
use super::types::{GrantRequest, OAuthError, TokenResponse};

/// Engine-wide settings, fixed at construction and immutable afterwards.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Access token lifetime in seconds.
    pub access_token_lifetime: u64,
    /// Whether successful grants also mint a refresh token.
    pub issue_refresh_token: bool,
    /// Refresh token lifetime in seconds.
    pub refresh_token_lifetime: u64,
    /// Permission token that satisfies every scope requirement when present
    /// in a granted scope. `None` disables the override.
    pub super_scope: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            access_token_lifetime: 86_400,
            issue_refresh_token: true,
            refresh_token_lifetime: 604_800,
            super_scope: None,
        }
    }
}

/// Stateless credential engine over a pluggable [`OAuthStore`].
///
/// The engine holds no token state of its own; every operation is a fresh
/// round-trip through the store, so each public method is independently
/// callable from concurrent tasks with no engine-level synchronization.
pub struct OAuthEngine<S: OAuthStore> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: OAuthStore> Clone for OAuthEngine<S> {
    fn clone(&self) -> Self {
        OAuthEngine {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: OAuthStore> OAuthEngine<S> {
    /// Creates an engine over the given store and settings.
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        OAuthEngine { store, config }
    }

    /// Creates an engine with default settings.
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, EngineConfig::default())
    }

    /// The settings this engine was constructed with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Dispatches a token request to the matching grant flow.
    ///
    /// Only the `password` and `refresh_token` grants are issued; any other
    /// recognized grant type fails with `unsupported_grant_type` before a
    /// single store call is made.
    #[instrument(skip_all, fields(grant_type = request.grant_type()), level = "debug")]
    pub async fn token(&self, request: GrantRequest) -> Result<TokenResponse, OAuthError> {
        match request {
            GrantRequest::Password {
                username,
                password,
                scope,
            } => {
                PasswordFlow::new(self.store.clone(), self.config.clone())
                    .execute(&username, &password, scope.as_deref())
                    .await
            }
            GrantRequest::RefreshToken { refresh_token } => {
                RefreshTokenFlow::new(self.store.clone(), self.config.clone())
                    .execute(&refresh_token)
                    .await
            }
            other => Err(OAuthError::unsupported_grant_type(other.grant_type())),
        }
    }

    /// Validates a bearer token against a required scope.
    ///
    /// Pure gate with no mutation: retrieval, expiry check, then scope
    /// inclusion. Safe to call repeatedly and concurrently for the same
    /// token.
    #[instrument(skip(self), level = "debug")]
    pub async fn authorize(&self, token: &str, required_scope: &str) -> Result<(), OAuthError> {
        let access = self
            .store
            .get_access_token(token)
            .await
            .map_err(|e| {
                OAuthError::invalid_token("failed to look up the access token").with_source(e)
            })?
            .ok_or_else(|| OAuthError::invalid_token("unknown access token"))?;

        if Utc::now() > access.expires {
            return Err(OAuthError::invalid_token("expired access token"));
        }

        if !scope_included(
            required_scope,
            &access.scope,
            self.config.super_scope.as_deref(),
        ) {
            return Err(
                OAuthError::invalid_scope("token lacks the required scope").with_status(403),
            );
        }

        Ok(())
    }

    /// Revokes an access token, cascading to its refresh tokens.
    ///
    /// Every failure, including an unknown token, is normalized to
    /// `invalid_token`.
    #[instrument(skip(self), level = "debug")]
    pub async fn revoke(&self, token: &str) -> Result<(), OAuthError> {
        self.store.revoke_access_token(token).await.map_err(|e| {
            OAuthError::invalid_token("failed to revoke the access token").with_source(e)
        })
    }
}
