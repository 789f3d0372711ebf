//! Grant state machines: password exchange and refresh exchange.
//!
//! Each flow is a short sequence of capability calls with a validation gate
//! between steps. Every gate is a single attempt that either advances the
//! flow or terminates it with a typed error; there are no retry loops.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::instrument;

use super::engine::EngineConfig;
use super::provider::OAuthStore;
use super::scope::scope_included;
use super::types::{AccessToken, OAuthError, TokenResponse};

fn bearer_response(
    access: &AccessToken,
    expires_in: u64,
    refresh_token: Option<String>,
) -> TokenResponse {
    TokenResponse {
        access_token: access.token.clone(),
        token_type: "Bearer".to_string(),
        expires_in,
        scope: access.scope.clone(),
        refresh_token,
    }
}

/// Resource Owner Password Credentials flow.
pub struct PasswordFlow<S: OAuthStore> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: OAuthStore> PasswordFlow<S> {
    /// Constructs a new password flow over the given store.
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        PasswordFlow { store, config }
    }

    /// Executes the password exchange: authenticate, gate the requested
    /// scope against the user's entitlement, then mint the token pair.
    #[instrument(skip(self, password), level = "debug")]
    pub async fn execute(
        &self,
        username: &str,
        password: &str,
        requested_scope: Option<&str>,
    ) -> Result<TokenResponse, OAuthError> {
        let user = self
            .store
            .authenticate_user(username, password)
            .await
            .map_err(|e| {
                OAuthError::invalid_grant("user credentials were rejected").with_source(e)
            })?;

        // A request may narrow the user's maximal scope but never widen it.
        let granted_scope = match requested_scope {
            Some(requested) => {
                if !scope_included(requested, &user.scope, self.config.super_scope.as_deref()) {
                    return Err(OAuthError::invalid_scope(
                        "requested scope exceeds the user's entitlement",
                    ));
                }
                requested.to_string()
            }
            None => user.scope.clone(),
        };

        let expires = Utc::now() + Duration::seconds(self.config.access_token_lifetime as i64);
        let access = self
            .store
            .create_access_token(expires, &granted_scope, &user.user_id)
            .await
            .map_err(|e| {
                OAuthError::invalid_token("failed to store the new access token").with_source(e)
            })?;

        let refresh_token = if self.config.issue_refresh_token {
            let expires =
                Utc::now() + Duration::seconds(self.config.refresh_token_lifetime as i64);
            let refresh = self
                .store
                .create_refresh_token(&access.token, expires, &user.user_id)
                .await
                .map_err(|e| {
                    OAuthError::invalid_token("failed to store the new refresh token")
                        .with_source(e)
                })?;
            Some(refresh.token)
        } else {
            None
        };

        Ok(bearer_response(
            &access,
            self.config.access_token_lifetime,
            refresh_token,
        ))
    }
}

/// Refresh token flow with rotation: a valid refresh token buys a fresh
/// access/refresh pair carrying the original scope and user forward.
pub struct RefreshTokenFlow<S: OAuthStore> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: OAuthStore> RefreshTokenFlow<S> {
    /// Constructs a new refresh flow over the given store.
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        RefreshTokenFlow { store, config }
    }

    /// Executes the refresh exchange. The superseded access token is
    /// revoked only after the replacement pair exists, so an earlier
    /// failure never destroys a still-valid credential pair.
    #[instrument(skip_all, level = "debug")]
    pub async fn execute(&self, refresh_token: &str) -> Result<TokenResponse, OAuthError> {
        let refresh = self
            .store
            .get_refresh_token(refresh_token)
            .await
            .map_err(|e| {
                OAuthError::invalid_token("failed to look up the refresh token").with_source(e)
            })?
            .ok_or_else(|| OAuthError::invalid_token("unknown refresh token"))?;

        if Utc::now() > refresh.expires {
            return Err(OAuthError::invalid_token("expired refresh token"));
        }

        // The old access token is read only to recover scope and user; its
        // own expiry is irrelevant, a refresh is requested precisely
        // because it is stale.
        let old_access = self
            .store
            .get_access_token(&refresh.access_token)
            .await
            .map_err(|e| {
                OAuthError::invalid_token("failed to look up the refreshed access token")
                    .with_source(e)
            })?
            .ok_or_else(|| {
                OAuthError::invalid_token("refresh token references a missing access token")
            })?;

        let expires = Utc::now() + Duration::seconds(self.config.access_token_lifetime as i64);
        let access = self
            .store
            .create_access_token(expires, &old_access.scope, &old_access.user_id)
            .await
            .map_err(|e| {
                OAuthError::invalid_token("failed to store the new access token").with_source(e)
            })?;

        let new_refresh = if self.config.issue_refresh_token {
            let expires =
                Utc::now() + Duration::seconds(self.config.refresh_token_lifetime as i64);
            let refresh = self
                .store
                .create_refresh_token(&access.token, expires, &old_access.user_id)
                .await
                .map_err(|e| {
                    OAuthError::invalid_token("failed to store the new refresh token")
                        .with_source(e)
                })?;
            Some(refresh.token)
        } else {
            None
        };

        self.store
            .revoke_access_token(&refresh.access_token)
            .await
            .map_err(|e| {
                OAuthError::invalid_token("failed to revoke the superseded access token")
                    .with_source(e)
            })?;

        Ok(bearer_response(
            &access,
            self.config.access_token_lifetime,
            new_refresh,
        ))
    }
}
