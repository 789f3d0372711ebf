//! OAuth2 core primitives: tokens, users, grant requests and errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use tracing::warn;

/// Opaque resource-owner identifier, either textual or numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    /// String identifier.
    Text(String),
    /// Numeric identifier.
    Number(i64),
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId::Text(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId::Text(id)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId::Number(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Text(s) => f.write_str(s),
            UserId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A stored bearer access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Opaque token value, unique within the store.
    pub token: String,
    /// Space-delimited permissions granted to this token.
    pub scope: String,
    /// Owner of the token.
    pub user_id: UserId,
    /// Instant after which the token is no longer valid.
    pub expires: DateTime<Utc>,
}

/// A stored refresh token, bound to the access token it can replace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Opaque token value, unique within the store.
    pub token: String,
    /// Value of the access token this refresh token is bound to.
    pub access_token: String,
    /// Owner of the token.
    pub user_id: UserId,
    /// Instant after which the token can no longer be exchanged.
    pub expires: DateTime<Utc>,
}

/// An authenticated resource owner with their maximal scope.
///
/// Produced transiently by [`OAuthStore::authenticate_user`]; the engine
/// never persists it.
///
/// [`OAuthStore::authenticate_user`]: super::provider::OAuthStore::authenticate_user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier.
    pub user_id: UserId,
    /// Space-delimited set of every permission the user may be granted.
    pub scope: String,
}

/// Token request forms, tagged by `grant_type`.
///
/// The engine only issues tokens for the `password` and `refresh_token`
/// grants; the other variants exist so a dispatcher can recognize them and
/// reject with `unsupported_grant_type` instead of a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum GrantRequest {
    /// Resource Owner Password Credentials grant.
    Password {
        /// The resource owner's username.
        username: String,
        /// The resource owner's password.
        password: String,
        /// Requested scope; may narrow but never widen the user's entitlement.
        #[serde(skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
    },
    /// Refresh token grant (with rotation).
    RefreshToken {
        /// The refresh token being exchanged for a new access token.
        refresh_token: String,
    },
    /// Authorization code grant (recognized, never issued here).
    AuthorizationCode {
        /// The authorization code received from an authorization server.
        code: String,
    },
    /// Client credentials grant (recognized, never issued here).
    ClientCredentials,
}

impl GrantRequest {
    /// The wire-level `grant_type` discriminant for this request.
    pub fn grant_type(&self) -> &'static str {
        match self {
            GrantRequest::Password { .. } => "password",
            GrantRequest::RefreshToken { .. } => "refresh_token",
            GrantRequest::AuthorizationCode { .. } => "authorization_code",
            GrantRequest::ClientCredentials => "client_credentials",
        }
    }
}

/// Successful token grant response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The newly minted access token value.
    pub access_token: String,
    /// Always `"Bearer"`.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Scope actually granted to the access token.
    pub scope: String,
    /// Refresh token, present only when refresh issuance is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Stable machine codes for the closed OAuth error set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthErrorKind {
    /// Resource-owner credential authentication failed.
    InvalidGrant,
    /// The request shape itself is malformed.
    InvalidRequest,
    /// Requested scope exceeds entitlement, or a token lacks a required scope.
    InvalidScope,
    /// Token missing, unknown, expired, or not revocable.
    InvalidToken,
    /// `grant_type` is not one this engine issues.
    UnsupportedGrantType,
    /// Any otherwise-unclassified failure.
    ServerError,
}

impl OAuthErrorKind {
    /// Stable snake_case error code crossing the trust boundary.
    pub fn code(self) -> &'static str {
        match self {
            OAuthErrorKind::InvalidGrant => "invalid_grant",
            OAuthErrorKind::InvalidRequest => "invalid_request",
            OAuthErrorKind::InvalidScope => "invalid_scope",
            OAuthErrorKind::InvalidToken => "invalid_token",
            OAuthErrorKind::UnsupportedGrantType => "unsupported_grant_type",
            OAuthErrorKind::ServerError => "server_error",
        }
    }

    /// Default HTTP-style status for this kind.
    pub fn default_status(self) -> u16 {
        match self {
            OAuthErrorKind::InvalidGrant => 401,
            OAuthErrorKind::InvalidRequest => 400,
            OAuthErrorKind::InvalidScope => 400,
            OAuthErrorKind::InvalidToken => 401,
            OAuthErrorKind::UnsupportedGrantType => 400,
            OAuthErrorKind::ServerError => 500,
        }
    }
}

/// A typed OAuth failure: discriminant kind, HTTP-style status, human
/// description and an optional wrapped cause.
///
/// The cause is reachable through [`std::error::Error::source`] for Rust
/// callers but never serialized into the wire shape.
#[derive(Debug)]
pub struct OAuthError {
    kind: OAuthErrorKind,
    status: u16,
    description: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl OAuthError {
    /// Builds an error of the given kind with its default status.
    pub fn new(kind: OAuthErrorKind, description: impl Into<String>) -> Self {
        OAuthError {
            kind,
            status: kind.default_status(),
            description: description.into(),
            source: None,
        }
    }

    /// Credential authentication failed.
    pub fn invalid_grant(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorKind::InvalidGrant, description)
    }

    /// Malformed request shape.
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorKind::InvalidRequest, description)
    }

    /// Scope not satisfiable.
    pub fn invalid_scope(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorKind::InvalidScope, description)
    }

    /// Token missing, unknown, expired, or not revocable.
    pub fn invalid_token(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorKind::InvalidToken, description)
    }

    /// `grant_type` not supported by this engine.
    pub fn unsupported_grant_type(grant_type: &str) -> Self {
        Self::new(
            OAuthErrorKind::UnsupportedGrantType,
            format!("unsupported grant type: {grant_type}"),
        )
    }

    /// Unclassified failure at a flow boundary.
    pub fn server_error(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorKind::ServerError, description)
    }

    /// Overrides the HTTP-style status (e.g. 403 for an authorization-time
    /// scope failure).
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Attaches the underlying cause.
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Discriminant kind of this error.
    pub fn kind(&self) -> OAuthErrorKind {
        self.kind
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// HTTP-style status to map onto a response.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Human-readable description safe to cross the trust boundary.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Convert this OAuth error into its JSON wire shape with proper status.
    ///
    /// The wrapped cause is deliberately dropped here; only the code and
    /// description pair leaves the process.
    pub fn into_response(&self) -> ErrorResponse {
        warn!(
            error_code = self.code(),
            http_status = self.status,
            description = %self.description,
            "OAuth error occurred"
        );
        ErrorResponse {
            error: self.code().to_string(),
            error_description: self.description.clone(),
            status: self.status,
        }
    }
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.description)
    }
}

impl std::error::Error for OAuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

/// JSON error body sent to clients: `{error, error_description, status}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code.
    pub error: String,
    /// Human-readable description.
    pub error_description: String,
    /// HTTP-style status the transport should use.
    pub status: u16,
}

impl ErrorResponse {
    /// Build the JSON body for this error.
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.error,
            "error_description": self.error_description,
            "status": self.status,
        })
    }
}
