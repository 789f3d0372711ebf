pub mod oauth_core;

pub use oauth_core::engine::{EngineConfig, OAuthEngine};
pub use oauth_core::grants::{PasswordFlow, RefreshTokenFlow};
pub use oauth_core::memory::{MemoryStore, MemoryUser};
pub use oauth_core::provider::OAuthStore;
pub use oauth_core::scope::scope_included;
pub use oauth_core::types::{
    AccessToken, ErrorResponse, GrantRequest, OAuthError, OAuthErrorKind, RefreshToken,
    TokenResponse, User, UserId,
};
