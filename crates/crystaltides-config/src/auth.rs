//! Bearer token and admin step-up token configuration.
//!
//! Bearer tokens are issued by the external auth provider (Supabase) and
//! signed with its HS256 project secret. Admin step-up tokens are minted by
//! this API after a successful two-factor check and signed with a separate
//! secret.

use crate::{env_opt, env_or};

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// `SUPABASE_JWT_SECRET`. Empty rejects every bearer token.
    pub jwt_secret: String,
    /// `SUPABASE_JWT_AUDIENCE`, `authenticated` unless set.
    pub jwt_audience: String,
    /// `ADMIN_JWT_SECRET`. Empty disables step-up tokens.
    pub admin_token_secret: String,
    /// Lifetime of admin step-up tokens in seconds.
    pub admin_token_expiry: i64,
    /// Issuer shown in authenticator apps.
    pub two_factor_issuer: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: env_opt("SUPABASE_JWT_SECRET").unwrap_or_default(),
            jwt_audience: env_opt("SUPABASE_JWT_AUDIENCE")
                .unwrap_or_else(|| "authenticated".to_string()),
            admin_token_secret: env_opt("ADMIN_JWT_SECRET").unwrap_or_default(),
            admin_token_expiry: env_or("ADMIN_TOKEN_EXPIRY", 3600),
            two_factor_issuer: env_opt("TWO_FACTOR_ISSUER")
                .unwrap_or_else(|| "CrystalTides".to_string()),
        }
    }

    /// Config with fixed secrets, for tests and tooling.
    pub fn with_secrets(
        jwt_secret: impl Into<String>,
        admin_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_audience: "authenticated".to_string(),
            admin_token_secret: admin_token_secret.into(),
            admin_token_expiry: 3600,
            two_factor_issuer: "CrystalTides".to_string(),
        }
    }
}

impl AuthConfig {
    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    pub fn admin_tokens_enabled(&self) -> bool {
        !self.admin_token_secret.is_empty()
    }
}
