//! Admin step-up tokens.
//!
//! After a staff member passes a TOTP check, the API mints a short-lived
//! HS256 token (`sub`, `role`, `verified`) signed with `ADMIN_JWT_SECRET`.
//! Admin routes require it in the `x-admin-token` header for accounts with
//! two-factor enabled.

use chrono::Utc;
use crystaltides_config::AuthConfig;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::AuthError;
use crate::claims::AdminTokenClaims;

pub fn create_admin_token(
    user_id: Uuid,
    role: &str,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    if !config.admin_tokens_enabled() {
        return Err(AuthError::NotConfigured);
    }

    let now = Utc::now().timestamp() as usize;
    let claims = AdminTokenClaims {
        sub: user_id.to_string(),
        role: role.to_string(),
        verified: true,
        iat: now,
        exp: now + config.admin_token_expiry.max(1) as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.admin_token_secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Verifies a step-up token and checks that it belongs to `user_id`.
pub fn verify_admin_token(
    token: &str,
    user_id: Uuid,
    config: &AuthConfig,
) -> Result<AdminTokenClaims, AuthError> {
    if !config.admin_tokens_enabled() {
        return Err(AuthError::NotConfigured);
    }

    let claims = decode::<AdminTokenClaims>(
        token,
        &DecodingKey::from_secret(config.admin_token_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?
    .claims;

    if claims.sub != user_id.to_string() || !claims.verified {
        return Err(AuthError::InvalidToken(
            "admin token does not belong to this user".to_string(),
        ));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::with_secrets("supabase", "admin-secret")
    }

    #[test]
    fn test_round_trip() {
        let user = Uuid::from_u128(9);
        let token = create_admin_token(user, "admin", &config()).unwrap();
        let claims = verify_admin_token(&token, user, &config()).unwrap();
        assert_eq!(claims.role, "admin");
        assert!(claims.verified);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_other_user_rejected() {
        let token = create_admin_token(Uuid::from_u128(9), "admin", &config()).unwrap();
        assert!(verify_admin_token(&token, Uuid::from_u128(10), &config()).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_admin_token(Uuid::from_u128(9), "admin", &config()).unwrap();
        let other = AuthConfig::with_secrets("supabase", "different");
        assert!(verify_admin_token(&token, Uuid::from_u128(9), &other).is_err());
    }

    #[test]
    fn test_disabled_without_secret() {
        let disabled = AuthConfig::with_secrets("supabase", "");
        assert!(matches!(
            create_admin_token(Uuid::from_u128(1), "admin", &disabled),
            Err(AuthError::NotConfigured)
        ));
    }
}
