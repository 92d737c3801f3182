//! Identity stage: turns a bearer token into an [`AuthenticatedPrincipal`].

use async_trait::async_trait;
use crystaltides_config::AuthConfig;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use crate::AuthError;
use crate::claims::AccessTokenClaims;
use crate::principal::AuthenticatedPrincipal;

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError>;
}

/// Verifies HS256 access tokens signed with the auth provider's project secret.
pub struct JwtIdentityVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.jwt_audience.as_str()]);

        Self {
            key: config
                .is_configured()
                .then(|| DecodingKey::from_secret(config.jwt_secret.as_bytes())),
            validation,
        }
    }

    pub fn decode_claims(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let key = self.key.as_ref().ok_or(AuthError::NotConfigured)?;
        decode::<AccessTokenClaims>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "access token rejected");
                AuthError::from(e)
            })
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError> {
        let claims = self.decode_claims(token)?;
        AuthenticatedPrincipal::from_claims(&claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{AppMetadata, UserMetadata};
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "test-supabase-secret";

    fn token(claims: &AccessTokenClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(exp: usize) -> AccessTokenClaims {
        AccessTokenClaims {
            sub: "00000000-0000-0000-0000-000000000042".to_string(),
            email: Some("alex@example.com".to_string()),
            role: Some("authenticated".to_string()),
            aud: Some("authenticated".to_string()),
            exp,
            iat: None,
            app_metadata: AppMetadata {
                role: Some("developer".to_string()),
                provider: None,
            },
            user_metadata: UserMetadata::default(),
        }
    }

    fn future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[tokio::test]
    async fn test_valid_token() {
        let verifier = JwtIdentityVerifier::new(&AuthConfig::with_secrets(SECRET, "admin"));
        let principal = verifier.verify(&token(&claims(future()), SECRET)).await.unwrap();
        assert_eq!(principal.role, "developer");
        assert_eq!(principal.username, "alex");
    }

    #[tokio::test]
    async fn test_wrong_secret() {
        let verifier = JwtIdentityVerifier::new(&AuthConfig::with_secrets(SECRET, "admin"));
        let err = verifier
            .verify(&token(&claims(future()), "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let verifier = JwtIdentityVerifier::new(&AuthConfig::with_secrets(SECRET, "admin"));
        let err = verifier.verify(&token(&claims(1000), SECRET)).await.unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[tokio::test]
    async fn test_wrong_audience() {
        let verifier = JwtIdentityVerifier::new(&AuthConfig::with_secrets(SECRET, "admin"));
        let mut c = claims(future());
        c.aud = Some("anon".to_string());
        assert!(verifier.verify(&token(&c, SECRET)).await.is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_secret_rejects() {
        let verifier = JwtIdentityVerifier::new(&AuthConfig::with_secrets("", "admin"));
        let err = verifier
            .verify(&token(&claims(future()), SECRET))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotConfigured));
    }
}
