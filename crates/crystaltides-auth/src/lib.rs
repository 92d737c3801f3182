//! # CrystalTides Auth
//!
//! Identity for the CrystalTides API.
//!
//! - [`verifier`]: the [`IdentityVerifier`] seam and its HS256 implementation
//!   for access tokens issued by the auth provider
//! - [`principal`]: [`AuthenticatedPrincipal`], the identity attached to a request
//! - [`jwt`]: admin step-up tokens minted after a two-factor check
//! - [`totp`]: TOTP secrets, enrolment URLs and code checks
//!
//! # Example
//!
//! ```ignore
//! use crystaltides_auth::{IdentityVerifier, JwtIdentityVerifier};
//! use crystaltides_config::AuthConfig;
//!
//! let verifier = JwtIdentityVerifier::new(&AuthConfig::from_env());
//! let principal = verifier.verify(token).await?;
//! println!("{} has priority {}", principal.username, principal.priority());
//! ```

use anyhow::anyhow;
use axum::http::StatusCode;
use crystaltides_core::AppError;
use jsonwebtoken::errors::ErrorKind;

pub mod claims;
pub mod jwt;
pub mod principal;
pub mod totp;
pub mod verifier;

pub use claims::{AccessTokenClaims, AdminTokenClaims, AppMetadata, UserMetadata};
pub use jwt::{create_admin_token, verify_admin_token};
pub use principal::AuthenticatedPrincipal;
pub use totp::TotpEnrollment;
pub use verifier::{IdentityVerifier, JwtIdentityVerifier};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token subject is not a user id")]
    InvalidSubject,

    #[error("Authentication is not configured")]
    NotConfigured,

    #[error("TOTP error: {0}")]
    Totp(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(err.to_string()),
        }
    }
}

impl AuthError {
    /// Missing credentials are a 401; credentials that fail checks are a 403.
    pub fn into_app_error(self) -> AppError {
        match self {
            AuthError::MissingToken => AppError::unauthorized(self.to_string()),
            AuthError::Expired | AuthError::InvalidToken(_) | AuthError::InvalidSubject => {
                AppError::forbidden("Invalid or expired token")
            }
            AuthError::NotConfigured | AuthError::Totp(_) | AuthError::Signing(_) => {
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!(self.to_string()))
            }
        }
    }
}
