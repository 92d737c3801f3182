//! TOTP enrolment and verification (RFC 6238, SHA-1, 6 digits, 30 s step).

use rand::RngCore;
use serde::Serialize;
use totp_rs::{Algorithm, Secret, TOTP};
use utoipa::ToSchema;

use crate::AuthError;

/// Data an authenticator app needs to enrol.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TotpEnrollment {
    /// Base32 secret for manual entry.
    pub secret: String,
    pub otpauth_url: String,
    /// PNG QR code, base64 encoded.
    pub qr_code_base64: String,
}

/// A fresh 160-bit secret, base32 encoded.
pub fn generate_secret() -> String {
    let mut bytes = vec![0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    Secret::Raw(bytes).to_encoded().to_string()
}

fn build(secret: &str, issuer: &str, account: &str) -> Result<TOTP, AuthError> {
    let bytes = Secret::Encoded(secret.to_string())
        .to_bytes()
        .map_err(|e| AuthError::Totp(format!("invalid secret: {e}")))?;

    // otpauth labels reserve ':' as the issuer separator
    let account = account.replace(':', "");

    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        bytes,
        Some(issuer.replace(':', "")),
        account,
    )
    .map_err(|e| AuthError::Totp(e.to_string()))
}

pub fn enrollment(secret: &str, issuer: &str, account: &str) -> Result<TotpEnrollment, AuthError> {
    let totp = build(secret, issuer, account)?;
    let qr_code_base64 = totp
        .get_qr_base64()
        .map_err(|e| AuthError::Totp(format!("failed to render QR code: {e}")))?;

    Ok(TotpEnrollment {
        secret: secret.to_string(),
        otpauth_url: totp.get_url(),
        qr_code_base64,
    })
}

/// Checks `code` against the current step, allowing one step of clock skew.
pub fn verify_code(secret: &str, code: &str) -> Result<bool, AuthError> {
    let code = code.trim();
    if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(false);
    }

    build(secret, "CrystalTides", "account")?
        .check_current(code)
        .map_err(|e| AuthError::Totp(e.to_string()))
}

/// The code an authenticator would show right now.
pub fn current_code(secret: &str) -> Result<String, AuthError> {
    build(secret, "CrystalTides", "account")?
        .generate_current()
        .map_err(|e| AuthError::Totp(e.to_string()))
}
