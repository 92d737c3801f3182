//! Two-factor (TOTP) enrolment records and requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const TABLE: &str = "user_two_factor";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoFactorRecord {
    pub user_id: Uuid,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TwoFactorStatus {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EnableTwoFactorDto {
    /// Current code from the authenticator app.
    #[serde(default)]
    #[validate(length(equal = 6, message = "token must be a 6-digit code"))]
    pub token: String,
    /// Base32 secret returned by setup.
    #[serde(default)]
    #[validate(length(min = 16, max = 128, message = "secret is required"))]
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyTwoFactorDto {
    #[serde(default)]
    #[validate(length(equal = 6, message = "token must be a 6-digit code"))]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminTokenResponse {
    #[serde(rename = "adminToken")]
    pub admin_token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}
