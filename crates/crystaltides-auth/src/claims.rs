//! Claims carried by bearer tokens and admin step-up tokens.

use serde::{Deserialize, Serialize};

/// Claims of an access token issued by the auth provider (Supabase).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Provider-level role such as `authenticated`; not an application role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Server-controlled metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// User-editable metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minecraft_uuid: Option<String>,
}

/// Claims of a step-up token minted after a successful two-factor check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminTokenClaims {
    pub sub: String,
    pub role: String,
    pub verified: bool,
    pub iat: usize,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_claims_deserialize() {
        let json = r#"{"sub":"00000000-0000-0000-0000-000000000001","exp":9999999999}"#;
        let claims: AccessTokenClaims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.app_metadata, AppMetadata::default());
        assert!(claims.email.is_none());
    }

    #[test]
    fn test_metadata_deserialize() {
        let json = r#"{
            "sub": "00000000-0000-0000-0000-000000000001",
            "exp": 9999999999,
            "role": "authenticated",
            "app_metadata": { "role": "admin", "provider": "discord" },
            "user_metadata": { "full_name": "Steve", "avatar_url": "https://x" }
        }"#;
        let claims: AccessTokenClaims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.app_metadata.role.as_deref(), Some("admin"));
        assert_eq!(claims.user_metadata.full_name.as_deref(), Some("Steve"));
        assert_eq!(claims.role.as_deref(), Some("authenticated"));
    }
}
