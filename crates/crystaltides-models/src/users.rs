//! Profiles and the admin operations on them.

use chrono::{DateTime, Utc};
use crystaltides_core::PaginationParams;
use crystaltides_core::roles::RoleTier;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{not_blank, url_or_empty};

pub const TABLE: &str = "profiles";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub minecraft_uuid: Option<String>,
    #[serde(default)]
    pub minecraft_nick: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_preference: Option<String>,
    #[serde(default)]
    pub profile_banner_url: Option<String>,
    #[serde(default)]
    pub social_discord: Option<String>,
    #[serde(default)]
    pub social_twitter: Option<String>,
    #[serde(default)]
    pub social_twitch: Option<String>,
    #[serde(default)]
    pub social_youtube: Option<String>,
    #[serde(default)]
    pub social_kofi: Option<String>,
    #[serde(default)]
    pub public_stats: Option<bool>,
    /// Medals and achievements.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleDto {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 32, message = "Role is required"),
        custom(function = "not_blank")
    )]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserMetadataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medals: Option<Vec<i64>>,
    /// Achievement ids or names.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub achievements: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateMetadataDto {
    #[validate(nested)]
    pub metadata: UserMetadataPatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AvatarPreference {
    Minecraft,
    Discord,
}

/// Self-service profile edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 20, message = "username must be between 3 and 20 characters"))]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 16))]
    pub minecraft_nick: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "bio must be at most 500 characters"))]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_preference: Option<AvatarPreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "url_or_empty"))]
    pub profile_banner_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub social_discord: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "url_or_empty"))]
    pub social_twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "url_or_empty"))]
    pub social_twitch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "url_or_empty"))]
    pub social_youtube: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "url_or_empty"))]
    pub social_kofi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_stats: Option<bool>,
}

impl UpdateProfileDto {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.username.is_none()
            && self.minecraft_nick.is_none()
            && self.bio.is_none()
            && self.avatar_preference.is_none()
            && self.profile_banner_url.is_none()
            && self.social_discord.is_none()
            && self.social_twitter.is_none()
            && self.social_twitch.is_none()
            && self.social_youtube.is_none()
            && self.social_kofi.is_none()
            && self.public_stats.is_none()
    }
}

/// The caller as seen by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub username: String,
    pub role: String,
    pub minecraft_uuid: Option<String>,
    pub priority: u8,
    pub tier: RoleTier,
    pub is_admin: bool,
    pub is_staff: bool,
    pub two_factor_enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListParams {
    #[serde(flatten)]
    #[validate(nested)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_update_rules() {
        let dto: UpdateProfileDto = serde_json::from_value(json!({
            "username": "st",
            "bio": "x".repeat(501),
            "social_twitter": "not a url"
        }))
        .unwrap();
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("bio"));
        assert!(fields.contains_key("social_twitter"));
    }

    #[test]
    fn test_empty_url_clears_field() {
        let dto: UpdateProfileDto = serde_json::from_value(json!({
            "social_kofi": "",
            "avatar_preference": "discord"
        }))
        .unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&dto).unwrap(),
            json!({ "avatar_preference": "discord", "social_kofi": "" })
        );
    }

    #[test]
    fn test_avatar_preference_is_closed() {
        assert!(
            serde_json::from_value::<UpdateProfileDto>(json!({ "avatar_preference": "gravatar" }))
                .is_err()
        );
    }

    #[test]
    fn test_role_required() {
        let dto: UpdateRoleDto = serde_json::from_value(json!({})).unwrap();
        assert!(dto.validate().unwrap_err().field_errors().contains_key("role"));
    }
}
