//! Audit log of staff and system actions.

use chrono::{DateTime, Utc};
use crystaltides_core::PaginationParams;
use crystaltides_core::serde::empty_string_as_none;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const TABLE: &str = "system_logs";

/// Default page size of the log listing.
pub const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    #[default]
    Web,
    Game,
    Security,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Web => "web",
            LogSource::Game => "game",
            LogSource::Security => "security",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLog {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub username: Option<String>,
    pub action: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub source: LogSource,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAuditLog {
    pub user_id: Option<Uuid>,
    pub username: String,
    pub action: String,
    pub details: Option<String>,
    pub source: LogSource,
}

impl NewAuditLog {
    pub fn web(
        user_id: Option<Uuid>,
        username: &str,
        action: &str,
        details: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            username: username.to_string(),
            action: action.to_string(),
            details: Some(details.into()),
            source: LogSource::Web,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLogDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "action is required"))]
    pub action: String,
    /// Free text, or any JSON value (stored as its JSON text).
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
    pub source: Option<LogSource>,
}

impl CreateLogDto {
    /// `details` as stored: strings verbatim, other values as JSON text.
    pub fn details_text(&self) -> Option<String> {
        match &self.details {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

fn source_filter(value: &str) -> Result<(), ValidationError> {
    match value {
        "all" | "web" | "game" | "security" => Ok(()),
        _ => {
            let mut err = ValidationError::new("source");
            err.message = Some("source must be one of all, web, game, security".into());
            Err(err)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogListParams {
    /// `web`, `game`, `security` or `all`.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(custom(function = "source_filter"))]
    pub source: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub pagination: PaginationParams,
}

impl LogListParams {
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| *s != "all")
    }
}

/// Client-reported security event (e.g. repeated failed admin access).
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SecurityAlertDto {
    #[serde(default, rename = "type")]
    #[validate(length(min = 1, max = 50, message = "type is required"))]
    pub kind: String,
    #[validate(length(max = 200))]
    pub path: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}
