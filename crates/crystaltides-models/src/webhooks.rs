//! Inbound webhook payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

/// Ko-fi posts `application/x-www-form-urlencoded` with the event as a JSON
/// string in `data`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct KofiForm {
    pub data: Option<String>,
}

/// Ko-fi sends amounts as strings ("3.00"); accept numbers too.
fn amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid amount: {other}"
        ))),
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct KofiPayload {
    #[serde(default)]
    pub verification_token: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl KofiPayload {
    /// Public unless Ko-fi says otherwise.
    pub fn is_public(&self) -> bool {
        self.is_public != Some(false)
    }
}

/// Event forwarded by the game-server bridge plugin.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct MinecraftEventDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "event is required"))]
    pub event: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 32, message = "player is required"))]
    pub player: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub details: String,
}
