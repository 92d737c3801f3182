//! Player suggestions submitted from the public site.

use chrono::{DateTime, Utc};
use crystaltides_core::PaginationParams;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::validation::not_blank;

pub const TABLE: &str = "suggestions";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Implemented,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Approved => "approved",
            SuggestionStatus::Rejected => "rejected",
            SuggestionStatus::Implemented => "implemented",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Suggestion {
    pub id: i64,
    pub nickname: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    #[serde(default)]
    pub status: SuggestionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSuggestionDto {
    /// In-game name of the author.
    #[serde(default)]
    #[validate(length(min = 1, max = 32), custom(function = "not_blank"))]
    pub nickname: String,
    #[serde(default, rename = "type")]
    #[validate(length(min = 1, max = 30), custom(function = "not_blank"))]
    pub kind: String,
    #[serde(default)]
    #[validate(length(
        min = 10,
        max = 2000,
        message = "content must be between 10 and 2000 characters"
    ))]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct NewSuggestion<'a> {
    pub nickname: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub content: &'a str,
    pub status: SuggestionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSuggestionStatusDto {
    pub status: SuggestionStatus,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuggestionListParams {
    pub status: Option<SuggestionStatus>,
    #[serde(flatten)]
    #[validate(nested)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_values() {
        for status in ["pending", "approved", "rejected", "implemented"] {
            let dto: UpdateSuggestionStatusDto =
                serde_json::from_value(json!({ "status": status })).unwrap();
            assert_eq!(dto.status.as_str(), status);
        }
        let unknown = json!({ "status": "done" });
        assert!(serde_json::from_value::<UpdateSuggestionStatusDto>(unknown).is_err());
    }

    #[test]
    fn test_type_is_renamed() {
        let dto: CreateSuggestionDto = serde_json::from_value(json!({
            "nickname": "Steve",
            "type": "feature",
            "content": "Add a public market to spawn"
        }))
        .unwrap();
        assert_eq!(dto.kind, "feature");
        assert!(dto.validate().is_ok());
    }
}
