//! Machine translation requests.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

fn default_target() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TranslateDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "text must be between 1 and 5000 characters"))]
    pub text: String,
    /// Target language code, `en` by default.
    #[serde(default = "default_target")]
    #[validate(length(min = 2, max = 5))]
    pub target: String,
    #[validate(length(min = 2, max = 5))]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TranslationResult {
    pub text: String,
    pub target: String,
    /// `false` when the original text was returned unchanged.
    pub translated: bool,
}
