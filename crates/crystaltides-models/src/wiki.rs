//! Wiki articles.

use chrono::{DateTime, Utc};
use crystaltides_core::serde::empty_string_as_none;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{not_blank, valid_slug};

pub const TABLE: &str = "wiki_articles";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WikiArticle {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateWikiArticleDto {
    #[serde(default)]
    #[validate(length(min = 3, max = 200), custom(function = "not_blank"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1), custom(function = "not_blank"))]
    pub content: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    pub category: String,
    /// Generated from the title when absent.
    #[validate(length(max = 200), custom(function = "valid_slug"))]
    pub slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewWikiArticle<'a> {
    pub slug: String,
    pub title: &'a str,
    pub content: &'a str,
    pub category: &'a str,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateWikiArticleDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 200), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200), custom(function = "valid_slug"))]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WikiListParams {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = 50))]
    pub category: Option<String>,
}
