//! Site policies (terms, privacy) keyed by slug.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{not_blank, valid_slug};

pub const TABLE: &str = "site_policies";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Policy {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub updated_by: Option<Uuid>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpsertPolicyDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1), custom(function = "not_blank"))]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct PolicyRow<'a> {
    pub slug: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub updated_by: Uuid,
    pub updated_at: DateTime<Utc>,
}

/// `{slug}` path segment of policy routes.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PolicySlug {
    #[validate(length(max = 100), custom(function = "valid_slug"))]
    pub slug: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_slug_checked() {
        let ok = PolicySlug { slug: "privacy-policy".into() };
        assert!(ok.validate().is_ok());

        let bad = PolicySlug { slug: "Privacy Policy".into() };
        assert!(bad.validate().unwrap_err().field_errors().contains_key("slug"));
    }
}
