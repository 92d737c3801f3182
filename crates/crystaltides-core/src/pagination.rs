//! Page-based pagination for list endpoints.
//!
//! List routes accept `?page=&limit=&search=` and report
//! `meta = { page, limit, total, totalPages }` next to the rows.
//!
//! `limit` defaults per resource (donations 20, polls 10, logs 50) and is
//! clamped to [1, 100]; `page` is 1-indexed.
//!
//! # Example
//!
//! ```ignore
//! let page = params.resolve(DEFAULT_LIMIT);
//! let query = query.range(page.offset(), page.limit);
//! let (rows, total) = db.list::<Donation>("donations", &query).await?;
//! Ok(ApiResponse::paginated(rows, page.meta(total)))
//! ```

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::serde::{deserialize_optional_i64, empty_string_as_none};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_PAGE: i64 = 1_000_000;

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[validate(range(min = 1, max = 1_000_000, message = "page must be between 1 and 1000000"))]
    pub page: Option<i64>,
    /// Items per page (1-100)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
    /// Free-text search term
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = 100, message = "search must be at most 100 characters"))]
    pub search: Option<String>,
}

impl PaginationParams {
    /// Resolves the requested page against a resource's default limit.
    #[must_use]
    pub fn resolve(&self, default_limit: i64) -> Page {
        Page {
            page: self.page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: self.limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT),
        }
    }

    /// The trimmed search term, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    #[must_use]
    pub fn meta(&self, total: i64) -> PaginationMeta {
        PaginationMeta::new(self.page, self.limit, total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    #[must_use]
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let limit = limit.max(1);
        let total = total.max(0);
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}
