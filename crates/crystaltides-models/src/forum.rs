//! Forum threads and posts.

use chrono::{DateTime, Utc};
use crystaltides_core::PaginationParams;
use crystaltides_core::serde::deserialize_optional_i64;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::validation::not_blank;

pub const THREADS_TABLE: &str = "forum_threads";
pub const POSTS_TABLE: &str = "forum_posts";

/// Characters of thread content included in Discord announcements.
pub const PREVIEW_LENGTH: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForumThread {
    pub id: i64,
    pub category_id: i64,
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: Option<String>,
    #[serde(default)]
    pub author_role: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub poll_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ForumThread {
    /// Content shortened for previews, with an ellipsis when cut.
    pub fn preview(&self) -> String {
        if self.content.chars().count() <= PREVIEW_LENGTH {
            return self.content.clone();
        }
        let mut preview: String = self.content.chars().take(PREVIEW_LENGTH).collect();
        preview.push_str("...");
        preview
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForumPost {
    pub id: i64,
    pub thread_id: i64,
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: Option<String>,
    #[serde(default)]
    pub author_role: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Optional poll attached to a new thread.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ThreadPollDto {
    #[serde(default)]
    pub enabled: bool,
    #[validate(length(max = 500))]
    pub question: Option<String>,
    #[serde(default)]
    #[validate(length(max = 10, message = "a poll takes at most 10 options"))]
    pub options: Vec<String>,
    pub closes_at: Option<DateTime<Utc>>,
    #[validate(url)]
    pub discord_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateThreadDto {
    #[serde(default)]
    #[validate(range(min = 1, message = "category_id is required"))]
    pub category_id: i64,
    #[serde(default)]
    #[validate(length(min = 5, max = 150, message = "title must be between 5 and 150 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 10, message = "content must be at least 10 characters"))]
    pub content: String,
    #[validate(nested)]
    pub poll: Option<ThreadPollDto>,
}

/// Row written when a thread is created.
#[derive(Debug, Serialize)]
pub struct NewThread<'a> {
    pub category_id: i64,
    pub user_id: Uuid,
    pub author_name: &'a str,
    pub author_avatar: Option<&'a str>,
    pub author_role: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub slug: String,
    pub views: i64,
    pub pinned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateThreadDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 5, max = 150, message = "title must be between 5 and 150 characters"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 10, message = "content must be at least 10 characters"))]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePostDto {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 5000, message = "content must be between 1 and 5000 characters"),
        custom(function = "not_blank")
    )]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct NewPost<'a> {
    pub thread_id: i64,
    pub user_id: Uuid,
    pub author_name: &'a str,
    pub author_avatar: Option<&'a str>,
    pub author_role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePostDto {
    #[validate(
        length(min = 1, max = 5000, message = "content must be between 1 and 5000 characters"),
        custom(function = "not_blank")
    )]
    pub content: String,
}

/// `{category_id}` path segment of the thread listing.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct CategoryPath {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[validate(required(message = "category_id must be a number"), range(min = 1))]
    pub category_id: Option<i64>,
}

/// Validated request for `GET /forum/categories/{category_id}/threads`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ListThreadsRequest {
    #[validate(nested)]
    pub params: CategoryPath,
    #[serde(default)]
    #[validate(nested)]
    pub query: PaginationParams,
}

/// Validated request for `POST /forum/threads`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateThreadRequest {
    #[validate(nested)]
    pub body: CreateThreadDto,
}

/// A thread with its poll, when it has one.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ThreadDetail {
    #[serde(flatten)]
    pub thread: ForumThread,
    #[schema(value_type = Option<Object>)]
    pub poll: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn thread_dto(title: &str, content: &str) -> CreateThreadDto {
        CreateThreadDto {
            category_id: 2,
            title: title.to_string(),
            content: content.to_string(),
            poll: None,
        }
    }

    #[test]
    fn test_create_thread_validation() {
        assert!(thread_dto("Server rules", "Please read before posting").validate().is_ok());

        let errors = thread_dto("Hey", "Please read before posting").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));

        let errors = thread_dto(&"x".repeat(151), "short").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("content"));
    }

    #[test]
    fn test_missing_fields_fail_validation_not_parsing() {
        let dto: CreateThreadDto = serde_json::from_value(json!({})).unwrap();
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("content"));
        assert!(fields.contains_key("category_id"));
    }

    #[test]
    fn test_post_content_bounds() {
        assert!(CreatePostDto { content: "gg".into() }.validate().is_ok());
        assert!(CreatePostDto { content: "".into() }.validate().is_err());
        assert!(CreatePostDto { content: "   ".into() }.validate().is_err());
        assert!(CreatePostDto { content: "x".repeat(5001) }.validate().is_err());
    }

    #[test]
    fn test_category_path_accepts_strings() {
        let path: CategoryPath = serde_json::from_value(json!({ "category_id": "3" })).unwrap();
        assert_eq!(path.category_id, Some(3));
        assert!(path.validate().is_ok());

        let path: CategoryPath = serde_json::from_value(json!({})).unwrap();
        assert!(path.validate().is_err());
    }

    #[test]
    fn test_preview_truncates() {
        let thread: ForumThread = serde_json::from_value(json!({
            "id": 1,
            "category_id": 2,
            "user_id": null,
            "title": "Long",
            "content": "a".repeat(250),
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        let preview = thread.preview();
        assert_eq!(preview.len(), PREVIEW_LENGTH + 3);
        assert!(preview.ends_with("..."));
        assert!(!thread.pinned);
    }
}
