use anyhow::anyhow;
use crystaltides_auth::AuthenticatedPrincipal;
use crystaltides_core::{AppError, PaginationMeta};
use crystaltides_db::{Condition, Database, Direction, SelectQuery};
use crystaltides_models::suggestions::{NewSuggestion, SuggestionListParams, TABLE};
use crystaltides_models::{CreateSuggestionDto, Suggestion, SuggestionStatus};
use serde_json::json;
use tracing::{info, instrument};

use crate::modules::logs::service::LogService;

const DEFAULT_LIMIT: i64 = 20;

pub struct SuggestionService;

impl SuggestionService {
    #[instrument(skip(db, dto), fields(kind = %dto.kind))]
    pub async fn create(db: &Database, dto: CreateSuggestionDto) -> Result<Suggestion, AppError> {
        let row = NewSuggestion {
            nickname: dto.nickname.trim(),
            kind: dto.kind.trim(),
            content: dto.content.trim(),
            status: SuggestionStatus::Pending,
        };
        let suggestion: Suggestion = db.insert(TABLE, &row).await?;
        info!(suggestion_id = suggestion.id, "Suggestion received");
        Ok(suggestion)
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &Database,
        params: &SuggestionListParams,
    ) -> Result<(Vec<Suggestion>, PaginationMeta), AppError> {
        let page = params.pagination.resolve(DEFAULT_LIMIT);
        let query = SelectQuery::new()
            .filter_opt(params.status.map(|s| Condition::eq("status", s.as_str())))
            .filter_opt(
                params
                    .pagination
                    .search()
                    .map(|term| Condition::search(&["nickname", "content"], term)),
            )
            .order_by("created_at", Direction::Desc)
            .range(page.offset(), page.limit);

        let (rows, total) = db.list_or_empty(TABLE, &query).await?;
        Ok((rows, page.meta(total)))
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn update_status(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
        status: SuggestionStatus,
    ) -> Result<Suggestion, AppError> {
        let suggestion: Suggestion = db
            .update_by_id(TABLE, id, &json!({ "status": status }))
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Suggestion not found")))?;
        LogService::record_action(
            db,
            principal,
            "UPDATE_SUGGESTION",
            format!("Suggestion ID: {id}, status: {}", status.as_str()),
        )
        .await;
        Ok(suggestion)
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn delete(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
    ) -> Result<(), AppError> {
        if !db.delete_by_id(TABLE, id).await? {
            return Err(AppError::not_found(anyhow!("Suggestion not found")));
        }
        let details = format!("Suggestion ID: {id}");
        LogService::record_action(db, principal, "DELETE_SUGGESTION", details).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn moderator() -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            id: Uuid::from_u128(5),
            email: None,
            username: "Mod".to_string(),
            role: "mod".to_string(),
            minecraft_uuid: None,
        }
    }

    fn suggestion(nickname: &str) -> CreateSuggestionDto {
        serde_json::from_value(json!({
            "nickname": nickname,
            "type": "feature",
            "content": "Add a public market to spawn",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_new_suggestions_are_pending() {
        let db = Database::memory();
        let created = SuggestionService::create(&db, suggestion("Steve")).await.unwrap();
        assert_eq!(created.status, SuggestionStatus::Pending);
        assert_eq!(created.kind, "feature");
    }

    #[tokio::test]
    async fn test_status_update_and_filter() {
        let db = Database::memory();
        let a = SuggestionService::create(&db, suggestion("Steve")).await.unwrap();
        SuggestionService::create(&db, suggestion("Alex")).await.unwrap();

        let approved = SuggestionStatus::Approved;
        let updated = SuggestionService::update_status(&db, &moderator(), a.id, approved)
            .await
            .unwrap();
        assert_eq!(updated.status, SuggestionStatus::Approved);

        let params: SuggestionListParams =
            serde_json::from_value(json!({ "status": "approved" })).unwrap();
        let (rows, meta) = SuggestionService::list(&db, &params).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].nickname, "Steve");
        assert_eq!(meta.total, 1);
    }

    #[tokio::test]
    async fn test_unknown_suggestion() {
        let db = Database::memory();
        let err = SuggestionService::update_status(&db, &moderator(), 3, SuggestionStatus::Rejected)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let err = SuggestionService::delete(&db, &moderator(), 3).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
