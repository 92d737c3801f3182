use anyhow::anyhow;
use crystaltides_auth::AuthenticatedPrincipal;
use crystaltides_core::{AppError, FieldError};
use crystaltides_core::slug::slugify;
use crystaltides_db::{Condition, Database, Direction, SelectQuery, StoreError};
use crystaltides_models::wiki::{NewWikiArticle, TABLE, WikiListParams};
use crystaltides_models::{CreateWikiArticleDto, Touched, UpdateWikiArticleDto, WikiArticle};
use tracing::instrument;

use crate::modules::logs::service::LogService;

pub struct WikiService;

fn slug_conflict(err: StoreError) -> AppError {
    if err.is_conflict() {
        AppError::conflict(anyhow!("An article with this slug already exists"))
    } else {
        err.into()
    }
}

impl WikiService {
    /// Articles, newest first, optionally restricted to one category.
    #[instrument(skip(db))]
    pub async fn list(
        db: &Database,
        params: &WikiListParams,
    ) -> Result<Vec<WikiArticle>, AppError> {
        let query = SelectQuery::new()
            .filter_opt(params.category.as_deref().map(|c| Condition::eq("category", c)))
            .order_by("created_at", Direction::Desc);
        let (articles, _) = db.list_or_empty(TABLE, &query).await?;
        Ok(articles)
    }

    #[instrument(skip(db))]
    pub async fn get_by_slug(db: &Database, slug: &str) -> Result<WikiArticle, AppError> {
        db.find(TABLE, vec![Condition::eq("slug", slug)])
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Article not found")))
    }

    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn create(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        dto: CreateWikiArticleDto,
    ) -> Result<WikiArticle, AppError> {
        let slug = match dto.slug.as_deref() {
            Some(slug) => slug.to_string(),
            None => slugify(&dto.title),
        };
        if slug.is_empty() {
            return Err(AppError::validation(vec![FieldError::new(
                "body.slug",
                "slug could not be derived from the title",
            )]));
        }

        let row = NewWikiArticle {
            slug,
            title: dto.title.trim(),
            content: &dto.content,
            category: &dto.category,
            author_id: principal.id,
        };
        let article: WikiArticle = db.insert(TABLE, &row).await.map_err(slug_conflict)?;

        let details = format!("Article: {}", article.slug);
        LogService::record_action(db, principal, "CREATE_WIKI", details).await;
        Ok(article)
    }

    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn update(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
        dto: UpdateWikiArticleDto,
    ) -> Result<WikiArticle, AppError> {
        let article: WikiArticle = db
            .update_by_id(TABLE, id, &Touched::now(&dto))
            .await
            .map_err(slug_conflict)?
            .ok_or_else(|| AppError::not_found(anyhow!("Article not found")))?;

        let details = format!("Article: {}", article.slug);
        LogService::record_action(db, principal, "UPDATE_WIKI", details).await;
        Ok(article)
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn delete(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
    ) -> Result<(), AppError> {
        if !db.delete_by_id(TABLE, id).await? {
            return Err(AppError::not_found(anyhow!("Article not found")));
        }
        LogService::record_action(db, principal, "DELETE_WIKI", format!("Article ID: {id}")).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    fn admin() -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            id: Uuid::from_u128(3),
            email: None,
            username: "Admin".to_string(),
            role: "admin".to_string(),
            minecraft_uuid: None,
        }
    }

    fn article(title: &str, category: &str) -> CreateWikiArticleDto {
        serde_json::from_value(json!({
            "title": title,
            "content": "Some content",
            "category": category,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_slug_generated_from_title() {
        let db = Database::memory();
        let created = WikiService::create(&db, &admin(), article("¿Cómo empezar?", "guias"))
            .await
            .unwrap();
        assert_eq!(created.slug, "como-empezar");
        assert_eq!(created.author_id, Some(admin().id));

        let found = WikiService::get_by_slug(&db, "como-empezar").await.unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_list_filters_category() {
        let db = Database::memory();
        WikiService::create(&db, &admin(), article("Economy basics", "economy")).await.unwrap();
        WikiService::create(&db, &admin(), article("Claims", "land")).await.unwrap();

        let params = WikiListParams {
            category: Some("land".to_string()),
        };
        let articles = WikiService::list(&db, &params).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].slug, "claims");
        assert_eq!(WikiService::list(&db, &WikiListParams::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown() {
        let db = Database::memory();
        let patch: UpdateWikiArticleDto =
            serde_json::from_value(json!({ "title": "Renamed" })).unwrap();
        let err = WikiService::update(&db, &admin(), 99, patch).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = WikiService::delete(&db, &admin(), 99).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
