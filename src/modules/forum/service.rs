use anyhow::anyhow;
use chrono::Utc;
use crystaltides_auth::AuthenticatedPrincipal;
use crystaltides_core::slug::slugify_unique;
use crystaltides_core::{AppError, PaginationMeta, PaginationParams};
use crystaltides_db::{Condition, Database, Direction, SelectQuery};
use crystaltides_models::forum::{
    NewPost, NewThread, POSTS_TABLE, THREADS_TABLE, ThreadDetail, ThreadPollDto,
};
use crystaltides_models::polls::PollOptionInput;
use crystaltides_models::users::TABLE as PROFILES_TABLE;
use crystaltides_models::{
    CreatePollDto, CreatePostDto, CreateThreadDto, ForumPost, ForumThread, Profile, Touched,
    UpdatePostDto, UpdateThreadDto,
};
use serde_json::json;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::metrics::track_thread_created;
use crate::modules::logs::service::LogService;
use crate::modules::polls::service::PollService;
use crate::state::AppState;

pub const DEFAULT_LIMIT: i64 = 20;

const POLL_TITLE_SUFFIX: &str = " - Encuesta";
const EXTERNAL_POLL_QUESTION: &str = "Encuesta externa";

pub struct ForumService;

impl ForumService {
    async fn author_avatar(db: &Database, user_id: Uuid) -> Option<String> {
        match db
            .find::<Profile>(PROFILES_TABLE, vec![Condition::eq("id", user_id.to_string())])
            .await
        {
            Ok(profile) => profile.and_then(|p| p.avatar_url),
            Err(e) => {
                tracing::debug!(error = %e, %user_id, "Could not load author avatar");
                None
            }
        }
    }

    async fn thread(db: &Database, id: i64) -> Result<ForumThread, AppError> {
        db.find_by_id(THREADS_TABLE, id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Thread not found")))
    }

    /// Threads of a category, pinned first and then newest first.
    #[instrument(skip(db))]
    pub async fn list_threads(
        db: &Database,
        category_id: i64,
        params: &PaginationParams,
    ) -> Result<(Vec<ForumThread>, PaginationMeta), AppError> {
        let page = params.resolve(DEFAULT_LIMIT);
        let query = SelectQuery::new()
            .filter(Condition::eq("category_id", category_id))
            .filter_opt(params.search().map(|term| Condition::search(&["title"], term)))
            .order_by("pinned", Direction::Desc)
            .order_by("created_at", Direction::Desc)
            .range(page.offset(), page.limit);

        let (threads, total) = db.list_or_empty(THREADS_TABLE, &query).await?;
        Ok((threads, page.meta(total)))
    }

    #[instrument(skip(db))]
    pub async fn user_threads(db: &Database, user_id: Uuid) -> Result<Vec<ForumThread>, AppError> {
        let query = SelectQuery::new()
            .filter(Condition::eq("user_id", user_id.to_string()))
            .order_by("created_at", Direction::Desc);
        let (threads, _) = db.list_or_empty(THREADS_TABLE, &query).await?;
        Ok(threads)
    }

    /// Looks a thread up by numeric id or by slug, with its poll attached.
    #[instrument(skip(db))]
    pub async fn get_thread(db: &Database, id_or_slug: &str) -> Result<ThreadDetail, AppError> {
        let filter = match id_or_slug.parse::<i64>() {
            Ok(id) if id_or_slug.bytes().all(|b| b.is_ascii_digit()) => Condition::eq("id", id),
            _ => Condition::eq("slug", id_or_slug),
        };
        let thread: ForumThread = db
            .find(THREADS_TABLE, vec![filter])
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Thread not found")))?;

        let poll = match thread.poll_id {
            Some(poll_id) => match PollService::get(db, poll_id).await {
                Ok(poll) => Some(serde_json::to_value(poll).map_err(AppError::internal)?),
                Err(e) => {
                    tracing::warn!(error = %e.error, poll_id, "Thread poll could not be loaded");
                    None
                }
            },
            None => None,
        };

        Ok(ThreadDetail { thread, poll })
    }

    #[instrument(skip(db))]
    pub async fn posts(db: &Database, thread_id: i64) -> Result<Vec<ForumPost>, AppError> {
        let query = SelectQuery::new()
            .filter(Condition::eq("thread_id", thread_id))
            .order_by("created_at", Direction::Asc)
            .order_by("id", Direction::Asc);
        let (posts, _) = db.list_or_empty(POSTS_TABLE, &query).await?;
        Ok(posts)
    }

    fn thread_poll(thread: &ForumThread, poll: &ThreadPollDto) -> CreatePollDto {
        CreatePollDto {
            title: format!("{}{POLL_TITLE_SUFFIX}", thread.title),
            title_en: None,
            question: poll
                .question
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .unwrap_or(EXTERNAL_POLL_QUESTION)
                .to_string(),
            question_en: None,
            options: poll
                .options
                .iter()
                .filter(|o| !o.trim().is_empty())
                .map(|o| PollOptionInput::Label(o.clone()))
                .collect(),
            closes_at: poll.closes_at,
            thread_id: Some(thread.id),
            discord_link: poll.discord_link.clone(),
        }
    }

    /// Creates a thread, its optional poll, and announces it on Discord.
    #[instrument(
        skip(state, principal, dto),
        fields(user_id = %principal.id, category_id = dto.category_id)
    )]
    pub async fn create_thread(
        state: &AppState,
        principal: &AuthenticatedPrincipal,
        dto: CreateThreadDto,
    ) -> Result<ForumThread, AppError> {
        let db = &state.db;
        let avatar = Self::author_avatar(db, principal.id).await;
        let title = dto.title.trim();

        let row = NewThread {
            category_id: dto.category_id,
            user_id: principal.id,
            author_name: &principal.username,
            author_avatar: avatar.as_deref(),
            author_role: &principal.role,
            title,
            content: &dto.content,
            slug: slugify_unique(title, Utc::now().timestamp()),
            views: 0,
            pinned: false,
        };
        let mut thread: ForumThread = db.insert(THREADS_TABLE, &row).await?;

        if let Some(poll) = dto.poll.as_ref().filter(|p| p.enabled) {
            let poll_dto = Self::thread_poll(&thread, poll);
            let created = PollService::create(db, &state.translator, &poll_dto).await?;
            if let Some(updated) = db
                .update_by_id::<ForumThread, _>(
                    THREADS_TABLE,
                    thread.id,
                    &json!({ "poll_id": created.poll.id }),
                )
                .await?
            {
                thread = updated;
            }
        }

        info!(thread_id = thread.id, slug = ?thread.slug, "Thread created");
        track_thread_created(thread.category_id);
        state.discord.notify_new_thread(&thread);
        Ok(thread)
    }

    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn create_post(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        thread_id: i64,
        dto: CreatePostDto,
    ) -> Result<ForumPost, AppError> {
        Self::thread(db, thread_id).await?;
        let avatar = Self::author_avatar(db, principal.id).await;

        let row = NewPost {
            thread_id,
            user_id: principal.id,
            author_name: &principal.username,
            author_avatar: avatar.as_deref(),
            author_role: &principal.role,
            content: dto.content.trim(),
        };
        Ok(db.insert(POSTS_TABLE, &row).await?)
    }

    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn update_thread(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
        dto: UpdateThreadDto,
    ) -> Result<ForumThread, AppError> {
        let thread: ForumThread = db
            .update_by_id(THREADS_TABLE, id, &Touched::now(&dto))
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Thread not found")))?;
        LogService::record_action(db, principal, "UPDATE_THREAD", format!("Thread ID: {id}")).await;
        Ok(thread)
    }

    /// Deletes a thread with its posts and poll.
    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn delete_thread(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
    ) -> Result<(), AppError> {
        let thread = Self::thread(db, id).await?;

        if let Some(poll_id) = thread.poll_id {
            if let Err(e) = PollService::delete(db, None, poll_id).await {
                error!(error = %e.error, poll_id, "Failed to delete thread poll");
            }
        }
        db.delete(POSTS_TABLE, vec![Condition::eq("thread_id", id)]).await?;
        db.delete_by_id(THREADS_TABLE, id).await?;

        LogService::record_action(
            db,
            principal,
            "DELETE_THREAD",
            format!("Thread: {} (ID: {id})", thread.title),
        )
        .await;
        Ok(())
    }

    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn update_post(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
        dto: UpdatePostDto,
    ) -> Result<ForumPost, AppError> {
        let post: ForumPost = db
            .update_by_id(POSTS_TABLE, id, &Touched::now(&dto))
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Post not found")))?;
        LogService::record_action(db, principal, "UPDATE_POST", format!("Post ID: {id}")).await;
        Ok(post)
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn delete_post(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
    ) -> Result<(), AppError> {
        if !db.delete_by_id(POSTS_TABLE, id).await? {
            return Err(AppError::not_found(anyhow!("Post not found")));
        }
        LogService::record_action(db, principal, "DELETE_POST", format!("Post ID: {id}")).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use crystaltides_config::AuthConfig;
    use crystaltides_db::MemoryStore;
    use crystaltides_models::polls::POLLS_TABLE;

    fn member() -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            id: Uuid::from_u128(11),
            email: None,
            username: "Steve".to_string(),
            role: "user".to_string(),
            minecraft_uuid: None,
        }
    }

    fn state(db: Database) -> AppState {
        AppState::new(db, AuthConfig::with_secrets("jwt", "admin"))
    }

    fn thread_dto(title: &str, poll: Option<serde_json::Value>) -> CreateThreadDto {
        serde_json::from_value(json!({
            "category_id": 2,
            "title": title,
            "content": "Content long enough to pass",
            "poll": poll,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_thread_and_lookup_by_slug_or_id() {
        let state = state(Database::memory());
        let dto = thread_dto("Ideas de eventos", None);
        let thread = ForumService::create_thread(&state, &member(), dto).await.unwrap();
        let slug = thread.slug.clone().unwrap();
        assert!(slug.starts_with("ideas-de-eventos-"));
        assert_eq!(thread.author_name, "Steve");

        let by_slug = ForumService::get_thread(&state.db, &slug).await.unwrap();
        assert_eq!(by_slug.thread.id, thread.id);
        assert!(by_slug.poll.is_none());

        let by_id = ForumService::get_thread(&state.db, &thread.id.to_string()).await.unwrap();
        assert_eq!(by_id.thread.slug.as_deref(), Some(slug.as_str()));
    }

    #[tokio::test]
    async fn test_thread_poll_is_linked() {
        let state = state(Database::memory());
        let poll = json!({ "enabled": true, "options": ["Sí", "No"] });
        let dto = thread_dto("Nueva temporada", Some(poll));
        let thread = ForumService::create_thread(&state, &member(), dto).await.unwrap();
        assert!(thread.poll_id.is_some());

        let detail = ForumService::get_thread(&state.db, &thread.id.to_string()).await.unwrap();
        let poll = detail.poll.unwrap();
        assert_eq!(poll["title"], "Nueva temporada - Encuesta");
        assert_eq!(poll["question"], "Encuesta externa");
        assert_eq!(poll["thread_id"], thread.id);
        assert_eq!(poll["options"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_listing_pins_first_and_paginates() {
        let state = state(Database::memory());
        let mut ids = Vec::new();
        for title in ["Primer hilo", "Segundo hilo", "Tercer hilo"] {
            let t = ForumService::create_thread(&state, &member(), thread_dto(title, None))
                .await
                .unwrap();
            ids.push(t.id);
        }
        let pin: UpdateThreadDto = serde_json::from_value(json!({ "pinned": true })).unwrap();
        ForumService::update_thread(&state.db, &member(), ids[0], pin).await.unwrap();

        let params: PaginationParams = serde_json::from_value(json!({ "limit": 2 })).unwrap();
        let (threads, meta) = ForumService::list_threads(&state.db, 2, &params).await.unwrap();
        assert_eq!(threads[0].id, ids[0]);
        assert_eq!(threads.len(), 2);
        assert_eq!(meta.total, 3);
        assert_eq!(meta.total_pages, 2);

        let params: PaginationParams =
            serde_json::from_value(json!({ "search": "segundo" })).unwrap();
        let (threads, _) = ForumService::list_threads(&state.db, 2, &params).await.unwrap();
        assert_eq!(threads.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_threads_table_lists_empty_page() {
        let db = Database::new(Arc::new(MemoryStore::new().without_table(THREADS_TABLE)));
        let (threads, meta) = ForumService::list_threads(&db, 2, &PaginationParams::default())
            .await
            .unwrap();
        assert!(threads.is_empty());
        assert_eq!(meta.total, 0);
    }

    #[tokio::test]
    async fn test_posts_and_cascading_delete() {
        let state = state(Database::memory());
        let poll = json!({ "enabled": true, "options": ["A", "B"] });
        let dto = thread_dto("Hilo con todo", Some(poll));
        let thread = ForumService::create_thread(&state, &member(), dto).await.unwrap();

        for content in ["primero", "segundo"] {
            let dto = CreatePostDto {
                content: content.to_string(),
            };
            ForumService::create_post(&state.db, &member(), thread.id, dto).await.unwrap();
        }
        let posts = ForumService::posts(&state.db, thread.id).await.unwrap();
        assert_eq!(posts[0].content, "primero");

        ForumService::delete_thread(&state.db, &member(), thread.id).await.unwrap();
        assert!(ForumService::posts(&state.db, thread.id).await.unwrap().is_empty());
        assert_eq!(state.db.count(POLLS_TABLE, vec![]).await.unwrap(), 0);

        let err = ForumService::create_post(
            &state.db,
            &member(),
            thread.id,
            CreatePostDto {
                content: "tarde".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
