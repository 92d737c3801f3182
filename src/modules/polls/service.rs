use std::collections::HashMap;

use anyhow::anyhow;
use chrono::Utc;
use crystaltides_auth::AuthenticatedPrincipal;
use crystaltides_core::{AppError, PaginationMeta, PaginationParams};
use crystaltides_db::{Condition, Database, Direction, SelectQuery};
use crystaltides_models::polls::{
    DEFAULT_LIMIT, NewPoll, NewPollOption, OPTIONS_TABLE, POLLS_TABLE, PollSummary, VoteResult,
};
use crystaltides_models::{CreatePollDto, Poll, PollOption, PollWithOptions};
use serde_json::json;
use tracing::{info, instrument};

use crate::modules::logs::service::LogService;
use crate::utils::translate::Translator;

/// Language the `_en` columns are translated into.
const SECONDARY_LANGUAGE: &str = "en";

pub struct PollService;

impl PollService {
    async fn options(db: &Database, poll_id: i64) -> Result<Vec<PollOption>, AppError> {
        let query = SelectQuery::new()
            .filter(Condition::eq("poll_id", poll_id))
            .order_by("id", Direction::Asc);
        let (options, _) = db.list_or_empty(OPTIONS_TABLE, &query).await?;
        Ok(options)
    }

    async fn find(db: &Database, id: i64) -> Result<Poll, AppError> {
        db.find_by_id(POLLS_TABLE, id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Poll not found")))
    }

    /// Polls newest first with their vote totals.
    #[instrument(skip(db))]
    pub async fn list(
        db: &Database,
        params: &PaginationParams,
    ) -> Result<(Vec<PollSummary>, PaginationMeta), AppError> {
        let page = params.resolve(DEFAULT_LIMIT);
        let query = SelectQuery::new()
            .order_by("created_at", Direction::Desc)
            .range(page.offset(), page.limit);
        let (polls, total) = db.list_or_empty::<Poll>(POLLS_TABLE, &query).await?;

        let mut totals: HashMap<i64, i64> = HashMap::new();
        if !polls.is_empty() {
            let options = SelectQuery::new()
                .filter(Condition::is_in("poll_id", polls.iter().map(|p| p.id)));
            let (options, _) = db.list_or_empty::<PollOption>(OPTIONS_TABLE, &options).await?;
            for option in options {
                *totals.entry(option.poll_id).or_default() += option.votes.max(0);
            }
        }

        let summaries = polls
            .into_iter()
            .map(|poll| PollSummary {
                total_votes: totals.get(&poll.id).copied().unwrap_or(0),
                poll,
            })
            .collect();
        Ok((summaries, page.meta(total)))
    }

    /// The newest active global poll, if any.
    #[instrument(skip(db))]
    pub async fn active(db: &Database) -> Result<Option<PollWithOptions>, AppError> {
        let query = SelectQuery::new()
            .filter(Condition::eq("is_active", true))
            .filter(Condition::is_null("thread_id"))
            .order_by("created_at", Direction::Desc)
            .limit(1);
        let (mut polls, _) = db.list_or_empty::<Poll>(POLLS_TABLE, &query).await?;

        match polls.pop() {
            Some(poll) => {
                let options = Self::options(db, poll.id).await?;
                Ok(Some(PollWithOptions::tally(poll, options)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(db))]
    pub async fn get(db: &Database, id: i64) -> Result<PollWithOptions, AppError> {
        let poll = Self::find(db, id).await?;
        let options = Self::options(db, id).await?;
        Ok(PollWithOptions::tally(poll, options))
    }

    /// Creates a poll and its options, translating missing `_en` texts.
    ///
    /// A global poll (no `thread_id`) deactivates every other global poll.
    #[instrument(skip(db, translator, dto), fields(title = %dto.title))]
    pub async fn create(
        db: &Database,
        translator: &Translator,
        dto: &CreatePollDto,
    ) -> Result<PollWithOptions, AppError> {
        if dto.thread_id.is_none() {
            db.update::<Poll, _>(
                POLLS_TABLE,
                vec![Condition::is_null("thread_id"), Condition::eq("is_active", true)],
                &json!({ "is_active": false }),
            )
            .await?;
        }

        let title_en = match dto.title_en.as_deref() {
            Some(text) => text.to_string(),
            None => translator.translate_or_original(&dto.title, SECONDARY_LANGUAGE).await,
        };
        let question_en = match dto.question_en.as_deref() {
            Some(text) => text.to_string(),
            None => translator.translate_or_original(&dto.question, SECONDARY_LANGUAGE).await,
        };

        let row = NewPoll {
            title: dto.title.trim(),
            title_en: Some(title_en),
            question: dto.question.trim(),
            question_en: Some(question_en),
            is_active: true,
            closes_at: dto.closes_at,
            thread_id: dto.thread_id,
            discord_link: dto.discord_link.as_deref(),
        };
        let poll: Poll = db.insert(POLLS_TABLE, &row).await?;

        let mut options = Vec::with_capacity(dto.options.len());
        for input in &dto.options {
            let label = input.label().trim();
            let label_en = match input.label_en() {
                Some(text) => text.to_string(),
                None => translator.translate_or_original(label, SECONDARY_LANGUAGE).await,
            };
            let option = NewPollOption {
                poll_id: poll.id,
                label,
                label_en: Some(label_en),
                votes: 0,
            };
            options.push(db.insert::<PollOption, _>(OPTIONS_TABLE, &option).await?);
        }

        info!(poll_id = poll.id, options = options.len(), "Poll created");
        Ok(PollWithOptions::tally(poll, options))
    }

    /// Admin creation with an audit entry.
    pub async fn create_audited(
        db: &Database,
        translator: &Translator,
        principal: &AuthenticatedPrincipal,
        dto: CreatePollDto,
    ) -> Result<PollWithOptions, AppError> {
        let created = Self::create(db, translator, &dto).await?;
        LogService::record_action(db, principal, "CREATE_POLL", format!("Poll: {}", dto.title))
            .await;
        Ok(created)
    }

    /// Counts one vote for `option_id`. Closed polls answer 409.
    #[instrument(skip(db))]
    pub async fn vote(db: &Database, poll_id: i64, option_id: i64) -> Result<VoteResult, AppError> {
        let poll = Self::find(db, poll_id).await?;
        if !poll.is_open_at(Utc::now()) {
            return Err(AppError::conflict(anyhow!("This poll is closed")));
        }

        let option: PollOption = db
            .find(
                OPTIONS_TABLE,
                vec![Condition::eq("id", option_id), Condition::eq("poll_id", poll_id)],
            )
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Option not found")))?;

        let votes = option.votes.max(0) + 1;
        db.update_by_id::<PollOption, _>(OPTIONS_TABLE, option_id, &json!({ "votes": votes }))
            .await?;

        Ok(VoteResult { option_id, votes })
    }

    /// Deletes the options, then the poll.
    #[instrument(skip(db, principal))]
    pub async fn delete(
        db: &Database,
        principal: Option<&AuthenticatedPrincipal>,
        id: i64,
    ) -> Result<(), AppError> {
        Self::find(db, id).await?;
        db.delete(OPTIONS_TABLE, vec![Condition::eq("poll_id", id)]).await?;
        db.delete_by_id(POLLS_TABLE, id).await?;

        if let Some(principal) = principal {
            LogService::record_action(db, principal, "DELETE_POLL", format!("Poll ID: {id}")).await;
        }
        Ok(())
    }
}
