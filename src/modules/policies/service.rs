use anyhow::anyhow;
use chrono::Utc;
use crystaltides_auth::AuthenticatedPrincipal;
use crystaltides_core::AppError;
use crystaltides_db::{Condition, Database, Direction, SelectQuery};
use crystaltides_models::policies::{PolicyRow, PolicySlug, TABLE};
use crystaltides_models::{Policy, UpsertPolicyDto};
use tracing::instrument;
use validator::Validate;

use crate::modules::logs::service::LogService;
use crate::validator::field_errors;

pub struct PolicyService;

impl PolicyService {
    fn check_slug(slug: &str) -> Result<(), AppError> {
        PolicySlug {
            slug: slug.to_string(),
        }
        .validate()
        .map_err(|e| AppError::validation(field_errors(&e, Some("params"))))
    }

    #[instrument(skip(db))]
    pub async fn list(db: &Database) -> Result<Vec<Policy>, AppError> {
        let query = SelectQuery::new().order_by("slug", Direction::Asc);
        let (policies, _) = db.list_or_empty(TABLE, &query).await?;
        Ok(policies)
    }

    #[instrument(skip(db))]
    pub async fn get(db: &Database, slug: &str) -> Result<Policy, AppError> {
        Self::check_slug(slug)?;
        db.find(TABLE, vec![Condition::eq("slug", slug)])
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Policy not found")))
    }

    /// Creates or replaces the policy stored under `slug`.
    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn upsert(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        slug: &str,
        dto: UpsertPolicyDto,
    ) -> Result<Policy, AppError> {
        Self::check_slug(slug)?;

        let row = PolicyRow {
            slug,
            title: dto.title.trim(),
            content: &dto.content,
            updated_by: principal.id,
            updated_at: Utc::now(),
        };
        let policy: Policy = db.upsert(TABLE, &row, "slug").await?;

        LogService::record_action(db, principal, "UPDATE_POLICY", format!("Policy: {slug}"))
            .await;
        Ok(policy)
    }
}
