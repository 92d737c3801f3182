use anyhow::anyhow;
use crystaltides_auth::AuthenticatedPrincipal;
use crystaltides_core::AppError;
use crystaltides_db::{Database, Direction, SelectQuery};
use crystaltides_models::rules::TABLE;
use crystaltides_models::{CreateRuleDto, Rule, Touched, UpdateRuleDto};
use tracing::instrument;

use crate::modules::logs::service::LogService;

pub struct RuleService;

impl RuleService {
    /// All rules by `sort_order`. A missing table reads as no rules.
    #[instrument(skip(db))]
    pub async fn list(db: &Database) -> Result<Vec<Rule>, AppError> {
        let query = SelectQuery::new()
            .order_by("sort_order", Direction::Asc)
            .order_by("id", Direction::Asc);
        let (rules, _) = db.list_or_empty(TABLE, &query).await?;
        Ok(rules)
    }

    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn create(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        dto: CreateRuleDto,
    ) -> Result<Rule, AppError> {
        let rule: Rule = db.insert(TABLE, &dto).await?;
        LogService::record_action(db, principal, "CREATE_RULE", format!("Rule: {}", rule.title))
            .await;
        Ok(rule)
    }

    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn update(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
        dto: UpdateRuleDto,
    ) -> Result<Rule, AppError> {
        if dto.is_empty() {
            return Err(AppError::bad_request(anyhow!("No fields to update")));
        }

        let rule: Rule = db
            .update_by_id(TABLE, id, &Touched::now(&dto))
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Rule not found")))?;
        LogService::record_action(db, principal, "UPDATE_RULE", format!("Rule: {}", rule.title))
            .await;
        Ok(rule)
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn delete(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
    ) -> Result<(), AppError> {
        if !db.delete_by_id(TABLE, id).await? {
            return Err(AppError::not_found(anyhow!("Rule not found")));
        }
        LogService::record_action(db, principal, "DELETE_RULE", format!("Rule ID: {id}")).await;
        Ok(())
    }
}
