use anyhow::anyhow;
use crystaltides_auth::AuthenticatedPrincipal;
use crystaltides_core::{AppError, PaginationMeta};
use crystaltides_db::{Condition, Database, Direction, SelectQuery};
use crystaltides_models::tickets::{
    MESSAGES_TABLE, NewTicket, NewTicketMessage, TICKETS_TABLE, TicketListParams,
};
use crystaltides_models::{
    CreateTicketDto, CreateTicketMessageDto, Ticket, TicketMessage, TicketPriority, TicketStats,
    TicketStatus,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::modules::logs::service::LogService;

const DEFAULT_LIMIT: i64 = 20;

pub struct TicketService;

impl TicketService {
    /// Loads a ticket the principal may see: its owner or any staff member.
    async fn accessible(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
    ) -> Result<Ticket, AppError> {
        let ticket: Ticket = db
            .find_by_id(TICKETS_TABLE, id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Ticket not found")))?;

        if ticket.user_id != principal.id && !principal.is_staff() {
            warn!(ticket_id = id, user_id = %principal.id, "Ticket access denied");
            return Err(AppError::forbidden("You do not have access to this ticket"));
        }
        Ok(ticket)
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &Database,
        params: &TicketListParams,
    ) -> Result<(Vec<Ticket>, PaginationMeta), AppError> {
        let page = params.pagination.resolve(DEFAULT_LIMIT);
        let query = SelectQuery::new()
            .filter_opt(params.status.map(|s| Condition::eq("status", s.as_str())))
            .filter_opt(
                params
                    .pagination
                    .search()
                    .map(|term| Condition::search(&["subject", "description"], term)),
            )
            .order_by("created_at", Direction::Desc)
            .range(page.offset(), page.limit);

        let (rows, total) = db.list_or_empty(TICKETS_TABLE, &query).await?;
        Ok((rows, page.meta(total)))
    }

    /// Counts per status, plus open high/urgent tickets.
    #[instrument(skip(db))]
    pub async fn stats(db: &Database) -> Result<TicketStats, AppError> {
        let mut stats = TicketStats::default();
        for status in TicketStatus::ALL {
            let count = db
                .count(TICKETS_TABLE, vec![Condition::eq("status", status.as_str())])
                .await?;
            stats.set(status, count);
        }

        stats.urgent = db
            .count(
                TICKETS_TABLE,
                vec![
                    Condition::is_in("priority", ["high", "urgent"]),
                    Condition::is_in(
                        "status",
                        [TicketStatus::Open.as_str(), TicketStatus::Pending.as_str()],
                    ),
                ],
            )
            .await?;
        Ok(stats)
    }

    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn create(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        dto: CreateTicketDto,
    ) -> Result<Ticket, AppError> {
        let row = NewTicket {
            user_id: principal.id,
            subject: dto.subject.trim(),
            description: dto.description.trim(),
            priority: dto.priority.unwrap_or(TicketPriority::Medium),
            status: TicketStatus::Open,
        };
        let ticket: Ticket = db.insert(TICKETS_TABLE, &row).await?;
        info!(ticket_id = ticket.id, priority = ?ticket.priority, "Ticket opened");
        Ok(ticket)
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn update_status(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
        status: TicketStatus,
    ) -> Result<Ticket, AppError> {
        Self::accessible(db, principal, id).await?;

        let ticket: Ticket = db
            .update_by_id(
                TICKETS_TABLE,
                id,
                &json!({ "status": status, "updated_at": chrono::Utc::now() }),
            )
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Ticket not found")))?;

        if principal.is_staff() {
            LogService::record_action(
                db,
                principal,
                "UPDATE_TICKET",
                format!("Ticket ID: {id}, status: {}", status.as_str()),
            )
            .await;
        }
        Ok(ticket)
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn messages(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        ticket_id: i64,
    ) -> Result<Vec<TicketMessage>, AppError> {
        Self::accessible(db, principal, ticket_id).await?;

        let query = SelectQuery::new()
            .filter(Condition::eq("ticket_id", ticket_id))
            .order_by("created_at", Direction::Asc)
            .order_by("id", Direction::Asc);
        let (rows, _) = db.list_or_empty(MESSAGES_TABLE, &query).await?;
        Ok(rows)
    }

    /// Adds a message; `is_staff` comes from the sender's role, never the body.
    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn add_message(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        ticket_id: i64,
        dto: CreateTicketMessageDto,
    ) -> Result<TicketMessage, AppError> {
        Self::accessible(db, principal, ticket_id).await?;

        let row = NewTicketMessage {
            ticket_id,
            user_id: principal.id,
            message: dto.message.trim(),
            is_staff: principal.is_staff(),
        };
        Ok(db.insert(MESSAGES_TABLE, &row).await?)
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn delete(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
    ) -> Result<(), AppError> {
        db.delete(MESSAGES_TABLE, vec![Condition::eq("ticket_id", id)]).await?;
        if !db.delete_by_id(TICKETS_TABLE, id).await? {
            return Err(AppError::not_found(anyhow!("Ticket not found")));
        }
        LogService::record_action(db, principal, "DELETE_TICKET", format!("Ticket ID: {id}")).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn principal(id: u128, role: &str) -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            id: Uuid::from_u128(id),
            email: None,
            username: format!("user{id}"),
            role: role.to_string(),
            minecraft_uuid: None,
        }
    }

    fn ticket(priority: &str) -> CreateTicketDto {
        serde_json::from_value(json!({
            "subject": "Lost items",
            "description": "My chest was emptied after the reset",
            "priority": priority,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_owner_and_staff_access() {
        let db = Database::memory();
        let owner = principal(1, "user");
        let stranger = principal(2, "user");
        let helper = principal(3, "helper");
        let created = TicketService::create(&db, &owner, ticket("low")).await.unwrap();

        let err = TicketService::messages(&db, &stranger, created.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let dto = |m: &str| CreateTicketMessageDto {
            message: m.to_string(),
        };
        let mine = TicketService::add_message(&db, &owner, created.id, dto("help")).await.unwrap();
        let theirs = TicketService::add_message(&db, &helper, created.id, dto("on it"))
            .await
            .unwrap();
        assert!(!mine.is_staff);
        assert!(theirs.is_staff);

        let messages = TicketService::messages(&db, &owner, created.id).await.unwrap();
        assert_eq!(messages.len(), 2);

        let updated = TicketService::update_status(&db, &helper, created.id, TicketStatus::Resolved)
            .await
            .unwrap();
        assert_eq!(updated.status, TicketStatus::Resolved);
    }

    #[tokio::test]
    async fn test_stats_count_open_urgent() {
        let db = Database::memory();
        let owner = principal(1, "user");
        let urgent = TicketService::create(&db, &owner, ticket("urgent")).await.unwrap();
        TicketService::create(&db, &owner, ticket("high")).await.unwrap();
        TicketService::create(&db, &owner, ticket("low")).await.unwrap();
        TicketService::update_status(&db, &owner, urgent.id, TicketStatus::Closed).await.unwrap();

        let stats = TicketService::stats(&db).await.unwrap();
        assert_eq!(stats.open, 2);
        assert_eq!(stats.closed, 1);
        assert_eq!(stats.urgent, 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_ticket() {
        let db = Database::memory();
        let err = TicketService::delete(&db, &principal(9, "admin"), 5).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
