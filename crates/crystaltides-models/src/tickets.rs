//! Support tickets and their message threads.

use chrono::{DateTime, Utc};
use crystaltides_core::PaginationParams;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::validation::not_blank;

pub const TICKETS_TABLE: &str = "tickets";
pub const MESSAGES_TABLE: &str = "ticket_messages";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Open,
    Pending,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::Pending,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Ticket {
    pub id: i64,
    pub user_id: Uuid,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTicketDto {
    #[serde(default)]
    #[validate(length(
        min = 3,
        max = 150,
        message = "subject must be between 3 and 150 characters"
    ))]
    pub subject: String,
    #[serde(default)]
    #[validate(length(
        min = 10,
        max = 5000,
        message = "description must be between 10 and 5000 characters"
    ))]
    pub description: String,
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Serialize)]
pub struct NewTicket<'a> {
    pub user_id: Uuid,
    pub subject: &'a str,
    pub description: &'a str,
    pub priority: TicketPriority,
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateTicketStatusDto {
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketMessage {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: Uuid,
    pub message: String,
    #[serde(default)]
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTicketMessageDto {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 5000, message = "message must be between 1 and 5000 characters"),
        custom(function = "not_blank")
    )]
    pub message: String,
}

/// Written with server-derived `user_id` and `is_staff`.
#[derive(Debug, Serialize)]
pub struct NewTicketMessage<'a> {
    pub ticket_id: i64,
    pub user_id: Uuid,
    pub message: &'a str,
    pub is_staff: bool,
}

/// Ticket counts per status, plus open high/urgent tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct TicketStats {
    pub open: i64,
    pub pending: i64,
    pub resolved: i64,
    pub closed: i64,
    pub urgent: i64,
}

impl TicketStats {
    pub fn set(&mut self, status: TicketStatus, count: i64) {
        match status {
            TicketStatus::Open => self.open = count,
            TicketStatus::Pending => self.pending = count,
            TicketStatus::Resolved => self.resolved = count,
            TicketStatus::Closed => self.closed = count,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TicketListParams {
    pub status: Option<TicketStatus>,
    #[serde(flatten)]
    #[validate(nested)]
    pub pagination: PaginationParams,
}
