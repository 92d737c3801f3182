use axum::extract::State;
use crystaltides_core::{ApiResponse, AppError};
use crystaltides_models::tickets::TicketListParams;
use crystaltides_models::{
    CreateTicketDto, CreateTicketMessageDto, Ticket, TicketMessage, TicketStats,
    UpdateTicketStatusDto,
};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::tickets::service::TicketService;
use crate::state::AppState;
use crate::validator::{PathId, ValidatedJson, ValidatedQuery};

#[utoipa::path(
    get,
    path = "/api/tickets",
    params(TicketListParams),
    responses(
        (status = 200, description = "Tickets, newest first", body = [Ticket]),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Tickets",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_tickets(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<TicketListParams>,
) -> Result<ApiResponse<Vec<Ticket>>, AppError> {
    let (tickets, meta) = TicketService::list(&state.db, &params).await?;
    Ok(ApiResponse::paginated(tickets, meta))
}

#[utoipa::path(
    get,
    path = "/api/tickets/stats",
    responses(
        (status = 200, description = "Ticket counts", body = TicketStats),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Tickets",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_ticket_stats(
    State(state): State<AppState>,
) -> Result<ApiResponse<TicketStats>, AppError> {
    Ok(ApiResponse::ok(TicketService::stats(&state.db).await?))
}

#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketDto,
    responses(
        (status = 200, description = "Ticket opened", body = Ticket),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Tickets",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.id))]
pub async fn create_ticket(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateTicketDto>,
) -> Result<ApiResponse<Ticket>, AppError> {
    let ticket = TicketService::create(&state.db, &auth_user, dto).await?;
    Ok(ApiResponse::ok(ticket).with_message("Ticket created"))
}

#[utoipa::path(
    patch,
    path = "/api/tickets/{id}/status",
    params(("id" = i64, Path, description = "Ticket ID")),
    request_body = UpdateTicketStatusDto,
    responses(
        (status = 200, description = "Status updated", body = Ticket),
        (status = 403, description = "Not the owner nor staff"),
        (status = 404, description = "Ticket not found")
    ),
    tag = "Tickets",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id))]
pub async fn update_ticket_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
    ValidatedJson(dto): ValidatedJson<UpdateTicketStatusDto>,
) -> Result<ApiResponse<Ticket>, AppError> {
    let ticket = TicketService::update_status(&state.db, &auth_user, id, dto.status).await?;
    Ok(ApiResponse::ok(ticket))
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}/messages",
    params(("id" = i64, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Messages, oldest first", body = [TicketMessage]),
        (status = 403, description = "Not the owner nor staff"),
        (status = 404, description = "Ticket not found")
    ),
    tag = "Tickets",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id))]
pub async fn get_ticket_messages(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<Vec<TicketMessage>>, AppError> {
    Ok(ApiResponse::ok(TicketService::messages(&state.db, &auth_user, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{id}/messages",
    params(("id" = i64, Path, description = "Ticket ID")),
    request_body = CreateTicketMessageDto,
    responses(
        (status = 200, description = "Message added", body = TicketMessage),
        (status = 403, description = "Not the owner nor staff"),
        (status = 404, description = "Ticket not found")
    ),
    tag = "Tickets",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.id))]
pub async fn add_ticket_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
    ValidatedJson(dto): ValidatedJson<CreateTicketMessageDto>,
) -> Result<ApiResponse<TicketMessage>, AppError> {
    let message = TicketService::add_message(&state.db, &auth_user, id, dto).await?;
    Ok(ApiResponse::ok(message))
}

#[utoipa::path(
    delete,
    path = "/api/tickets/{id}",
    params(("id" = i64, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket deleted"),
        (status = 404, description = "Ticket not found")
    ),
    tag = "Tickets",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_ticket(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    TicketService::delete(&state.db, &auth_user, id).await?;
    Ok(ApiResponse::message("Ticket deleted"))
}
