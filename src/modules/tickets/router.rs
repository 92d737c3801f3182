use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::middleware::{Access, protect};
use crate::state::AppState;

use super::controller::{
    add_ticket_message, create_ticket, delete_ticket, get_ticket_messages, get_ticket_stats,
    get_tickets, update_ticket_status,
};

pub fn init_tickets_router(state: &AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/", get(get_tickets))
        .route("/stats", get(get_ticket_stats));

    // Ownership is checked per ticket by the service.
    let members = Router::new()
        .route("/", post(create_ticket))
        .route("/{id}/status", patch(update_ticket_status))
        .route("/{id}/messages", get(get_ticket_messages).post(add_ticket_message));

    let admin = Router::new().route("/{id}", delete(delete_ticket));

    protect(staff, state, Access::Staff)
        .merge(protect(members, state, Access::Authenticated))
        .merge(protect(admin, state, Access::Admin))
}
