use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::middleware::{Access, protect};
use crate::state::AppState;

use super::controller::{create_poll, delete_poll, get_active_poll, get_poll, get_polls, vote};

pub fn init_polls_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(get_polls))
        .route("/active", get(get_active_poll))
        .route("/{id}", get(get_poll));

    let voters = Router::new().route("/{id}/vote", post(vote));

    let admin = Router::new()
        .route("/", post(create_poll))
        .route("/{id}", delete(delete_poll));

    public
        .merge(protect(voters, state, Access::Authenticated))
        .merge(protect(admin, state, Access::Admin))
}
