use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::middleware::rate_limit::sensitive_rate_limit;
use crate::middleware::{Access, protect};
use crate::state::AppState;

use super::controller::{
    create_suggestion, delete_suggestion, get_suggestions, update_suggestion_status,
};

pub fn init_suggestions_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", post(create_suggestion))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            sensitive_rate_limit,
        ));

    let staff = Router::new()
        .route("/", get(get_suggestions))
        .route("/{id}/status", patch(update_suggestion_status))
        .route("/{id}", delete(delete_suggestion));

    public.merge(protect(staff, state, Access::Staff))
}
