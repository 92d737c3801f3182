use axum::{Router, middleware, routing::post};

use crate::middleware::rate_limit::sensitive_rate_limit;
use crate::state::AppState;

use super::controller::translate;

pub fn init_translation_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(translate))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            sensitive_rate_limit,
        ))
}
