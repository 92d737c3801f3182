use axum::{Router, middleware, routing::post};

use crate::middleware::rate_limit::sensitive_rate_limit;
use crate::state::AppState;

use super::controller::{kofi_webhook, minecraft_webhook};

pub fn init_webhooks_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/kofi", post(kofi_webhook))
        .route("/minecraft", post(minecraft_webhook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            sensitive_rate_limit,
        ))
}
