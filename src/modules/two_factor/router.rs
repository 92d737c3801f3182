use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::rate_limit::sensitive_rate_limit;
use crate::middleware::{Access, protect};
use crate::state::AppState;

use super::controller::{disable, enable, get_status, setup, verify};

pub fn init_two_factor_router(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/status", get(get_status))
        .route("/setup", post(setup))
        .route("/enable", post(enable))
        .route("/disable", post(disable))
        .route(
            "/verify",
            post(verify).route_layer(middleware::from_fn_with_state(
                state.clone(),
                sensitive_rate_limit,
            )),
        );

    protect(router, state, Access::Authenticated)
}
