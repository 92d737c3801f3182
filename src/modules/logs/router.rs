use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::rate_limit::sensitive_rate_limit;
use crate::middleware::{Access, protect};
use crate::state::AppState;

use super::controller::{create_log, get_command_logs, get_logs, report_security_alert};

pub fn init_logs_router(state: &AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/", get(get_logs).post(create_log))
        .route("/commands", get(get_command_logs));

    let public = Router::new()
        .route("/security-alert", post(report_security_alert))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            sensitive_rate_limit,
        ));

    protect(staff, state, Access::Staff).merge(protect(public, state, Access::Optional))
}
