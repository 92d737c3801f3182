use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{Access, protect};
use crate::state::AppState;

use super::controller::{create_rule, delete_rule, get_rules, update_rule};

pub fn init_rules_router(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(create_rule))
        .route("/{id}", put(update_rule).delete(delete_rule));

    Router::new()
        .route("/", get(get_rules))
        .merge(protect(admin, state, Access::Admin))
}
