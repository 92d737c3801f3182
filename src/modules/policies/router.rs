use axum::{
    Router,
    routing::{get, put},
};

use crate::middleware::{Access, protect};
use crate::state::AppState;

use super::controller::{get_policies, get_policy, upsert_policy};

pub fn init_policies_router(state: &AppState) -> Router<AppState> {
    let admin = Router::new().route("/{slug}", put(upsert_policy));

    Router::new()
        .route("/", get(get_policies))
        .route("/{slug}", get(get_policy))
        .merge(protect(admin, state, Access::Admin))
}
