use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{Access, protect};
use crate::state::AppState;

use super::controller::{
    create_donation, delete_donation, get_donation_stats, get_donations, update_donation,
};

pub fn init_donations_router(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(create_donation))
        .route("/{id}", put(update_donation).delete(delete_donation));

    Router::new()
        .route("/", get(get_donations))
        .route("/stats", get(get_donation_stats))
        .merge(protect(admin, state, Access::Admin))
}
