use axum::{
    Router,
    routing::{get, patch},
};

use crate::middleware::{Access, protect};
use crate::state::AppState;

use super::controller::{
    get_me, get_public_profile, get_staff, get_users, update_my_profile, update_user_metadata,
    update_user_role,
};

pub fn init_users_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/staff", get(get_staff))
        .route("/profile/{username}", get(get_public_profile));

    let members = Router::new()
        .route("/me", get(get_me))
        .route("/me/profile", patch(update_my_profile));

    let admin = Router::new()
        .route("/", get(get_users))
        .route("/{id}/role", patch(update_user_role))
        .route("/{id}/metadata", patch(update_user_metadata));

    public
        .merge(protect(members, state, Access::Authenticated))
        .merge(protect(admin, state, Access::Admin))
}
