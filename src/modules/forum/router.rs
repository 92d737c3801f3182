use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{Access, protect};
use crate::state::AppState;

use super::controller::{
    create_post, create_thread, delete_post, delete_thread, get_posts, get_thread, get_threads,
    get_user_threads, update_post, update_thread,
};

pub fn init_forum_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/categories/{category_id}/threads", get(get_threads))
        .route("/threads/{id}", get(get_thread))
        .route("/threads/{id}/posts", get(get_posts))
        .route("/users/{user_id}/threads", get(get_user_threads));

    let members = Router::new()
        .route("/threads", post(create_thread))
        .route("/threads/{id}/posts", post(create_post));

    let staff = Router::new()
        .route("/threads/{id}", put(update_thread).delete(delete_thread))
        .route("/posts/{id}", put(update_post).delete(delete_post));

    public
        .merge(protect(members, state, Access::Authenticated))
        .merge(protect(staff, state, Access::Staff))
}
