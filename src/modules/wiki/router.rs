use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{Access, protect};
use crate::state::AppState;

use super::controller::{create_article, delete_article, get_article, get_articles, update_article};

pub fn init_wiki_router(state: &AppState) -> Router<AppState> {
    // `/{id}` (admin writes) and `/{slug}` (public read) share one segment.
    let admin = Router::new()
        .route("/", post(create_article))
        .route("/{slug}", put(update_article).delete(delete_article));

    Router::new()
        .route("/", get(get_articles))
        .route("/{slug}", get(get_article))
        .merge(protect(admin, state, Access::Admin))
}
