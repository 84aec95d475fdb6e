use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Authenticated Router Module
///
/// Routes any identity holding a valid token may call. Ownership is declared per
/// operation in `auth::operations`:
/// - `PUT /users/{id}`: the caller must be user `{id}`.
/// - `PUT|DELETE /blogs/{id}`: the caller must be the entry's author.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // PUT /users/{id}
        .route("/users/{id}", put(handlers::update_user))
        // POST /blogs
        // The author is taken from the token, never from the body.
        .route("/blogs", post(handlers::create_blog_entry))
        // PUT/DELETE /blogs/{id}
        .route(
            "/blogs/{id}",
            put(handlers::update_blog_entry).delete(handlers::delete_blog_entry),
        )
}
