use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Registration, login (token issuance) and read-only lookups.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Load balancer probe.
        .route("/health", get(|| async { "ok" }))
        // POST /users
        .route("/users", post(handlers::register_user))
        // POST /users/login
        // Returns a bearer token valid for `TOKEN_TTL_SECS`.
        .route("/users/login", post(handlers::login))
        // GET /users/{id}
        .route("/users/{id}", get(handlers::get_user))
        // GET /blogs?userId=...
        .route("/blogs", get(handlers::list_blog_entries))
        // GET /blogs/pageable?page=&limit=
        // The static segment takes precedence over `/blogs/{id}`.
        .route("/blogs/pageable", get(handlers::page_blog_entries))
        // GET /blogs/pageable/user/{user_id}?page=&limit=
        .route(
            "/blogs/pageable/user/{user_id}",
            get(handlers::page_blog_entries_by_author),
        )
        // GET /blogs/{id}
        .route("/blogs/{id}", get(handlers::get_blog_entry))
}
