use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, put},
};

/// Admin Router Module
///
/// User management. Every handler here declares the `{admin}` role set; no other role
/// is accepted, including `chiefeditor`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /users?page=&limit=
        .route("/users", get(handlers::list_users))
        // PUT /users/{id}/role
        .route("/users/{id}/role", put(handlers::update_user_role))
        // DELETE /users/{id}
        .route("/users/{id}", delete(handlers::delete_user))
}
