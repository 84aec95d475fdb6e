use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// AuthError
///
/// The reason category attached to a denied authorization decision. Responses carry
/// only this category, never the internal detail that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token, a malformed/tampered/expired token, or a token whose identity no
    /// longer exists.
    #[error("unauthenticated")]
    Unauthenticated,
    /// Authenticated, but a role or ownership requirement was not met.
    #[error("forbidden")]
    Forbidden,
    /// The resource targeted by an ownership check does not exist.
    #[error("not found")]
    NotFound,
    /// An operation declared an ownership check whose path parameter is absent.
    #[error("misconfigured authorization requirement")]
    MisconfiguredRequirement,
}

impl AuthError {
    pub fn status(self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            // Never surface the programming error itself.
            AuthError::MisconfiguredRequirement => StatusCode::FORBIDDEN,
        }
    }

    /// The category string written into the response body.
    pub fn category(self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden | AuthError::MisconfiguredRequirement => "forbidden",
            AuthError::NotFound => "not_found",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.category() }))).into_response()
    }
}

/// RepositoryError
///
/// Write-path failures from the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique constraint (username) was violated.
    #[error("conflicting record")]
    Conflict,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// ApiError
///
/// Handler-level error, converted into a status code plus `{"error": ...}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error")]
    Internal,
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict => ApiError::Conflict,
            RepositoryError::Database(e) => {
                tracing::error!("repository write failed: {:?}", e);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Auth(err) => return err.into_response(),
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "not_found" })),
            ApiError::Conflict => (StatusCode::CONFLICT, json!({ "error": "conflict" })),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "bad_request", "message": msg }),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "internal" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
