use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors the API answers with, as `{"error": <message>}` bodies.
///
/// Messages on the 4xx variants are user-facing contract: validation and
/// login wording is fixed and asserted by tests. `Internal` and `Database`
/// log the real cause and answer with a generic body.
#[derive(Debug)]
pub enum AppError {
    /// Missing rows, and project ids the caller may not see.
    NotFound(String),
    /// Bad or missing credentials. Login failures always say
    /// "Incorrect email or password.", whichever part was wrong.
    Unauthorized(String),
    /// Authenticated but refused: closed registration, non-owner
    /// participant adds.
    Forbidden(String),
    /// Field validation failures, message per field.
    BadRequest(String),
    /// Uniqueness conflicts, field-specific where the field is known.
    Conflict(String),
    /// Login attempts over the per-email budget.
    RateLimited(String),
    /// Both project-id insert attempts collided and nothing was created.
    /// The only 500 whose message reaches the caller.
    CreationFailed,
    Internal(String),
    Database(sqlx::Error),
}

impl AppError {
    /// Unknown and inaccessible projects answer identically; a 404 never
    /// confirms that a project exists.
    pub fn project_not_found() -> Self {
        AppError::NotFound("Project not found".to_string())
    }

    pub fn email_taken() -> Self {
        AppError::Conflict("Email address already taken.".to_string())
    }

    pub fn username_taken() -> Self {
        AppError::Conflict("Username already taken.".to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::CreationFailed => write!(f, "Creation Failed: project id collision"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::CreationFailed => {
                tracing::error!("Project creation failed: id collision on both attempts");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create project.".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}
