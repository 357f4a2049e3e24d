use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    // Auth errors
    #[error("Not authenticated")]
    AuthenticationRequired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not a participant of this match")]
    NotParticipant,

    // Availability errors
    #[error("No active availability")]
    NotAvailable,

    // Ping errors
    #[error("Cannot ping yourself")]
    CannotPingSelf,
    #[error("A live ping already exists for this pair")]
    DuplicatePing,
    #[error("Already in an active match")]
    ActiveMatchExists,
    #[error("Ping not found")]
    PingNotFound,
    #[error("Already handled")]
    AlreadyHandled,

    // Match timeline/chat errors
    #[error("Match is not active")]
    MatchNotActive,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    // Profile errors
    #[error("Profile not found")]
    ProfileNotFound,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Redis errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    // JWT errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // 400 Bad Request
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::CannotPingSelf => (StatusCode::BAD_REQUEST, self.to_string()),

            // 401 Unauthorized
            AppError::AuthenticationRequired => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Jwt(_) => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),

            // 403 Forbidden
            AppError::Unauthorized => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::NotParticipant => (StatusCode::FORBIDDEN, self.to_string()),

            // 404 Not Found
            AppError::PingNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::ProfileNotFound => (StatusCode::NOT_FOUND, self.to_string()),

            // 409 Conflict
            AppError::NotAvailable => (StatusCode::CONFLICT, self.to_string()),
            AppError::DuplicatePing => (StatusCode::CONFLICT, self.to_string()),
            AppError::ActiveMatchExists => (StatusCode::CONFLICT, self.to_string()),
            AppError::AlreadyHandled => (StatusCode::CONFLICT, self.to_string()),
            AppError::MatchNotActive => (StatusCode::CONFLICT, self.to_string()),
            AppError::InvalidTransition(msg) => (StatusCode::CONFLICT, msg.clone()),

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Realtime channel error".to_string(),
                )
            }
            AppError::Serde(e) => {
                tracing::error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn conflict_family_maps_to_409() {
        assert_eq!(status_of(AppError::DuplicatePing), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::ActiveMatchExists), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::AlreadyHandled), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::MatchNotActive), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AppError::InvalidTransition("out of order".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn authorization_errors_are_distinct_from_authentication() {
        assert_eq!(
            status_of(AppError::AuthenticationRequired),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AppError::Unauthorized), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AppError::NotParticipant), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bad_input_maps_to_400() {
        assert_eq!(
            status_of(AppError::Validation("radius_km must be positive".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::CannotPingSelf), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_records_map_to_404() {
        assert_eq!(status_of(AppError::PingNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::ProfileNotFound), StatusCode::NOT_FOUND);
    }
}
