use crate::auth::jwt::{IssueError, TokenError};
use crate::auth::password::HashError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= Authentication Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Wrong email or password. Which one is never reported.
    #[error("Invalid credentials")]
    Credentials,

    /// Missing, malformed, forged or expired token.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code this error is surfaced as on the wire.
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Credentials | AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        // Token and server-side failures only carry detail for the logs.
        let message = match self {
            AppError::InvalidInput(msg) => msg,
            AppError::Credentials => "Invalid credentials".to_string(),
            AppError::Unauthenticated(reason) => {
                tracing::debug!(%reason, "rejecting unauthenticated request");
                "Unauthorized".to_string()
            }
            AppError::Forbidden(_) => "Insufficient permissions".to_string(),
            AppError::NotFound(msg) => msg,
            AppError::Conflict(msg) => msg,
            AppError::Database(detail) | AppError::Internal(detail) => {
                tracing::error!(%detail, "internal failure while handling request");
                "Internal server error".to_string()
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Unauthenticated(err.to_string())
    }
}

impl From<IssueError> for AppError {
    fn from(err: IssueError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<HashError> for AppError {
    fn from(err: HashError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, serde_json::from_slice(&bytes).expect("body should be json"))
    }

    #[tokio::test]
    async fn test_token_errors_share_one_response() {
        let mut bodies = Vec::new();
        for err in [TokenError::Malformed, TokenError::BadSignature, TokenError::Expired] {
            let (status, body) = body_json(err.into()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            bodies.push(body);
        }
        let (status, missing) = body_json(AppError::Unauthenticated("missing token".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        bodies.push(missing);

        assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_echoed() {
        let (status, body) = body_json(AppError::Internal("argon2 exploded: params".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        assert_eq!(
            AppError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Credentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("author".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
    }
}
