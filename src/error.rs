use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid query parameter `{key}`: {reason}")]
    InvalidQuery {
        key: String,
        value: Option<String>,
        reason: String,
    },

    #[error("{reason}")]
    RateLimited { reason: String, limit: u32 },

    #[error("Missing tenant scope: {0}")]
    MissingTenant(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn invalid_query(key: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::InvalidQuery {
            key: key.into(),
            value: None,
            reason: reason.into(),
        }
    }

    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AppError::InvalidQuery {
            key: key.into(),
            value: Some(value.into()),
            reason: reason.into(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", None)
            }
            AppError::InvalidQuery { key, value, .. } => (
                StatusCode::BAD_REQUEST,
                "INVALID_QUERY",
                Some(serde_json::json!({ "key": key, "value": value })),
            ),
            AppError::RateLimited { limit, .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                Some(serde_json::json!({ "limit": limit })),
            ),
            AppError::MissingTenant(_) => (StatusCode::UNAUTHORIZED, "MISSING_TENANT", None),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_query_maps_to_bad_request() {
        let response = AppError::invalid_query("where__name__fuzzy_match", "unknown operator")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rate_limited_maps_to_too_many_requests() {
        let err = AppError::RateLimited {
            reason: "Daily retry limit reached".to_string(),
            limit: 3,
        };
        assert_eq!(err.to_string(), "Daily retry limit reached");
        assert_eq!(err.into_response().status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn invalid_query_message_names_key() {
        let err = AppError::invalid_value("take", "500", "must be between 1 and 100");
        assert!(err.to_string().contains("`take`"));
    }
}
