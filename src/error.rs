//! Error types / 错误类型
//!
//! Every handler error is rendered as `{"error": "<message>"}` with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application error / 应用错误
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or missing request input / 请求参数错误
    #[error("{0}")]
    BadRequest(String),

    /// Table or column name rejected by the identifier allow-list / 非法标识符
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Resource not found / 资源不存在
    #[error("{0}")]
    NotFound(String),

    /// Resource already exists / 资源已存在
    #[error("{0}")]
    Conflict(String),

    /// Relational store failure / 数据库错误
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidIdentifier("x y".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_passthrough() {
        let err = AppError::Internal(anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "disk full");
        let err = AppError::InvalidIdentifier("drop table".into());
        assert_eq!(err.to_string(), "Invalid identifier: drop table");
    }
}
