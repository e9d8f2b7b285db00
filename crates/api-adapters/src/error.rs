//! HTTP mapping of `DomainError`.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domains::DomainError;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::NotFound(..) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
            DomainError::Validation(msg) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", msg),
            DomainError::Unauthorized(msg) => Self::unauthorized(msg),
            DomainError::Forbidden(msg) => Self::forbidden(msg),
            DomainError::Conflict(msg) => Self::new(StatusCode::CONFLICT, "CONFLICT", msg),
            DomainError::QuotaExceeded(msg) => Self::new(StatusCode::TOO_MANY_REQUESTS, "QUOTA_EXCEEDED", msg),
            DomainError::Delivery(_) => Self::new(StatusCode::BAD_GATEWAY, "UPSTREAM_FAILED", message),
            DomainError::Internal(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR", message),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), "BAD_MULTIPART", err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The detail of a server-side failure stays in the log.
        let message = if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = self.code, error = %self.message, "request failed");
            match self.status {
                StatusCode::BAD_GATEWAY => "外部サービスとの通信に失敗しました",
                _ => "サーバーエラーが発生しました",
            }
        } else {
            self.message.as_str()
        };

        let body = ErrorBody {
            code: self.code,
            message,
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
