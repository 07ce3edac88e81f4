//! API 错误到 HTTP 响应的映射

use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Domain(DomainError::Validation { field, message }) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION",
                format!("{field}: {message}"),
            ),
            ApplicationError::Domain(DomainError::Forbidden { action }) => {
                ApiError::new(StatusCode::FORBIDDEN, "FORBIDDEN", action)
            }
            ApplicationError::Domain(DomainError::NotFound {
                resource_type,
                resource_id,
            }) => ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource_type} {resource_id} not found"),
            ),
            ApplicationError::Domain(DomainError::Conflict { message }) => {
                ApiError::new(StatusCode::CONFLICT, "CONFLICT", message)
            }
            ApplicationError::Domain(DomainError::PolicyViolation { rule }) => {
                ApiError::new(StatusCode::BAD_REQUEST, "POLICY_VIOLATION", rule)
            }
            ApplicationError::Domain(DomainError::Storage { message }) => {
                tracing::error!(%message, "存储层错误");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal error",
                )
            }
            ApplicationError::Broadcast(e) => {
                tracing::error!(error = %e, "事件广播失败");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal error",
                )
            }
            ApplicationError::Infrastructure(message) => {
                tracing::error!(%message, "基础设施错误");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
