use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// One field-level validation failure.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Request-level failure taxonomy. Every handler error becomes exactly one
/// of these; the `kind` string is the machine-checkable contract.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("validation failed")]
    Validation(Vec<Violation>),
    #[error("scoring service unavailable: {message}")]
    UpstreamUnavailable { message: String, timed_out: bool },
    #[error("scoring service rejected the request: {0}")]
    UpstreamRejected(String),
    #[error("storage failure")]
    Persistence(anyhow::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::InvalidToken => "invalid_token",
            ApiError::Validation(_) => "validation_error",
            ApiError::UpstreamUnavailable { .. } => "upstream_unavailable",
            ApiError::UpstreamRejected(_) => "upstream_rejected",
            ApiError::Persistence(_) => "persistence_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamUnavailable { timed_out: true, .. } => StatusCode::GATEWAY_TIMEOUT,
            ApiError::UpstreamUnavailable { .. } | ApiError::UpstreamRejected(_) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Persistence(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Persistence(cause) | ApiError::Internal(cause) => {
                error!(kind = self.kind(), error = %self, cause = %cause, "request failed");
            }
            _ if status.is_server_error() => {
                error!(kind = self.kind(), error = %self, "request failed");
            }
            _ => warn!(kind = self.kind(), error = %self, "request rejected"),
        }

        let mut body = json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        });
        if let ApiError::Validation(violations) = &self {
            body["error"]["details"] = json!(violations);
        }

        (status, Json(body)).into_response()
    }
}
