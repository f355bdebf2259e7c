use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::tenant::TenantKey;

pub const MISSING_DATABASE_PARAMS: &str = "Missing required database parameters";
pub const MISSING_QUERY_PARAMS: &str = "Missing required parameters";
pub const QUERY_FAILED: &str = "Error executing query";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Request is missing required fields
    #[error("{0}")]
    Validation(String),

    /// Pool could not be opened or the database could not be reached
    #[error("{0}")]
    Connection(String),

    /// Statement execution failed against an opened pool
    #[error("{0}")]
    Query(String),

    #[error("Tenant '{tenant}' is already registered with different connection parameters")]
    CredentialMismatch { tenant: TenantKey },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::CredentialMismatch { .. } => StatusCode::CONFLICT,
            AppError::Config(_) | AppError::Connection(_) | AppError::Query(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Validation(_) => "validation",
            AppError::Connection(_) => "connection",
            AppError::Query(_) => "query",
            AppError::CredentialMismatch { .. } => "credential_mismatch",
        }
    }
}

/// Error envelope returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub status: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, error) = match &self {
            AppError::Query(e) => (QUERY_FAILED.to_string(), Some(e.clone())),
            other => (other.to_string(), None),
        };

        if status.is_client_error() {
            tracing::warn!(
                kind = %self.kind(),
                status = %status.as_u16(),
                message = %self,
                "API request rejected"
            );
        } else {
            tracing::error!(
                kind = %self.kind(),
                status = %status.as_u16(),
                message = %self,
                "API error"
            );
        }

        let body = ErrorResponse {
            status_code: status.as_u16(),
            status: false,
            message,
            error,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
