//! Request and response bodies for the gateway endpoints.

use serde::{Deserialize, Serialize};

use crate::tenant::ConnectionFields;

/// Body of `POST /verify-sql-connection`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyConnectionRequest {
    #[serde(flatten)]
    pub connection: ConnectionFields,
    #[serde(default)]
    pub tenant_name: Option<String>,
}

/// Body of `POST /sql-query`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlQueryRequest {
    #[serde(flatten)]
    pub connection: ConnectionFields,
    #[serde(default)]
    pub sql_query: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
}

/// Success envelope carrying a message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status_code: u16,
    pub status: bool,
    pub message: String,
}

/// Success envelope carrying data
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub status_code: u16,
    pub status: bool,
    pub data: T,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            status: true,
            message: message.into(),
        }
    }
}

impl<T> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status_code: 200,
            status: true,
            data,
        }
    }
}
