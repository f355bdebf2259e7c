//! Gateway endpoints: connection verification and ad-hoc SQL.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::error::{AppError, Result, MISSING_DATABASE_PARAMS, MISSING_QUERY_PARAMS};
use crate::pool::ResultSet;
use crate::server::AppState;
use crate::tenant::TenantKey;

use super::models::{DataResponse, MessageResponse, SqlQueryRequest, VerifyConnectionRequest};

pub const VERIFIED_MESSAGE: &str = "MySQL connection verified successfully";

/// POST /verify-sql-connection
#[tracing::instrument(name = "http.verify_sql_connection", skip(state, payload))]
pub async fn verify_sql_connection(
    State(state): State<AppState>,
    payload: std::result::Result<Json<VerifyConnectionRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(request) = payload.map_err(|e| rejection_error(e, MISSING_DATABASE_PARAMS))?;
    let tenant = TenantKey::from_optional(request.tenant_name);

    state
        .gateway
        .verify_connection(request.connection, &tenant)
        .await?;

    Ok(Json(MessageResponse::ok(VERIFIED_MESSAGE)))
}

/// POST /sql-query
#[tracing::instrument(name = "http.sql_query", skip(state, payload))]
pub async fn sql_query(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SqlQueryRequest>, JsonRejection>,
) -> Result<Json<DataResponse<ResultSet>>> {
    let Json(request) = payload.map_err(|e| rejection_error(e, MISSING_QUERY_PARAMS))?;
    let tenant = TenantKey::from_optional(request.tenant_name);

    let result = state
        .gateway
        .execute_query(request.connection, &tenant, request.sql_query)
        .await?;

    Ok(Json(DataResponse::ok(result)))
}

/// A body sent without a JSON content type carries no fields at all, so it
/// fails like a request with every field missing. Malformed JSON keeps the
/// parser's message.
fn rejection_error(rejection: JsonRejection, missing_fields: &str) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::Validation(missing_fields.to_string())
        }
        other => AppError::Validation(other.body_text()),
    }
}
