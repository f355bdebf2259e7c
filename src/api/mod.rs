//! API layer - HTTP endpoint handlers organized by domain.

mod health;
mod metrics;
mod models;
mod routes;
mod sql;

pub use health::{health, stats};
pub use metrics::prometheus_metrics;
pub use models::{DataResponse, MessageResponse, SqlQueryRequest, VerifyConnectionRequest};
pub use routes::api_routes;
pub use sql::{sql_query, verify_sql_connection, VERIFIED_MESSAGE};
