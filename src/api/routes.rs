use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::sql::{sql_query, verify_sql_connection};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health, stats & metrics
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Gateway operations
        .route("/verify-sql-connection", post(verify_sql_connection))
        .route("/sql-query", post(sql_query))
}
