//! Metric side effects of the gateway operations.
//!
//! Kept in its own test binary: the Prometheus registry is process-global, so
//! exact counts only hold when no other test runs queries alongside.

mod common;

use std::sync::Arc;

use tenant_sql_gateway::config::DatabaseConfig;
use tenant_sql_gateway::gateway::SqlGateway;
use tenant_sql_gateway::metrics::{QUERIES_TOTAL, QUERY_DURATION_SECONDS};
use tenant_sql_gateway::registry::TenantPoolRegistry;
use tenant_sql_gateway::tenant::TenantKey;

use common::{fields, FakeFactory};

#[tokio::test]
async fn test_query_latency_only_counts_executed_queries() {
    let registry = Arc::new(TenantPoolRegistry::new(FakeFactory::new()));
    let gateway = SqlGateway::new(registry, &DatabaseConfig::default());
    let tenant = TenantKey::from("metrics");

    let samples = QUERY_DURATION_SECONDS.get_sample_count();
    let rejected = QUERIES_TOTAL.with_label_values(&["validation"]).get();

    // Missing sqlQuery: counted as a validation outcome, never timed
    assert!(gateway.execute_query(fields("db1"), &tenant, None).await.is_err());
    assert_eq!(
        QUERIES_TOTAL.with_label_values(&["validation"]).get(),
        rejected + 1
    );
    assert_eq!(QUERY_DURATION_SECONDS.get_sample_count(), samples);

    // An executed statement is timed
    assert!(gateway
        .execute_query(fields("db1"), &tenant, Some("SELECT 1 AS x".into()))
        .await
        .is_ok());
    assert_eq!(QUERY_DURATION_SECONDS.get_sample_count(), samples + 1);
}
