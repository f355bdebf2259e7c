//! Prometheus metrics for the gateway.
//!
//! - Registry metrics (pools registered, created, reused, failed creations)
//! - Operation metrics (verifications and queries by outcome, query latency)
//! - Pool connection gauges, refreshed on every scrape

mod helpers;

pub use helpers::{encode_metrics, QueryMetrics, RegistryMetrics, VerifyMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "tenant_gateway";

lazy_static! {
    // ============================================================================
    // Registry Metrics
    // ============================================================================

    /// Number of tenant pools currently registered
    pub static ref POOLS_REGISTERED: IntGauge = register_int_gauge!(
        format!("{}_pools_registered", METRIC_PREFIX),
        "Number of tenant pools currently registered"
    ).unwrap();

    /// Tenant pools created
    pub static ref POOLS_CREATED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_pools_created_total", METRIC_PREFIX),
        "Total tenant pools created"
    ).unwrap();

    /// Lookups served by an already registered pool
    pub static ref POOL_CACHE_HITS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_pool_cache_hits_total", METRIC_PREFIX),
        "Total lookups served by an existing tenant pool"
    ).unwrap();

    /// Pool creations that failed and stored nothing
    pub static ref POOL_CREATION_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_pool_creation_failures_total", METRIC_PREFIX),
        "Total failed tenant pool creations"
    ).unwrap();

    /// Lookups whose parameters differed from the registered pool's
    pub static ref CREDENTIAL_MISMATCHES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_credential_mismatches_total", METRIC_PREFIX),
        "Total lookups with parameters differing from the registered pool"
    ).unwrap();

    /// Open connections across all tenant pools
    pub static ref POOL_CONNECTIONS: IntGauge = register_int_gauge!(
        format!("{}_pool_connections", METRIC_PREFIX),
        "Open connections across all tenant pools"
    ).unwrap();

    /// Idle connections across all tenant pools
    pub static ref POOL_CONNECTIONS_IDLE: IntGauge = register_int_gauge!(
        format!("{}_pool_connections_idle", METRIC_PREFIX),
        "Idle connections across all tenant pools"
    ).unwrap();

    // ============================================================================
    // Operation Metrics
    // ============================================================================

    /// Connection verifications by outcome
    pub static ref VERIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_verifications_total", METRIC_PREFIX),
        "Total connection verifications",
        &["outcome"]
    ).unwrap();

    /// Queries by outcome
    pub static ref QUERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_queries_total", METRIC_PREFIX),
        "Total queries executed",
        &["outcome"]
    ).unwrap();

    /// Query execution latency, pool lookup included
    pub static ref QUERY_DURATION_SECONDS: Histogram = register_histogram!(
        format!("{}_query_duration_seconds", METRIC_PREFIX),
        "Query execution latency in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    ).unwrap();
}
