//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    CREDENTIAL_MISMATCHES_TOTAL, POOLS_CREATED_TOTAL, POOLS_REGISTERED, POOL_CACHE_HITS_TOTAL,
    POOL_CONNECTIONS, POOL_CONNECTIONS_IDLE, POOL_CREATION_FAILURES_TOTAL, QUERIES_TOTAL,
    QUERY_DURATION_SECONDS, VERIFICATIONS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording registry metrics
pub struct RegistryMetrics;

impl RegistryMetrics {
    pub fn record_created() {
        POOLS_CREATED_TOTAL.inc();
    }

    pub fn record_hit() {
        POOL_CACHE_HITS_TOTAL.inc();
    }

    pub fn record_creation_failed() {
        POOL_CREATION_FAILURES_TOTAL.inc();
    }

    pub fn record_mismatch() {
        CREDENTIAL_MISMATCHES_TOTAL.inc();
    }

    pub fn set_registered(count: usize) {
        POOLS_REGISTERED.set(count as i64);
    }

    /// Update connection gauges (call on scrape)
    pub fn set_connections(total: u64, idle: u64) {
        POOL_CONNECTIONS.set(total as i64);
        POOL_CONNECTIONS_IDLE.set(idle as i64);
    }
}

/// Helper struct for recording verification metrics
pub struct VerifyMetrics;

impl VerifyMetrics {
    pub fn record_success() {
        VERIFICATIONS_TOTAL.with_label_values(&["success"]).inc();
    }

    /// Record a failure labelled with the error kind
    pub fn record_failure(kind: &str) {
        VERIFICATIONS_TOTAL.with_label_values(&[kind]).inc();
    }
}

/// Helper struct for recording query metrics
pub struct QueryMetrics;

impl QueryMetrics {
    pub fn record_success(duration_secs: f64) {
        QUERIES_TOTAL.with_label_values(&["success"]).inc();
        QUERY_DURATION_SECONDS.observe(duration_secs);
    }

    /// Record a failure labelled with the error kind
    pub fn record_failure(kind: &str, duration_secs: f64) {
        QUERIES_TOTAL.with_label_values(&[kind]).inc();
        QUERY_DURATION_SECONDS.observe(duration_secs);
    }

    /// Record a request turned away before any statement ran. Not timed.
    pub fn record_rejected(kind: &str) {
        QUERIES_TOTAL.with_label_values(&[kind]).inc();
    }
}
