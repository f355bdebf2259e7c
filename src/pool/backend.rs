//! Backend traits for tenant connection pools.
//!
//! The registry only needs two things from a database driver: a way to open a
//! pool from request credentials, and a handle that can ping and run a raw
//! statement. Keeping these behind traits lets the registry and the gateway
//! operations run against an in-process backend in tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::tenant::ConnectionParams;

use super::result::ResultSet;

/// Errors that can occur during pool backend operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Driver error, message passed through unchanged
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),

    /// Column value could not be converted
    #[error("Failed to decode column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Backend is unreachable or refused the operation
    #[error("{0}")]
    Unavailable(String),
}

/// Point-in-time connection counts for a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: u32,
}

/// A live, shareable pool of connections to one tenant database.
///
/// Implementations are internally synchronized: callers share one handle and
/// never lock around it.
#[async_trait]
pub trait SqlPool: Send + Sync {
    /// Perform one round trip proving connectivity and credentials.
    async fn ping(&self) -> Result<(), PoolError>;

    /// Run `sql` once and return whatever the engine yields.
    async fn execute(&self, sql: &str) -> Result<ResultSet, PoolError>;

    fn status(&self) -> PoolStatus;

    /// Close all connections. The handle must not be used afterwards.
    async fn close(&self);
}

/// Opens new tenant pools from request credentials.
#[async_trait]
pub trait PoolFactory: Send + Sync {
    /// Bind `params` into a new pool.
    ///
    /// Connections are acquired lazily, so this succeeds even if the database
    /// is unreachable. It fails only when `params` cannot form a valid target.
    async fn open(&self, params: &ConnectionParams) -> Result<Arc<dyn SqlPool>, PoolError>;

    /// Short backend name used in logs
    fn backend_name(&self) -> &'static str;
}
