//! Gateway operations: connection verification and query execution.
//!
//! Both operations validate the caller's fields first and never touch the
//! registry when validation fails. Timeouts are opt-in; without configuration
//! an operation waits as long as the driver does.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::DatabaseConfig;
use crate::error::{AppError, Result, MISSING_DATABASE_PARAMS, MISSING_QUERY_PARAMS};
use crate::metrics::{QueryMetrics, VerifyMetrics};
use crate::pool::ResultSet;
use crate::registry::TenantPoolRegistry;
use crate::tenant::{ConnectionFields, TenantKey};

pub struct SqlGateway {
    registry: Arc<TenantPoolRegistry>,
    verify_timeout: Option<Duration>,
    query_timeout: Option<Duration>,
}

impl SqlGateway {
    pub fn new(registry: Arc<TenantPoolRegistry>, config: &DatabaseConfig) -> Self {
        Self {
            registry,
            verify_timeout: config.verify_timeout(),
            query_timeout: config.query_timeout(),
        }
    }

    pub fn registry(&self) -> &Arc<TenantPoolRegistry> {
        &self.registry
    }

    /// Prove the tenant database is reachable with a real round trip.
    ///
    /// A new pool is registered only if its first ping succeeds. An existing
    /// pool is pinged again, so a broken pool never verifies successfully.
    #[tracing::instrument(
        name = "gateway.verify_connection",
        skip(self, fields, tenant),
        fields(tenant = %tenant)
    )]
    pub async fn verify_connection(
        &self,
        fields: ConnectionFields,
        tenant: &TenantKey,
    ) -> Result<()> {
        let Some(params) = fields.into_params() else {
            VerifyMetrics::record_failure("validation");
            return Err(AppError::Validation(MISSING_DATABASE_PARAMS.to_string()));
        };

        let verify = async {
            let lookup = self.registry.get_or_create_verified(tenant, &params).await?;
            if !lookup.created {
                lookup
                    .entry
                    .pool()
                    .ping()
                    .await
                    .map_err(|e| AppError::Connection(e.to_string()))?;
            }
            Ok::<(), AppError>(())
        };

        let result = bounded(self.verify_timeout, verify, |limit| {
            AppError::Connection(format!(
                "Connection verification timed out after {}s",
                limit.as_secs()
            ))
        })
        .await;

        match &result {
            Ok(()) => {
                VerifyMetrics::record_success();
                tracing::info!(tenant = %tenant, "Connection verified");
            }
            Err(e) => {
                VerifyMetrics::record_failure(e.kind());
                tracing::warn!(tenant = %tenant, error = %e, "Connection verification failed");
            }
        }

        result
    }

    /// Run `sql` through the tenant's pool and return the raw result.
    ///
    /// Pool creation failures are reported as query errors. A failed statement
    /// leaves the pool registered and usable.
    #[tracing::instrument(
        name = "gateway.execute_query",
        skip(self, fields, tenant, sql),
        fields(tenant = %tenant, sql_len = sql.as_deref().map(str::len).unwrap_or(0))
    )]
    pub async fn execute_query(
        &self,
        fields: ConnectionFields,
        tenant: &TenantKey,
        sql: Option<String>,
    ) -> Result<ResultSet> {
        let (Some(params), Some(sql)) = (fields.into_params(), sql.filter(|s| !s.is_empty()))
        else {
            QueryMetrics::record_rejected("validation");
            return Err(AppError::Validation(MISSING_QUERY_PARAMS.to_string()));
        };

        let start = Instant::now();

        let run = async {
            let lookup = self
                .registry
                .get_or_create(tenant, &params)
                .await
                .map_err(into_query_error)?;
            lookup
                .entry
                .pool()
                .execute(&sql)
                .await
                .map_err(|e| AppError::Query(e.to_string()))
        };

        let result = bounded(self.query_timeout, run, |limit| {
            AppError::Query(format!("Query timed out after {}s", limit.as_secs()))
        })
        .await;

        let elapsed = start.elapsed();
        match &result {
            Ok(rows) => {
                QueryMetrics::record_success(elapsed.as_secs_f64());
                tracing::debug!(
                    tenant = %tenant,
                    rows = rows.row_count(),
                    duration_ms = elapsed.as_millis() as u64,
                    "Query executed"
                );
            }
            Err(e) => {
                QueryMetrics::record_failure(e.kind(), elapsed.as_secs_f64());
                tracing::warn!(tenant = %tenant, error = %e, "Query failed");
            }
        }

        result
    }
}

/// Connection failures during query execution are query errors to the caller
fn into_query_error(e: AppError) -> AppError {
    match e {
        AppError::Connection(message) => AppError::Query(message),
        other => other,
    }
}

async fn bounded<T, F>(
    limit: Option<Duration>,
    fut: F,
    on_timeout: impl FnOnce(Duration) -> AppError,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(limit)),
        },
        None => fut.await,
    }
}
