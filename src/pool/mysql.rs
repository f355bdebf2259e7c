//! MySQL pool backend built on sqlx.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Connection, Either, Row as _, TypeInfo, ValueRef};

use crate::config::DatabaseConfig;
use crate::tenant::ConnectionParams;

use super::backend::{PoolError, PoolFactory, PoolStatus, SqlPool};
use super::result::{returns_rows, ResultSet, Row, SqlValue};

/// Opens lazily-connected MySQL pools, one per tenant.
pub struct MySqlPoolFactory {
    config: DatabaseConfig,
}

impl MySqlPoolFactory {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn connect_options(params: &ConnectionParams) -> MySqlConnectOptions {
        let (host, port) = params.host_and_port();
        MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&params.user)
            .password(&params.password)
            .database(&params.database)
    }

    fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.config.max_connections)
            .min_connections(self.config.min_connections)
            .acquire_timeout(self.config.acquire_timeout())
            .idle_timeout(Some(self.config.idle_timeout()))
    }
}

#[async_trait]
impl PoolFactory for MySqlPoolFactory {
    async fn open(&self, params: &ConnectionParams) -> Result<Arc<dyn SqlPool>, PoolError> {
        if params.host_and_port().0.is_empty() {
            return Err(PoolError::Unavailable(format!(
                "Invalid host '{}'",
                params.host
            )));
        }

        let pool = self
            .pool_options()
            .connect_lazy_with(Self::connect_options(params));

        tracing::debug!(
            target_db = %params.display_target(),
            max_connections = self.config.max_connections,
            "MySQL pool bound"
        );

        Ok(Arc::new(MySqlTenantPool { pool }))
    }

    fn backend_name(&self) -> &'static str {
        "mysql"
    }
}

/// A tenant's MySQL pool
pub struct MySqlTenantPool {
    pool: MySqlPool,
}

#[async_trait]
impl SqlPool for MySqlTenantPool {
    async fn ping(&self) -> Result<(), PoolError> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    // Text protocol, like an interactive client: no prepare step, so any
    // statement type the server accepts can run.
    #[allow(deprecated)]
    async fn execute(&self, sql: &str) -> Result<ResultSet, PoolError> {
        let mut rows = Vec::new();
        let mut affected_rows = 0u64;
        let mut last_insert_id = 0u64;

        let mut stream = sqlx::raw_sql(sql).fetch_many(&self.pool);
        while let Some(step) = stream.try_next().await? {
            match step {
                Either::Left(done) => {
                    affected_rows += done.rows_affected();
                    if done.last_insert_id() != 0 {
                        last_insert_id = done.last_insert_id();
                    }
                }
                Either::Right(row) => rows.push(decode_row(&row)?),
            }
        }

        if !rows.is_empty() || returns_rows(sql) {
            Ok(ResultSet::Rows(rows))
        } else {
            Ok(ResultSet::Affected {
                affected_rows,
                last_insert_id,
            })
        }
    }

    fn status(&self) -> PoolStatus {
        PoolStatus {
            size: self.pool.size(),
            idle: self.pool.num_idle() as u32,
        }
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode_row(row: &MySqlRow) -> Result<Row, PoolError> {
    let mut columns = Vec::with_capacity(row.len());

    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_value(row, idx, column.type_info().name()).map_err(|e| {
            PoolError::Decode {
                column: column.name().to_string(),
                message: e.to_string(),
            }
        })?;
        columns.push((column.name().to_string(), value));
    }

    Ok(Row::new(columns))
}

fn decode_value(row: &MySqlRow, idx: usize, type_name: &str) -> Result<SqlValue, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(SqlValue::Null);
    }

    let value = match type_name {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            SqlValue::Int(row.try_get_unchecked::<i64, _>(idx)?)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => SqlValue::UInt(row.try_get_unchecked::<u64, _>(idx)?),
        "FLOAT" | "DOUBLE" => SqlValue::Float(row.try_get_unchecked::<f64, _>(idx)?),
        "DECIMAL" => SqlValue::Decimal(row.try_get_unchecked::<String, _>(idx)?),
        "DATE" => SqlValue::Date(row.try_get_unchecked::<String, _>(idx)?),
        "TIME" => SqlValue::Time(row.try_get_unchecked::<String, _>(idx)?),
        "DATETIME" | "TIMESTAMP" => {
            SqlValue::DateTime(normalize_datetime(row.try_get_unchecked::<String, _>(idx)?))
        }
        "JSON" => {
            let text = row.try_get_unchecked::<String, _>(idx)?;
            match serde_json::from_str(&text) {
                Ok(json) => SqlValue::Json(json),
                Err(_) => SqlValue::Text(text),
            }
        }
        "CHAR" | "VARCHAR" | "TEXT" | "ENUM" | "SET" => {
            SqlValue::Text(row.try_get_unchecked::<String, _>(idx)?)
        }
        "BINARY" | "VARBINARY" | "BLOB" | "BIT" | "GEOMETRY" => {
            SqlValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(idx)?)
        }
        "NULL" => SqlValue::Null,
        _ => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
            match String::from_utf8(bytes) {
                Ok(text) => SqlValue::Text(text),
                Err(e) => SqlValue::Bytes(e.into_bytes()),
            }
        }
    };

    Ok(value)
}

/// Render `YYYY-MM-DD hh:mm:ss[.fff]` as ISO 8601. Values chrono cannot
/// represent, such as zero dates, are returned as sent by the server.
fn normalize_datetime(text: String) -> String {
    match NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f") {
        Ok(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        Err(_) => text,
    }
}
