//! Tenant connection pools.
//!
//! - `backend`: `PoolFactory` / `SqlPool` traits shared by all drivers
//! - `mysql`: sqlx-based MySQL implementation
//! - `result`: engine-agnostic rows and values

pub mod backend;
pub mod mysql;
pub mod result;

pub use backend::{PoolError, PoolFactory, PoolStatus, SqlPool};
pub use mysql::{MySqlPoolFactory, MySqlTenantPool};
pub use result::{returns_rows, ResultSet, Row, SqlValue};
