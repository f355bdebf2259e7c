//! Registry statistics and info structures

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::pool::PoolStatus;
use crate::tenant::TenantKey;

/// Registry-wide statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistryStats {
    pub tenants: usize,
    pub connections: u64,
    pub idle_connections: u64,
}

/// Information about one registered tenant pool. Never carries the password.
#[derive(Debug, Clone, Serialize)]
pub struct TenantPoolInfo {
    pub tenant: TenantKey,
    pub pool_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub host: String,
    pub user: String,
    pub database: String,
    pub connections: PoolStatus,
}
