//! Tenant pool registry.
//!
//! Maps a tenant key to the one pool opened for it. The first lookup for a key
//! opens the pool with the caller's parameters; every later lookup returns that
//! same pool, whatever parameters it carries. The registry indexes by tenant
//! identity only.
//!
//! # Creation
//!
//! Creation is serialized per key: concurrent first lookups for one tenant wait
//! on a per-key lock, and only the first opens a pool. The others re-check the
//! map after acquiring the lock and return the installed pool. The lock covers
//! check-then-create only; queries run on the returned pool without it.
//!
//! A failed creation stores nothing, so the next lookup for the key retries.
//! The per-key lock is released by whichever caller finishes last, on success,
//! failure or cancellation alike.

mod stats;

pub use stats::{RegistryStats, TenantPoolInfo};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics::RegistryMetrics;
use crate::pool::{PoolFactory, SqlPool};
use crate::tenant::{ConnectionParams, TenantKey};

/// A registered pool together with the identity it was created under
pub struct PoolEntry {
    pub id: Uuid,
    pub tenant: TenantKey,
    pub created_at: DateTime<Utc>,
    params: ConnectionParams,
    pool: Arc<dyn SqlPool>,
}

impl PoolEntry {
    fn new(tenant: TenantKey, params: ConnectionParams, pool: Arc<dyn SqlPool>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant,
            created_at: Utc::now(),
            params,
            pool,
        }
    }

    pub fn pool(&self) -> &Arc<dyn SqlPool> {
        &self.pool
    }

    /// Whether `params` are the ones this pool was opened with
    pub fn matches(&self, params: &ConnectionParams) -> bool {
        &self.params == params
    }

    pub fn info(&self) -> TenantPoolInfo {
        TenantPoolInfo {
            tenant: self.tenant.clone(),
            pool_id: self.id,
            created_at: self.created_at,
            host: self.params.host.clone(),
            user: self.params.user.clone(),
            database: self.params.database.clone(),
            connections: self.pool.status(),
        }
    }
}

/// Result of a registry lookup
pub struct PoolLookup {
    pub entry: Arc<PoolEntry>,
    /// True if this lookup opened the pool
    pub created: bool,
}

/// Holds a share of a key's creation lock. On drop the map entry is removed
/// once no other lookup holds the lock.
struct CreationSlot<'a> {
    locks: &'a DashMap<TenantKey, Arc<Mutex<()>>>,
    tenant: &'a TenantKey,
    lock: Option<Arc<Mutex<()>>>,
}

impl<'a> CreationSlot<'a> {
    fn acquire(locks: &'a DashMap<TenantKey, Arc<Mutex<()>>>, tenant: &'a TenantKey) -> Self {
        let lock = locks.entry(tenant.clone()).or_default().clone();
        Self {
            locks,
            tenant,
            lock: Some(lock),
        }
    }

    fn lock(&self) -> Arc<Mutex<()>> {
        self.lock.clone().unwrap_or_default()
    }
}

impl Drop for CreationSlot<'_> {
    fn drop(&mut self) {
        if let Some(lock) = self.lock.take() {
            drop(lock);
            // Only the map's own reference left: nobody is waiting on it
            self.locks
                .remove_if(self.tenant, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}

/// Process-wide mapping from tenant key to pool
pub struct TenantPoolRegistry {
    factory: Arc<dyn PoolFactory>,
    /// tenant -> registered pool
    pools: DashMap<TenantKey, Arc<PoolEntry>>,
    /// tenant -> creation lock, present only while a lookup for the key is
    /// creating or waiting to create
    creation_locks: DashMap<TenantKey, Arc<Mutex<()>>>,
    reject_credential_mismatch: bool,
}

impl TenantPoolRegistry {
    pub fn new(factory: Arc<dyn PoolFactory>) -> Self {
        Self {
            factory,
            pools: DashMap::new(),
            creation_locks: DashMap::new(),
            reject_credential_mismatch: false,
        }
    }

    /// Fail lookups whose parameters differ from the registered pool's,
    /// instead of silently reusing it
    pub fn with_credential_mismatch_rejection(mut self, reject: bool) -> Self {
        self.reject_credential_mismatch = reject;
        self
    }

    /// Return the tenant's pool, opening it on first use.
    ///
    /// The new pool connects lazily; an unreachable database surfaces on first
    /// use, not here.
    pub async fn get_or_create(
        &self,
        tenant: &TenantKey,
        params: &ConnectionParams,
    ) -> Result<PoolLookup> {
        self.lookup(tenant, params, false).await
    }

    /// Like [`get_or_create`](Self::get_or_create), but a newly opened pool is
    /// only registered after a successful ping.
    ///
    /// An existing pool is returned as-is; callers that need proof of
    /// connectivity must ping it when `created` is false.
    pub async fn get_or_create_verified(
        &self,
        tenant: &TenantKey,
        params: &ConnectionParams,
    ) -> Result<PoolLookup> {
        self.lookup(tenant, params, true).await
    }

    async fn lookup(
        &self,
        tenant: &TenantKey,
        params: &ConnectionParams,
        verify: bool,
    ) -> Result<PoolLookup> {
        if let Some(entry) = self.existing(tenant, params)? {
            return Ok(PoolLookup {
                entry,
                created: false,
            });
        }

        // Declared before the guard so the mutex is unlocked before the slot
        // releases its map entry
        let slot = CreationSlot::acquire(&self.creation_locks, tenant);
        let _guard = slot.lock().lock_owned().await;

        // Another caller may have installed the pool while we waited
        if let Some(entry) = self.existing(tenant, params)? {
            return Ok(PoolLookup {
                entry,
                created: false,
            });
        }

        let pool = match self.factory.open(params).await {
            Ok(pool) => pool,
            Err(e) => {
                RegistryMetrics::record_creation_failed();
                tracing::warn!(
                    tenant = %tenant,
                    target_db = %params.display_target(),
                    error = %e,
                    "Failed to open tenant pool"
                );
                return Err(AppError::Connection(e.to_string()));
            }
        };

        if verify {
            if let Err(e) = pool.ping().await {
                pool.close().await;
                RegistryMetrics::record_creation_failed();
                tracing::warn!(
                    tenant = %tenant,
                    target_db = %params.display_target(),
                    error = %e,
                    "Tenant pool failed verification, not registered"
                );
                return Err(AppError::Connection(e.to_string()));
            }
        }

        let entry = Arc::new(PoolEntry::new(tenant.clone(), params.clone(), pool));
        self.pools.insert(tenant.clone(), entry.clone());

        RegistryMetrics::record_created();
        RegistryMetrics::set_registered(self.pools.len());
        tracing::info!(
            tenant = %tenant,
            pool_id = %entry.id,
            backend = self.factory.backend_name(),
            target_db = %params.display_target(),
            verified = verify,
            "Tenant pool created"
        );

        Ok(PoolLookup {
            entry,
            created: true,
        })
    }

    fn existing(
        &self,
        tenant: &TenantKey,
        params: &ConnectionParams,
    ) -> Result<Option<Arc<PoolEntry>>> {
        let Some(entry) = self.pools.get(tenant).map(|e| e.value().clone()) else {
            return Ok(None);
        };

        if !entry.matches(params) {
            RegistryMetrics::record_mismatch();
            if self.reject_credential_mismatch {
                tracing::warn!(
                    tenant = %tenant,
                    pool_id = %entry.id,
                    "Rejected lookup with differing connection parameters"
                );
                return Err(AppError::CredentialMismatch {
                    tenant: tenant.clone(),
                });
            }
            tracing::debug!(
                tenant = %tenant,
                pool_id = %entry.id,
                registered = %entry.params.display_target(),
                requested = %params.display_target(),
                "Connection parameters differ from registered pool, reusing it"
            );
        }

        RegistryMetrics::record_hit();
        Ok(Some(entry))
    }

    pub fn get(&self, tenant: &TenantKey) -> Option<Arc<PoolEntry>> {
        self.pools.get(tenant).map(|e| e.value().clone())
    }

    pub fn contains(&self, tenant: &TenantKey) -> bool {
        self.pools.contains_key(tenant)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Info for every registered pool, ordered by tenant key
    pub fn snapshot(&self) -> Vec<TenantPoolInfo> {
        let mut pools: Vec<TenantPoolInfo> =
            self.pools.iter().map(|entry| entry.value().info()).collect();
        pools.sort_by(|a, b| a.tenant.as_str().cmp(b.tenant.as_str()));
        pools
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for entry in self.pools.iter() {
            let status = entry.value().pool().status();
            stats.tenants += 1;
            stats.connections += status.size as u64;
            stats.idle_connections += status.idle as u64;
        }
        stats
    }

    /// Close and drop every pool. Only meant for process shutdown.
    pub async fn close_all(&self) -> usize {
        let keys: Vec<TenantKey> = self.pools.iter().map(|e| e.key().clone()).collect();
        let entries: Vec<Arc<PoolEntry>> = keys
            .iter()
            .filter_map(|key| self.pools.remove(key).map(|(_, entry)| entry))
            .collect();

        futures::future::join_all(entries.iter().map(|entry| entry.pool().close())).await;
        RegistryMetrics::set_registered(self.pools.len());

        tracing::info!(closed = entries.len(), "Tenant pools closed");
        entries.len()
    }
}
