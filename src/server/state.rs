use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::gateway::SqlGateway;
use crate::pool::{MySqlPoolFactory, PoolFactory};
use crate::registry::TenantPoolRegistry;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<TenantPoolRegistry>,
    pub gateway: Arc<SqlGateway>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let factory = Arc::new(MySqlPoolFactory::new(settings.database.clone()));
        Self::with_factory(settings, factory)
    }

    /// Build state around a specific pool backend
    pub fn with_factory(settings: Settings, factory: Arc<dyn PoolFactory>) -> Self {
        let registry = Arc::new(
            TenantPoolRegistry::new(factory)
                .with_credential_mismatch_rejection(settings.database.reject_credential_mismatch),
        );
        let gateway = Arc::new(SqlGateway::new(registry.clone(), &settings.database));

        Self {
            settings: Arc::new(settings),
            registry,
            gateway,
            start_time: Instant::now(),
        }
    }
}
