//! In-process pool backend shared by the integration tests.
//!
//! Understands just enough SQL to exercise the gateway: `SELECT <int> AS <name>`,
//! `INSERT ...`, and anything starting with `SELEC ` is a syntax error.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tenant_sql_gateway::config::Settings;
use tenant_sql_gateway::pool::{
    PoolError, PoolFactory, PoolStatus, ResultSet, Row, SqlPool, SqlValue,
};
use tenant_sql_gateway::server::AppState;
use tenant_sql_gateway::tenant::{ConnectionFields, ConnectionParams};

pub const SYNTAX_ERROR: &str =
    "You have an error in your SQL syntax; check the manual that corresponds to your MySQL server version";

pub struct FakePool {
    pub params: ConnectionParams,
    reachable: bool,
    query_delay: Option<Duration>,
    pub executed: Mutex<Vec<String>>,
    pub closed: AtomicBool,
}

#[async_trait]
impl SqlPool for FakePool {
    async fn ping(&self) -> Result<(), PoolError> {
        if self.reachable {
            Ok(())
        } else {
            Err(PoolError::Unavailable(format!(
                "connect ECONNREFUSED {}",
                self.params.host
            )))
        }
    }

    async fn execute(&self, sql: &str) -> Result<ResultSet, PoolError> {
        if let Some(delay) = self.query_delay {
            tokio::time::sleep(delay).await;
        }
        self.ping().await?;
        self.executed.lock().unwrap().push(sql.to_string());
        run_fake_sql(sql)
    }

    fn status(&self) -> PoolStatus {
        PoolStatus { size: 1, idle: 1 }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn run_fake_sql(sql: &str) -> Result<ResultSet, PoolError> {
    let upper = sql.trim().to_ascii_uppercase();

    if upper.starts_with("INSERT") || upper.starts_with("UPDATE") || upper.starts_with("DELETE") {
        return Ok(ResultSet::Affected {
            affected_rows: 1,
            last_insert_id: 42,
        });
    }

    // SELECT <int> AS <name>
    let parts: Vec<&str> = sql.split_whitespace().collect();
    if let [select, value, as_kw, name] = parts.as_slice() {
        if select.eq_ignore_ascii_case("SELECT") && as_kw.eq_ignore_ascii_case("AS") {
            if let Ok(value) = value.parse::<i64>() {
                return Ok(ResultSet::Rows(vec![Row::new(vec![(
                    name.to_string(),
                    SqlValue::Int(value),
                )])]));
            }
        }
    }

    Err(PoolError::Unavailable(SYNTAX_ERROR.to_string()))
}

#[derive(Default)]
pub struct FakeFactory {
    pub opens: AtomicUsize,
    pub unreachable: AtomicBool,
    pub open_delay: Option<Duration>,
    pub query_delay: Option<Duration>,
    pub pools: Mutex<Vec<Arc<FakePool>>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn last_pool(&self) -> Option<Arc<FakePool>> {
        self.pools.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PoolFactory for FakeFactory {
    async fn open(&self, params: &ConnectionParams) -> Result<Arc<dyn SqlPool>, PoolError> {
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        self.opens.fetch_add(1, Ordering::SeqCst);

        let pool = Arc::new(FakePool {
            params: params.clone(),
            reachable: !self.unreachable.load(Ordering::SeqCst),
            query_delay: self.query_delay,
            executed: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        });
        self.pools.lock().unwrap().push(pool.clone());
        Ok(pool)
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}

pub fn params(host: &str) -> ConnectionParams {
    ConnectionParams {
        host: host.to_string(),
        user: "app".to_string(),
        password: "secret".to_string(),
        database: "tenant_db".to_string(),
    }
}

pub fn fields(host: &str) -> ConnectionFields {
    ConnectionFields::from(params(host))
}

pub fn state_with(factory: Arc<FakeFactory>, settings: Settings) -> AppState {
    AppState::with_factory(settings, factory)
}

pub fn test_state(factory: Arc<FakeFactory>) -> AppState {
    state_with(factory, Settings::default())
}
