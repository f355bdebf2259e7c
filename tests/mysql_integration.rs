//! Tests against a live MySQL server.
//!
//! Ignored by default. Point them at a disposable database and run with
//! `--ignored`:
//!
//! ```text
//! GATEWAY_TEST_MYSQL_HOST=127.0.0.1:3306 \
//! GATEWAY_TEST_MYSQL_USER=root \
//! GATEWAY_TEST_MYSQL_PASSWORD=secret \
//! GATEWAY_TEST_MYSQL_DATABASE=gateway_test \
//! cargo test --test mysql_integration -- --ignored
//! ```

use std::env;
use std::sync::Arc;

use tenant_sql_gateway::config::DatabaseConfig;
use tenant_sql_gateway::error::AppError;
use tenant_sql_gateway::gateway::SqlGateway;
use tenant_sql_gateway::pool::{MySqlPoolFactory, ResultSet, SqlValue};
use tenant_sql_gateway::registry::TenantPoolRegistry;
use tenant_sql_gateway::tenant::{ConnectionFields, ConnectionParams, TenantKey};

fn live_params() -> ConnectionParams {
    let var = |name: &str| {
        env::var(name).unwrap_or_else(|_| panic!("{} must be set for MySQL integration tests", name))
    };
    ConnectionParams {
        host: var("GATEWAY_TEST_MYSQL_HOST"),
        user: var("GATEWAY_TEST_MYSQL_USER"),
        password: var("GATEWAY_TEST_MYSQL_PASSWORD"),
        database: var("GATEWAY_TEST_MYSQL_DATABASE"),
    }
}

fn live_gateway() -> SqlGateway {
    let config = DatabaseConfig {
        acquire_timeout_seconds: 5,
        ..Default::default()
    };
    let factory = Arc::new(MySqlPoolFactory::new(config.clone()));
    SqlGateway::new(Arc::new(TenantPoolRegistry::new(factory)), &config)
}

fn fields() -> ConnectionFields {
    ConnectionFields::from(live_params())
}

async fn query(gateway: &SqlGateway, tenant: &TenantKey, sql: &str) -> Result<ResultSet, AppError> {
    gateway.execute_query(fields(), tenant, Some(sql.to_string())).await
}

#[tokio::test]
#[ignore]
async fn test_verify_live_connection() {
    let gateway = live_gateway();
    let tenant = TenantKey::from("live");

    gateway.verify_connection(fields(), &tenant).await.unwrap();
    gateway.verify_connection(fields(), &tenant).await.unwrap();
    assert_eq!(gateway.registry().len(), 1);

    gateway.registry().close_all().await;
}

#[tokio::test]
#[ignore]
async fn test_verify_wrong_password_not_registered() {
    let gateway = live_gateway();
    let tenant = TenantKey::from("live-bad");
    let wrong = ConnectionFields {
        password: Some("definitely-not-the-password".into()),
        ..fields()
    };

    let err = gateway.verify_connection(wrong, &tenant).await.unwrap_err();
    assert!(matches!(err, AppError::Connection(_)));
    assert!(!gateway.registry().contains(&tenant));
}

#[tokio::test]
#[ignore]
async fn test_select_one() {
    let gateway = live_gateway();
    let result = query(&gateway, &TenantKey::from("live"), "SELECT 1 AS x")
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!([{"x": 1}])
    );
    gateway.registry().close_all().await;
}

#[tokio::test]
#[ignore]
async fn test_invalid_sql_then_recover() {
    let gateway = live_gateway();
    let tenant = TenantKey::from("live");

    let err = query(&gateway, &tenant, "SELEC 1").await.unwrap_err();
    assert!(matches!(err, AppError::Query(ref m) if m.contains("SQL syntax")));

    let result = query(&gateway, &tenant, "SELECT 2 AS y").await.unwrap();
    assert_eq!(result.row_count(), 1);
    gateway.registry().close_all().await;
}

#[tokio::test]
#[ignore]
async fn test_mutation_and_typed_values() {
    let gateway = live_gateway();
    let tenant = TenantKey::from("live");

    query(&gateway, &tenant, "DROP TABLE IF EXISTS gateway_items")
        .await
        .unwrap();
    query(
        &gateway,
        &tenant,
        "CREATE TABLE gateway_items (
            id INT AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(32) NOT NULL,
            price DECIMAL(10,2),
            created DATETIME,
            note TEXT NULL
        )",
    )
    .await
    .unwrap();

    let inserted = query(
        &gateway,
        &tenant,
        "INSERT INTO gateway_items (name, price, created) VALUES ('widget', 9.99, '2024-01-02 03:04:05')",
    )
    .await
    .unwrap();
    assert_eq!(
        inserted,
        ResultSet::Affected {
            affected_rows: 1,
            last_insert_id: 1
        }
    );

    let rows = query(&gateway, &tenant, "SELECT id, name, price, created, note FROM gateway_items")
        .await
        .unwrap();
    let ResultSet::Rows(rows) = rows else {
        panic!("expected rows");
    };
    assert_eq!(rows[0].get("id"), Some(&SqlValue::Int(1)));
    assert_eq!(rows[0].get("name"), Some(&SqlValue::Text("widget".into())));
    assert_eq!(rows[0].get("price"), Some(&SqlValue::Decimal("9.99".into())));
    assert_eq!(rows[0].get("note"), Some(&SqlValue::Null));
    assert!(matches!(rows[0].get("created"), Some(SqlValue::DateTime(_))));

    let empty = query(&gateway, &tenant, "SELECT id FROM gateway_items WHERE id < 0")
        .await
        .unwrap();
    assert_eq!(empty, ResultSet::Rows(vec![]));

    query(&gateway, &tenant, "DROP TABLE gateway_items").await.unwrap();
    gateway.registry().close_all().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_concurrent_queries_on_one_tenant() {
    let gateway = Arc::new(live_gateway());
    let tenant = TenantKey::from("live");

    let handles: Vec<_> = (0..16i64)
        .map(|i| {
            let gateway = gateway.clone();
            let tenant = tenant.clone();
            tokio::spawn(async move {
                let result = query(&gateway, &tenant, &format!("SELECT {} AS v", i))
                    .await
                    .unwrap();
                (i, result)
            })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.await.unwrap();
        let ResultSet::Rows(rows) = result else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].get("v"), Some(&SqlValue::Int(i)));
    }
    assert_eq!(gateway.registry().len(), 1);
    gateway.registry().close_all().await;
}
