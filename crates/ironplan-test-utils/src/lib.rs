//! Shared PostgreSQL fixtures for ironplan integration tests.
//!
//! Every test gets a freshly migrated database inside one server that is
//! shared by the whole test binary.
//!
//! The server comes from `IRONPLAN_TEST_PG_URL` when that is set (for CI
//! runs that start Postgres once up front). Otherwise a container is
//! started through testcontainers on first use.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use ironplan_db::pool;

struct Server {
    base_url: String,
    /// Keeps the container running for the life of the test binary.
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<Server> = OnceCell::const_new();

async fn start_server() -> Server {
    if let Ok(url) = std::env::var("IRONPLAN_TEST_PG_URL") {
        return Server {
            base_url: url.trim_end_matches('/').to_owned(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("18")
        .start()
        .await
        .expect("failed to start PostgreSQL container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    Server {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Server root URL (no database name) of the shared test PostgreSQL.
pub async fn pg_url() -> &'static str {
    &SERVER.get_or_init(start_server).await.base_url
}

async fn connect(url: &str, max_connections: u32) -> PgPool {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to {url}: {e}"))
}

/// Create a uniquely named database and apply the ironplan migrations.
///
/// Returns the pool and the database name; pass the name to
/// [`drop_test_db`] at the end of the test.
pub async fn create_test_db() -> (PgPool, String) {
    let base_url = pg_url().await;

    let db_name = format!("ironplan_test_{}", Uuid::new_v4().simple());
    let maint = connect(&format!("{base_url}/postgres"), 1).await;
    maint
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create test database {db_name}: {e}"));
    maint.close().await;

    let pool = connect(&format!("{base_url}/{db_name}"), 8).await;
    pool::run_migrations(&pool)
        .await
        .expect("migrations should apply to a fresh database");

    (pool, db_name)
}

/// Drop a database created by [`create_test_db`], disconnecting any
/// remaining sessions first. Dropping a missing database is not an error.
pub async fn drop_test_db(db_name: &str) {
    let base_url = pg_url().await;
    let maint = connect(&format!("{base_url}/postgres"), 1).await;

    let terminate = format!(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
    );
    let _ = maint.execute(terminate.as_str()).await;
    let _ = maint
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;
    maint.close().await;
}
