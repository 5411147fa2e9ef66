use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/ironplan-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Tables owned by the schema, parents before children.
pub const TABLES: [&str; 7] = [
    "programs",
    "program_workouts",
    "program_exercises",
    "user_programs",
    "exercise_progress",
    "workout_sessions",
    "completed_sets",
];

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Create a connection pool sized from the config.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.database_url))
}

/// Apply pending embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!("migrations applied");
    Ok(())
}

/// Create the configured database through the `postgres` maintenance
/// database unless it already exists.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let db_name = config
        .database_name()
        .context("could not determine database name from URL")?;
    // CREATE DATABASE takes no bind parameters.
    if !is_plain_identifier(db_name) {
        bail!("database name {db_name:?} contains invalid characters");
    }

    let maintenance_url = config.maintenance_url();
    let maint_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&maintenance_url)
        .await
        .with_context(|| format!("failed to connect to maintenance database at {maintenance_url}"))?;

    let result = create_if_missing(&maint_pool, db_name).await;
    maint_pool.close().await;
    result
}

async fn create_if_missing(maint_pool: &PgPool, db_name: &str) -> Result<()> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(maint_pool)
            .await
            .context("failed to query pg_database")?;

    if exists {
        info!(db = db_name, "database already exists");
        return Ok(());
    }

    maint_pool
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .with_context(|| format!("failed to create database {db_name}"))?;
    info!(db = db_name, "database created");
    Ok(())
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Row counts for every table in [`TABLES`], in that order.
///
/// Printed by `ironplan db-init` on success.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(String, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table.to_owned(), count));
    }
    Ok(counts)
}
