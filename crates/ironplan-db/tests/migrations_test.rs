//! Schema-level checks for the embedded migrations.

use ironplan_db::pool;
use ironplan_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn migrations_create_every_table() {
    let (pool, db_name) = create_test_db().await;

    let counts = pool::table_counts(&pool).await.expect("table_counts");
    let names: Vec<&str> = counts.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, pool::TABLES);
    for (name, count) in &counts {
        assert_eq!(*count, 0, "{name} should start empty");
    }

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let (pool, db_name) = create_test_db().await;

    pool::run_migrations(&pool)
        .await
        .expect("re-running migrations should be a no-op");

    pool.close().await;
    drop_test_db(&db_name).await;
}
