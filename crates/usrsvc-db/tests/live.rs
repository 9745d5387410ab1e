//! Live integration tests for usrsvc-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/usrsvc-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory. Run with `DATABASE_URL` set and `--ignored`.

use chrono::{Duration, Utc};
use usrsvc_core::UserStatus;
use usrsvc_db::{
    get_user_by_id, health_check, list_stale_users, list_users_created_after, run_migrations,
    update_user, update_user_status,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Insert a user created `age_days` ago and return its generated `id`.
async fn insert_test_user(pool: &sqlx::PgPool, name: &str, age_days: i64) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (name, email, status, created_at) \
         VALUES ($1, $2, 1, $3) RETURNING id",
    )
    .bind(name)
    .bind(format!("{name}@example.com"))
    .bind(Utc::now() - Duration::days(age_days))
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_test_user failed for '{name}': {e}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[ignore = "requires DATABASE_URL"]
#[sqlx::test(migrations = "../../migrations")]
async fn get_user_by_id_returns_none_for_unknown_id(pool: sqlx::PgPool) {
    let row = get_user_by_id(&pool, Uuid::new_v4()).await.expect("query");
    assert!(row.is_none());
}

#[ignore = "requires DATABASE_URL"]
#[sqlx::test(migrations = "../../migrations")]
async fn list_users_created_after_filters_by_date(pool: sqlx::PgPool) {
    insert_test_user(&pool, "old", 400).await;
    let recent = insert_test_user(&pool, "recent", 1).await;

    let rows = list_users_created_after(&pool, Utc::now() - Duration::days(30))
        .await
        .expect("query");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, recent);
}

#[ignore = "requires DATABASE_URL"]
#[sqlx::test(migrations = "../../migrations")]
async fn update_user_keeps_fields_passed_as_none(pool: sqlx::PgPool) {
    let id = insert_test_user(&pool, "keeper", 1).await;

    let row = update_user(&pool, id, None, Some("new@example.com"), 2)
        .await
        .expect("update")
        .expect("row exists");
    assert_eq!(row.name, "keeper");
    assert_eq!(row.email, "new@example.com");
    assert_eq!(row.status, 2);
}

#[ignore = "requires DATABASE_URL"]
#[sqlx::test(migrations = "../../migrations")]
async fn update_user_returns_none_for_unknown_id(pool: sqlx::PgPool) {
    let row = update_user(&pool, Uuid::new_v4(), Some("x"), None, 1)
        .await
        .expect("update");
    assert!(row.is_none());
}

#[ignore = "requires DATABASE_URL"]
#[sqlx::test(migrations = "../../migrations")]
async fn list_stale_users_uses_month_threshold(pool: sqlx::PgPool) {
    let stale = insert_test_user(&pool, "stale", 200).await;
    insert_test_user(&pool, "fresh", 10).await;

    let rows = list_stale_users(&pool, 5).await.expect("query");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, stale);
}

#[ignore = "requires DATABASE_URL"]
#[sqlx::test(migrations = "../../migrations")]
async fn update_user_status_reports_whether_a_row_matched(pool: sqlx::PgPool) {
    let id = insert_test_user(&pool, "target", 1).await;

    let matched = update_user_status(&pool, id, UserStatus::Demoted.as_i16())
        .await
        .expect("update");
    assert!(matched);

    let missing = update_user_status(&pool, Uuid::new_v4(), UserStatus::Demoted.as_i16())
        .await
        .expect("update");
    assert!(!missing);

    let row = get_user_by_id(&pool, id).await.expect("query").expect("row");
    assert_eq!(row.status, UserStatus::Demoted.as_i16());
}

#[ignore = "requires DATABASE_URL"]
#[sqlx::test(migrations = "../../migrations")]
async fn migrations_are_idempotent_and_pool_is_healthy(pool: sqlx::PgPool) {
    // The harness already applied every migration.
    assert_eq!(run_migrations(&pool).await.expect("migrate"), 0);
    health_check(&pool).await.expect("health check");
}
