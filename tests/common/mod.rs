#![allow(dead_code)]

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;

use rally::database::schema;
use rally::services::activity_service::{self, CreateDraftInput};

pub struct TestCtx {
    pub pool: SqlitePool,
    // Held so the database file outlives the test body.
    _dir: TempDir,
}

/// Fresh file-backed SQLite per test. A file (not :memory:) because the
/// concurrency tests need several pool connections sharing one database.
pub async fn setup() -> TestCtx {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("rally-test.db"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .expect("connect test db");
    schema::apply_schema(&pool).await.expect("apply schema");
    TestCtx { pool, _dir: dir }
}

pub async fn set_quota(pool: &SqlitePool, user_id: &str, quota: i64) {
    sqlx::query(
        "INSERT INTO users (user_id, ai_create_quota_today) VALUES (?, ?) \
         ON CONFLICT(user_id) DO UPDATE SET ai_create_quota_today = excluded.ai_create_quota_today",
    )
    .bind(user_id)
    .bind(quota)
    .execute(pool)
    .await
    .expect("set quota");
}

pub async fn quota_of(pool: &SqlitePool, user_id: &str) -> i64 {
    rally::database::quota_repo::fetch_remaining(pool, user_id)
        .await
        .expect("fetch quota")
        .expect("user row")
}

pub fn future_time(hours: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::hours(hours)).to_rfc3339()
}

pub fn draft_input(title: &str, max_participants: i64) -> CreateDraftInput {
    CreateDraftInput {
        title: title.to_string(),
        category: "social".to_string(),
        location_name: "Riverside Park".to_string(),
        location_hint: None,
        latitude: Some(29.5628),
        longitude: Some(106.5528),
        start_at: future_time(24),
        max_participants,
        summary: None,
    }
}

pub async fn create_draft(pool: &SqlitePool, creator: &str, title: &str, max: i64) -> String {
    let view = activity_service::create_draft(pool, creator, &draft_input(title, max))
        .await
        .expect("create draft");
    view.activity_id
}

/// Draft + publish in one go; leaves the creator with whatever quota was
/// seeded minus one.
pub async fn create_published(pool: &SqlitePool, creator: &str, title: &str, max: i64) -> String {
    let activity_id = create_draft(pool, creator, title, max).await;
    activity_service::publish_activity(pool, creator, &activity_id)
        .await
        .expect("publish");
    activity_id
}

pub async fn set_status(pool: &SqlitePool, activity_id: &str, status: &str) {
    sqlx::query("UPDATE activities SET status = ? WHERE activity_id = ?")
        .bind(status)
        .bind(activity_id)
        .execute(pool)
        .await
        .expect("set status");
}

pub async fn backdate_start(pool: &SqlitePool, activity_id: &str, hours_ago: i64) {
    let past = (chrono::Utc::now() - chrono::Duration::hours(hours_ago)).to_rfc3339();
    sqlx::query("UPDATE activities SET start_at = ? WHERE activity_id = ?")
        .bind(past)
        .bind(activity_id)
        .execute(pool)
        .await
        .expect("backdate start");
}

pub async fn set_created_at(pool: &SqlitePool, activity_id: &str, created_at: &str) {
    sqlx::query("UPDATE activities SET created_at = ? WHERE activity_id = ?")
        .bind(created_at)
        .bind(activity_id)
        .execute(pool)
        .await
        .expect("set created_at");
}

pub async fn current_participants(pool: &SqlitePool, activity_id: &str) -> i64 {
    sqlx::query_scalar("SELECT current_participants FROM activities WHERE activity_id = ?")
        .bind(activity_id)
        .fetch_one(pool)
        .await
        .expect("load counter")
}

pub async fn participant_row_count(pool: &SqlitePool, activity_id: &str, user_id: &str) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM activity_participants WHERE activity_id = ? AND user_id = ?",
    )
    .bind(activity_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .expect("count rows")
}

pub async fn activity_status(pool: &SqlitePool, activity_id: &str) -> String {
    sqlx::query_scalar("SELECT status FROM activities WHERE activity_id = ?")
        .bind(activity_id)
        .fetch_one(pool)
        .await
        .expect("load status")
}
