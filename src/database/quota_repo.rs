use sqlx::SqlitePool;

use crate::models::UserQuotaRow;

// The user aggregate lives in another service; locally we keep just the
// quota column and seed it lazily so a first-time caller gets the full
// daily allowance. The nightly reset is an external job.
const SQL_ENSURE_USER: &str = r#"
INSERT INTO users (user_id, ai_create_quota_today)
VALUES (?, ?)
ON CONFLICT(user_id) DO NOTHING
"#;

pub async fn ensure_user(
    pool: &SqlitePool,
    user_id: &str,
    daily_allowance: i64,
) -> sqlx::Result<()> {
    sqlx::query(SQL_ENSURE_USER)
        .bind(user_id)
        .bind(daily_allowance)
        .execute(pool)
        .await?;
    Ok(())
}

// Decrement-if-positive in one statement. A read-then-write pair here would
// let two raced publishes both spend the last unit.
const SQL_TRY_CONSUME: &str = r#"
UPDATE users
SET ai_create_quota_today = ai_create_quota_today - 1
WHERE user_id = ? AND ai_create_quota_today > 0
"#;

const SQL_LOAD_QUOTA: &str = r#"
SELECT user_id, ai_create_quota_today
FROM users
WHERE user_id = ?
LIMIT 1
"#;

/// Consumes one unit of the daily allowance. Returns the remaining balance
/// on success, None when the allowance is spent (or the user is unknown).
pub async fn try_consume(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<i64>> {
    let granted = sqlx::query(SQL_TRY_CONSUME)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();
    if granted == 0 {
        return Ok(None);
    }
    let remaining = fetch_remaining(pool, user_id).await?.unwrap_or(0);
    Ok(Some(remaining))
}

const SQL_GIVE_BACK: &str = r#"
UPDATE users
SET ai_create_quota_today = ai_create_quota_today + 1
WHERE user_id = ?
"#;

/// Compensating refund for a publish whose status flip lost its race after
/// quota was already spent.
pub async fn give_back(pool: &SqlitePool, user_id: &str) -> sqlx::Result<()> {
    sqlx::query(SQL_GIVE_BACK)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn fetch_remaining(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<i64>> {
    let row = sqlx::query_as::<_, UserQuotaRow>(SQL_LOAD_QUOTA)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.ai_create_quota_today))
}
