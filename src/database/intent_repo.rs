use sqlx::SqlitePool;

use crate::models::IntentRow;

const SQL_LOAD_INTENT: &str = r#"
SELECT intent_id, user_id, note, status, created_at, cancelled_at
FROM partner_intents
WHERE intent_id = ?
LIMIT 1
"#;

pub async fn load_intent(pool: &SqlitePool, intent_id: &str) -> sqlx::Result<Option<IntentRow>> {
    sqlx::query_as::<_, IntentRow>(SQL_LOAD_INTENT)
        .bind(intent_id)
        .fetch_optional(pool)
        .await
}

// Guarded flip so a double-tapped cancel lands exactly once.
const SQL_CANCEL_INTENT: &str = r#"
UPDATE partner_intents
SET status = 'cancelled', cancelled_at = ?
WHERE intent_id = ? AND user_id = ? AND status = 'active'
"#;

pub async fn cancel_intent(
    pool: &SqlitePool,
    intent_id: &str,
    user_id: &str,
    now: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_CANCEL_INTENT)
        .bind(now)
        .bind(intent_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_INSERT_INTENT: &str = r#"
INSERT INTO partner_intents (intent_id, user_id, note, status, created_at)
VALUES (?, ?, ?, 'active', ?)
"#;

/// Intents are normally created by the matching flow in another service;
/// this insert backs local development and the test suite.
pub async fn insert_intent(
    pool: &SqlitePool,
    intent_id: &str,
    user_id: &str,
    note: Option<&str>,
    now: &str,
) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_INTENT)
        .bind(intent_id)
        .bind(user_id)
        .bind(note)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}
