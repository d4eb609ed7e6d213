use sqlx::SqlitePool;

use crate::models::ParticipantRow;

const SQL_FIND_PARTICIPANT: &str = r#"
SELECT activity_id, user_id, status, joined_at, updated_at
FROM activity_participants
WHERE activity_id = ? AND user_id = ?
LIMIT 1
"#;

pub async fn find_participant(
    pool: &SqlitePool,
    activity_id: &str,
    user_id: &str,
) -> sqlx::Result<Option<ParticipantRow>> {
    sqlx::query_as::<_, ParticipantRow>(SQL_FIND_PARTICIPANT)
        .bind(activity_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

const SQL_LIST_JOINED: &str = r#"
SELECT activity_id, user_id, status, joined_at, updated_at
FROM activity_participants
WHERE activity_id = ? AND status = 'joined'
ORDER BY datetime(joined_at) ASC, user_id ASC
LIMIT ?
"#;

pub async fn list_joined(
    pool: &SqlitePool,
    activity_id: &str,
    limit: i64,
) -> sqlx::Result<Vec<ParticipantRow>> {
    sqlx::query_as::<_, ParticipantRow>(SQL_LIST_JOINED)
        .bind(activity_id)
        .bind(limit)
        .fetch_all(pool)
        .await
}

// Membership upsert. A fresh pair inserts; a 'quit' row flips back to
// 'joined'; an existing 'joined' row matches the conflict arm but fails its
// WHERE, reporting zero rows so the caller can back out.
const SQL_UPSERT_JOINED: &str = r#"
INSERT INTO activity_participants (activity_id, user_id, status, joined_at, updated_at)
VALUES (?, ?, 'joined', ?, ?)
ON CONFLICT(activity_id, user_id) DO UPDATE
SET status = 'joined', updated_at = excluded.updated_at
WHERE activity_participants.status = 'quit'
"#;

// The admission guard. The counter moves only while the activity is active
// and strictly below capacity; rows_affected tells us whether this call won
// the slot. Two raced joins can never both pass a one-slot gap because the
// check and the increment are one statement.
const SQL_GUARDED_INCREMENT: &str = r#"
UPDATE activities
SET current_participants = current_participants + 1, updated_at = ?
WHERE activity_id = ?
  AND status = 'active'
  AND current_participants < max_participants
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Admitted,
    CapacityExhausted,
    AlreadyJoined,
}

/// Admits one user: membership upsert plus guarded counter increment in a
/// single transaction. Either both land or neither does. The upsert runs
/// first so a duplicate join on a full activity reports AlreadyJoined, not
/// capacity.
pub async fn join_guarded(
    pool: &SqlitePool,
    activity_id: &str,
    user_id: &str,
    now: &str,
) -> sqlx::Result<JoinOutcome> {
    let mut tx = pool.begin().await?;

    let upserted = sqlx::query(SQL_UPSERT_JOINED)
        .bind(activity_id)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if upserted == 0 {
        tx.rollback().await?;
        return Ok(JoinOutcome::AlreadyJoined);
    }

    let admitted = sqlx::query(SQL_GUARDED_INCREMENT)
        .bind(now)
        .bind(activity_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if admitted == 0 {
        // No slot; roll the membership write back with the transaction.
        tx.rollback().await?;
        return Ok(JoinOutcome::CapacityExhausted);
    }

    tx.commit().await?;
    Ok(JoinOutcome::Admitted)
}

const SQL_FLIP_TO_QUIT: &str = r#"
UPDATE activity_participants
SET status = 'quit', updated_at = ?
WHERE activity_id = ? AND user_id = ? AND status = 'joined'
"#;

const SQL_DECREMENT_PARTICIPANTS: &str = r#"
UPDATE activities
SET current_participants = current_participants - 1, updated_at = ?
WHERE activity_id = ?
  AND current_participants > 0
"#;

/// Releases one slot. The status flip is the guard: a repeated leave matches
/// zero rows and therefore never decrements twice.
pub async fn leave_guarded(
    pool: &SqlitePool,
    activity_id: &str,
    user_id: &str,
    now: &str,
) -> sqlx::Result<bool> {
    let mut tx = pool.begin().await?;

    let flipped = sqlx::query(SQL_FLIP_TO_QUIT)
        .bind(now)
        .bind(activity_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if flipped == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(SQL_DECREMENT_PARTICIPANTS)
        .bind(now)
        .bind(activity_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}
