use sqlx::SqlitePool;

use crate::models::ActivityRow;

const SQL_COLUMNS: &str = r#"
  activity_id,
  creator_id,
  status,
  title,
  category,
  location_name,
  location_hint,
  latitude,
  longitude,
  start_at,
  max_participants,
  current_participants,
  summary,
  cancel_reason,
  created_at,
  updated_at
"#;

pub struct NewActivityDraft<'a> {
    pub activity_id: &'a str,
    pub creator_id: &'a str,
    pub title: &'a str,
    pub category: &'a str,
    pub location_name: &'a str,
    pub location_hint: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_at: &'a str,
    pub max_participants: i64,
    pub summary: Option<&'a str>,
    pub now: &'a str,
}

const SQL_INSERT_DRAFT: &str = r#"
INSERT INTO activities (
  activity_id,
  creator_id,
  status,
  title,
  category,
  location_name,
  location_hint,
  latitude,
  longitude,
  start_at,
  max_participants,
  current_participants,
  summary,
  created_at,
  updated_at
) VALUES (?, ?, 'draft', ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
"#;

const SQL_INSERT_CREATOR_PARTICIPANT: &str = r#"
INSERT INTO activity_participants (activity_id, user_id, status, joined_at, updated_at)
VALUES (?, ?, 'joined', ?, ?)
"#;

/// Creates the draft together with its creator membership row. The creator
/// occupies the first slot, so current_participants starts at 1.
pub async fn insert_draft(pool: &SqlitePool, draft: NewActivityDraft<'_>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query(SQL_INSERT_DRAFT)
        .bind(draft.activity_id)
        .bind(draft.creator_id)
        .bind(draft.title)
        .bind(draft.category)
        .bind(draft.location_name)
        .bind(draft.location_hint)
        .bind(draft.latitude)
        .bind(draft.longitude)
        .bind(draft.start_at)
        .bind(draft.max_participants)
        .bind(draft.summary)
        .bind(draft.now)
        .bind(draft.now)
        .execute(&mut *tx)
        .await?;
    sqlx::query(SQL_INSERT_CREATOR_PARTICIPANT)
        .bind(draft.activity_id)
        .bind(draft.creator_id)
        .bind(draft.now)
        .bind(draft.now)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

pub async fn load_activity_by_id(
    pool: &SqlitePool,
    activity_id: &str,
) -> sqlx::Result<Option<ActivityRow>> {
    let sql = format!(
        "SELECT {SQL_COLUMNS} FROM activities WHERE activity_id = ? LIMIT 1"
    );
    sqlx::query_as::<_, ActivityRow>(&sql)
        .bind(activity_id)
        .fetch_optional(pool)
        .await
}

pub struct DraftFieldPatch<'a> {
    pub title: Option<&'a str>,
    pub category: Option<&'a str>,
    pub location_name: Option<&'a str>,
    pub location_hint: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_at: Option<&'a str>,
    pub max_participants: Option<i64>,
    pub summary: Option<&'a str>,
    pub now: &'a str,
}

// Partial update: absent fields keep their stored value via COALESCE. The
// status/creator guards in the WHERE clause make a raced refinement (draft
// published or cancelled in between) a clean zero-row no-op.
const SQL_UPDATE_DRAFT_FIELDS: &str = r#"
UPDATE activities
SET title            = COALESCE(?, title),
    category         = COALESCE(?, category),
    location_name    = COALESCE(?, location_name),
    location_hint    = COALESCE(?, location_hint),
    latitude         = COALESCE(?, latitude),
    longitude        = COALESCE(?, longitude),
    start_at         = COALESCE(?, start_at),
    max_participants = COALESCE(?, max_participants),
    summary          = COALESCE(?, summary),
    updated_at       = ?
WHERE activity_id = ?
  AND creator_id = ?
  AND status = 'draft'
"#;

pub async fn update_draft_fields(
    pool: &SqlitePool,
    activity_id: &str,
    creator_id: &str,
    patch: DraftFieldPatch<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_DRAFT_FIELDS)
        .bind(patch.title)
        .bind(patch.category)
        .bind(patch.location_name)
        .bind(patch.location_hint)
        .bind(patch.latitude)
        .bind(patch.longitude)
        .bind(patch.start_at)
        .bind(patch.max_participants)
        .bind(patch.summary)
        .bind(patch.now)
        .bind(activity_id)
        .bind(creator_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// draft -> active, guarded on the current status so two raced publishes
// flip it exactly once.
const SQL_MARK_ACTIVE: &str = r#"
UPDATE activities
SET status = 'active', updated_at = ?
WHERE activity_id = ?
  AND creator_id = ?
  AND status = 'draft'
"#;

pub async fn mark_active(
    pool: &SqlitePool,
    activity_id: &str,
    creator_id: &str,
    now: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_MARK_ACTIVE)
        .bind(now)
        .bind(activity_id)
        .bind(creator_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// Cancelling twice is an error, not a no-op, so the guard excludes rows
// that already left the cancellable states.
const SQL_MARK_CANCELLED: &str = r#"
UPDATE activities
SET status = 'cancelled', cancel_reason = ?, updated_at = ?
WHERE activity_id = ?
  AND creator_id = ?
  AND status IN ('draft', 'active')
"#;

pub async fn mark_cancelled(
    pool: &SqlitePool,
    activity_id: &str,
    creator_id: &str,
    reason: Option<&str>,
    now: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_MARK_CANCELLED)
        .bind(reason)
        .bind(now)
        .bind(activity_id)
        .bind(creator_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_created_by(
    pool: &SqlitePool,
    creator_id: &str,
    limit: i64,
) -> sqlx::Result<Vec<ActivityRow>> {
    let sql = format!(
        "SELECT {SQL_COLUMNS} FROM activities \
         WHERE creator_id = ? \
         ORDER BY created_at DESC, activity_id DESC \
         LIMIT ?"
    );
    sqlx::query_as::<_, ActivityRow>(&sql)
        .bind(creator_id)
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn list_joined_by(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> sqlx::Result<Vec<ActivityRow>> {
    let sql = format!(
        "SELECT {SQL_COLUMNS} FROM activities \
         WHERE activity_id IN ( \
           SELECT activity_id FROM activity_participants \
           WHERE user_id = ? AND status = 'joined' \
         ) \
         AND creator_id != ? \
         ORDER BY created_at DESC, activity_id DESC \
         LIMIT ?"
    );
    sqlx::query_as::<_, ActivityRow>(&sql)
        .bind(user_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Recent candidates for loose-reference resolution, newest first. A status
/// filter of None scopes to everything the caller created.
pub async fn list_resolution_candidates(
    pool: &SqlitePool,
    creator_id: &str,
    status: Option<&str>,
    limit: i64,
) -> sqlx::Result<Vec<ActivityRow>> {
    match status {
        Some(status) => {
            let sql = format!(
                "SELECT {SQL_COLUMNS} FROM activities \
                 WHERE creator_id = ? AND status = ? \
                 ORDER BY created_at DESC, activity_id DESC \
                 LIMIT ?"
            );
            sqlx::query_as::<_, ActivityRow>(&sql)
                .bind(creator_id)
                .bind(status)
                .bind(limit)
                .fetch_all(pool)
                .await
        }
        None => list_created_by(pool, creator_id, limit).await,
    }
}
