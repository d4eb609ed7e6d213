use sqlx::SqlitePool;

const SQL_CREATE_ACTIVITIES: &str = r#"
CREATE TABLE IF NOT EXISTS activities (
  activity_id          TEXT PRIMARY KEY,
  creator_id           TEXT NOT NULL,
  status               TEXT NOT NULL DEFAULT 'draft',
  title                TEXT NOT NULL,
  category             TEXT NOT NULL,
  location_name        TEXT NOT NULL,
  location_hint        TEXT,
  latitude             REAL,
  longitude            REAL,
  start_at             TEXT NOT NULL,
  max_participants     INTEGER NOT NULL,
  current_participants INTEGER NOT NULL DEFAULT 0,
  summary              TEXT,
  cancel_reason        TEXT,
  created_at           TEXT NOT NULL,
  updated_at           TEXT NOT NULL
)
"#;

const SQL_CREATE_ACTIVITY_PARTICIPANTS: &str = r#"
CREATE TABLE IF NOT EXISTS activity_participants (
  activity_id TEXT NOT NULL,
  user_id     TEXT NOT NULL,
  status      TEXT NOT NULL DEFAULT 'joined',
  joined_at   TEXT NOT NULL,
  updated_at  TEXT NOT NULL,
  PRIMARY KEY (activity_id, user_id)
)
"#;

const SQL_CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
  user_id               TEXT PRIMARY KEY,
  ai_create_quota_today INTEGER NOT NULL DEFAULT 0
)
"#;

const SQL_CREATE_PARTNER_INTENTS: &str = r#"
CREATE TABLE IF NOT EXISTS partner_intents (
  intent_id    TEXT PRIMARY KEY,
  user_id      TEXT NOT NULL,
  note         TEXT,
  status       TEXT NOT NULL DEFAULT 'active',
  created_at   TEXT NOT NULL,
  cancelled_at TEXT
)
"#;

const SQL_CREATE_IDX_ACTIVITIES_CREATOR: &str = r#"
CREATE INDEX IF NOT EXISTS idx_activities_creator
ON activities (creator_id, status, created_at)
"#;

const SQL_CREATE_IDX_PARTICIPANTS_USER: &str = r#"
CREATE INDEX IF NOT EXISTS idx_participants_user
ON activity_participants (user_id, status)
"#;

/// Idempotent table bootstrap, run once at startup. Production deployments
/// point RALLY_DATABASE_URL at a provisioned file; tests get a fresh one.
pub async fn apply_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for sql in [
        SQL_CREATE_ACTIVITIES,
        SQL_CREATE_ACTIVITY_PARTICIPANTS,
        SQL_CREATE_USERS,
        SQL_CREATE_PARTNER_INTENTS,
        SQL_CREATE_IDX_ACTIVITIES_CREATOR,
        SQL_CREATE_IDX_PARTICIPANTS_USER,
    ] {
        sqlx::query(sql).execute(pool).await?;
    }
    Ok(())
}
