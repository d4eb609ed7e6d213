// The user aggregate is externally owned; this engine only reads and
// conditionally decrements the daily creation allowance. The nightly reset
// job lives outside this crate.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserQuotaRow {
    pub user_id: String,
    pub ai_create_quota_today: i64,
}
