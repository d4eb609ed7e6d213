// Lightweight "looking for company" records created by the matching flow.
// This engine only cancels them on the owner's behalf.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IntentRow {
    pub intent_id: String,
    pub user_id: String,
    pub note: Option<String>,
    pub status: String,
    pub created_at: String,
    pub cancelled_at: Option<String>,
}
