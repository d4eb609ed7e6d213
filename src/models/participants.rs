// Membership rows are never deleted; leaving flips status to 'quit' so a
// later re-join updates the same row instead of inserting a duplicate.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantRow {
    pub activity_id: String,
    pub user_id: String,
    pub status: String,
    pub joined_at: String,
    pub updated_at: String,
}

impl ParticipantRow {
    pub fn is_joined(&self) -> bool {
        self.status == "joined"
    }
}
