pub mod activity_repo;
pub mod intent_repo;
pub mod participant_repo;
pub mod quota_repo;
pub mod schema;
