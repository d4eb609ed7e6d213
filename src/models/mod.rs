pub mod activities;
pub mod intents;
pub mod participants;
pub mod users;

pub use activities::{ActivityCategory, ActivityRow, ActivityStatus};
pub use intents::IntentRow;
pub use participants::ParticipantRow;
pub use users::UserQuotaRow;
