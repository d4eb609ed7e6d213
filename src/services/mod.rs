pub mod activity_service;
pub mod moderation_service;
pub mod preference_service;
pub mod resolver_service;
pub mod roster_service;
