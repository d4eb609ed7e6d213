use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRow {
    pub activity_id: String,
    pub creator_id: String,
    pub status: String,
    pub title: String,
    pub category: String,
    pub location_name: String,
    pub location_hint: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_at: String,
    pub max_participants: i64,
    pub current_participants: i64,
    pub summary: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Lifecycle states. `Completed` is terminal and only ever set by the
/// out-of-process scheduler; no tool in this crate produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Draft,
    Active,
    Cancelled,
    Completed,
}

impl ActivityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityStatus::Draft => "draft",
            ActivityStatus::Active => "active",
            ActivityStatus::Cancelled => "cancelled",
            ActivityStatus::Completed => "completed",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "draft" => Some(ActivityStatus::Draft),
            "active" => Some(ActivityStatus::Active),
            "cancelled" => Some(ActivityStatus::Cancelled),
            "completed" => Some(ActivityStatus::Completed),
            _ => None,
        }
    }
}

impl ActivityRow {
    pub fn status(&self) -> Option<ActivityStatus> {
        ActivityStatus::parse(&self.status)
    }
}

/// Closed category set. Free-text categories are rejected at the tool
/// boundary so downstream filtering stays cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Food,
    Sports,
    Games,
    Outdoor,
    Culture,
    Social,
    Other,
}

impl ActivityCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityCategory::Food => "food",
            ActivityCategory::Sports => "sports",
            ActivityCategory::Games => "games",
            ActivityCategory::Outdoor => "outdoor",
            ActivityCategory::Culture => "culture",
            ActivityCategory::Social => "social",
            ActivityCategory::Other => "other",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "food" => Some(ActivityCategory::Food),
            "sports" => Some(ActivityCategory::Sports),
            "games" => Some(ActivityCategory::Games),
            "outdoor" => Some(ActivityCategory::Outdoor),
            "culture" => Some(ActivityCategory::Culture),
            "social" => Some(ActivityCategory::Social),
            "other" => Some(ActivityCategory::Other),
            _ => None,
        }
    }
}
