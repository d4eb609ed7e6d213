use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::{activity_repo, participant_repo, quota_repo};
use crate::error::ServiceError;
use crate::models::{ActivityCategory, ActivityRow, ActivityStatus};
use crate::services::moderation_service;
use crate::services::resolver_service::{self, ActivityRef, AlternativeRef, ResolutionScope};

pub const MIN_PARTICIPANTS: i64 = 2;
pub const MAX_PARTICIPANTS: i64 = 50;
const MAX_TITLE_CHARS: usize = 120;
const PARTICIPANT_PREVIEW_LIMIT: i64 = 5;

pub fn daily_create_quota() -> i64 {
    std::env::var("DAILY_CREATE_QUOTA")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3)
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub fn parse_instant(input: &str) -> Result<DateTime<Utc>, ServiceError> {
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            ServiceError::ValidationFailed(format!(
                "'{input}' is not an RFC 3339 timestamp"
            ))
        })
}

#[derive(Debug, Deserialize)]
pub struct CreateDraftInput {
    pub title: String,
    pub category: String,
    pub location_name: String,
    #[serde(default)]
    pub location_hint: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub start_at: String,
    pub max_participants: i64,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DraftView {
    pub activity_id: String,
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
}

impl DraftView {
    pub fn from_row(row: ActivityRow) -> Self {
        DraftView {
            activity_id: row.activity_id,
            status: row.status,
            title: row.title,
            category: row.category,
            location_name: row.location_name,
            location_hint: row.location_hint,
            latitude: row.latitude,
            longitude: row.longitude,
            start_at: row.start_at,
            max_participants: row.max_participants,
            current_participants: row.current_participants,
            summary: row.summary,
        }
    }
}

fn validate_title(title: &str) -> Result<(), ServiceError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationFailed(
            "title must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(ServiceError::ValidationFailed(format!(
            "title is longer than {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), ServiceError> {
    if ActivityCategory::parse(category).is_none() {
        return Err(ServiceError::ValidationFailed(format!(
            "unknown category '{category}'"
        )));
    }
    Ok(())
}

fn validate_capacity(max_participants: i64) -> Result<(), ServiceError> {
    if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&max_participants) {
        return Err(ServiceError::ValidationFailed(format!(
            "max_participants must be between {MIN_PARTICIPANTS} and {MAX_PARTICIPANTS}"
        )));
    }
    Ok(())
}

fn validate_coordinates(lat: Option<f64>, lon: Option<f64>) -> Result<(), ServiceError> {
    if let Some(lat) = lat {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ServiceError::ValidationFailed(
                "latitude out of range".to_string(),
            ));
        }
    }
    if let Some(lon) = lon {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ServiceError::ValidationFailed(
                "longitude out of range".to_string(),
            ));
        }
    }
    Ok(())
}

pub fn validate_create(input: &CreateDraftInput) -> Result<(), ServiceError> {
    validate_title(&input.title)?;
    validate_category(&input.category)?;
    if input.location_name.trim().is_empty() {
        return Err(ServiceError::ValidationFailed(
            "location_name must not be empty".to_string(),
        ));
    }
    validate_capacity(input.max_participants)?;
    validate_coordinates(input.latitude, input.longitude)?;
    parse_instant(&input.start_at)?;
    Ok(())
}

/// Creates a draft with the caller as its first participant. The draft is
/// invisible for joining until published.
pub async fn create_draft(
    pool: &SqlitePool,
    user_id: &str,
    input: &CreateDraftInput,
) -> Result<DraftView, ServiceError> {
    validate_create(input)?;
    moderation_service::screen_fields(&[
        ("title", Some(input.title.as_str())),
        ("summary", input.summary.as_deref()),
        ("location_hint", input.location_hint.as_deref()),
    ])
    .await?;

    // Lazy quota seed so first-time callers get the full daily allowance.
    quota_repo::ensure_user(pool, user_id, daily_create_quota()).await?;

    let activity_id = Uuid::new_v4().to_string();
    let now = now_rfc3339();
    activity_repo::insert_draft(
        pool,
        activity_repo::NewActivityDraft {
            activity_id: &activity_id,
            creator_id: user_id,
            title: input.title.trim(),
            category: &input.category,
            location_name: input.location_name.trim(),
            location_hint: input.location_hint.as_deref(),
            latitude: input.latitude,
            longitude: input.longitude,
            start_at: &input.start_at,
            max_participants: input.max_participants,
            summary: input.summary.as_deref(),
            now: &now,
        },
    )
    .await?;

    tracing::info!(activity_id = %activity_id, creator_id = %user_id, "draft_created");
    let row = activity_repo::load_activity_by_id(pool, &activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("activity {activity_id}")))?;
    Ok(DraftView::from_row(row))
}

#[derive(Debug, Deserialize)]
pub struct RefineDraftInput {
    pub activity_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub location_hint: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub max_participants: Option<i64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Field-level checks for a refinement patch, applied only to the fields
/// actually present. The roster-shrink check needs the stored row and lives
/// in refine_draft itself.
pub fn validate_refine(input: &RefineDraftInput) -> Result<(), ServiceError> {
    if let Some(title) = input.title.as_deref() {
        validate_title(title)?;
    }
    if let Some(category) = input.category.as_deref() {
        validate_category(category)?;
    }
    if let Some(max) = input.max_participants {
        validate_capacity(max)?;
    }
    validate_coordinates(input.latitude, input.longitude)?;
    if let Some(start_at) = input.start_at.as_deref() {
        parse_instant(start_at)?;
    }
    Ok(())
}

/// Partial update of a draft: only fields present in the request move,
/// everything else keeps its stored value.
pub async fn refine_draft(
    pool: &SqlitePool,
    user_id: &str,
    input: &RefineDraftInput,
) -> Result<DraftView, ServiceError> {
    let activity = activity_repo::load_activity_by_id(pool, &input.activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("activity {}", input.activity_id)))?;
    if activity.creator_id != user_id {
        return Err(ServiceError::Forbidden(
            "only the creator can refine a draft".to_string(),
        ));
    }
    if activity.status() != Some(ActivityStatus::Draft) {
        return Err(ServiceError::InvalidState(format!(
            "activity is {}, only drafts can be refined",
            activity.status
        )));
    }

    validate_refine(input)?;
    if let Some(max) = input.max_participants {
        if max < activity.current_participants {
            return Err(ServiceError::ValidationFailed(format!(
                "cannot shrink capacity below the {} people already in",
                activity.current_participants
            )));
        }
    }

    moderation_service::screen_fields(&[
        ("title", input.title.as_deref()),
        ("summary", input.summary.as_deref()),
        ("location_hint", input.location_hint.as_deref()),
        ("reason", input.reason.as_deref()),
    ])
    .await?;

    if let Some(reason) = input.reason.as_deref() {
        tracing::info!(activity_id = %input.activity_id, reason = %reason, "draft_refined");
    }

    let now = now_rfc3339();
    let updated = activity_repo::update_draft_fields(
        pool,
        &input.activity_id,
        user_id,
        activity_repo::DraftFieldPatch {
            title: input.title.as_deref().map(str::trim),
            category: input.category.as_deref(),
            location_name: input.location_name.as_deref().map(str::trim),
            location_hint: input.location_hint.as_deref(),
            latitude: input.latitude,
            longitude: input.longitude,
            start_at: input.start_at.as_deref(),
            max_participants: input.max_participants,
            summary: input.summary.as_deref(),
            now: &now,
        },
    )
    .await?;
    if updated == 0 {
        // Lost a race with publish or cancel between the read and the write.
        return Err(ServiceError::InvalidState(
            "activity is no longer a draft".to_string(),
        ));
    }

    let row = activity_repo::load_activity_by_id(pool, &input.activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("activity {}", input.activity_id)))?;
    Ok(DraftView::from_row(row))
}

#[derive(Debug, Serialize)]
pub struct PublishConfirmation {
    pub activity_id: String,
    pub status: String,
    pub share_path: String,
    pub remaining_quota: i64,
}

/// Publish = quota admission + draft->active flip. The two guarded updates
/// are separate consistency units; when the flip loses its race the quota
/// unit is refunded as a compensating action.
pub async fn publish_activity(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
) -> Result<PublishConfirmation, ServiceError> {
    let activity = activity_repo::load_activity_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("activity {activity_id}")))?;
    if activity.creator_id != user_id {
        return Err(ServiceError::Forbidden(
            "only the creator can publish".to_string(),
        ));
    }
    if activity.status() != Some(ActivityStatus::Draft) {
        return Err(ServiceError::InvalidState(format!(
            "activity is {}, only drafts can be published",
            activity.status
        )));
    }
    let start_at = parse_instant(&activity.start_at)?;
    if start_at <= Utc::now() {
        return Err(ServiceError::Expired);
    }

    let Some(remaining) = quota_repo::try_consume(pool, user_id).await? else {
        tracing::info!(activity_id = %activity_id, creator_id = %user_id, "publish_quota_exhausted");
        return Err(ServiceError::QuotaExhausted);
    };

    let now = now_rfc3339();
    let flipped = activity_repo::mark_active(pool, activity_id, user_id, &now).await?;
    if flipped == 0 {
        // A concurrent publish or cancel won; hand the quota unit back.
        quota_repo::give_back(pool, user_id).await?;
        return Err(ServiceError::InvalidState(
            "activity is no longer a draft".to_string(),
        ));
    }

    tracing::info!(activity_id = %activity_id, remaining_quota = remaining, "activity_published");
    Ok(PublishConfirmation {
        activity_id: activity_id.to_string(),
        status: ActivityStatus::Active.as_str().to_string(),
        share_path: format!("/activities/{activity_id}"),
        remaining_quota: remaining,
    })
}

#[derive(Debug, Serialize)]
pub struct CancelConfirmation {
    pub activity_id: String,
    pub status: String,
}

/// Cancelling an already-cancelled or completed activity is an error, not a
/// no-op, so the stale branch reports InvalidState.
pub async fn cancel_activity(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
    reason: Option<&str>,
) -> Result<CancelConfirmation, ServiceError> {
    let activity = activity_repo::load_activity_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("activity {activity_id}")))?;
    if activity.creator_id != user_id {
        return Err(ServiceError::Forbidden(
            "only the creator can cancel".to_string(),
        ));
    }
    match activity.status() {
        Some(ActivityStatus::Draft) | Some(ActivityStatus::Active) => {}
        _ => {
            return Err(ServiceError::InvalidState(format!(
                "activity is {} and cannot be cancelled",
                activity.status
            )));
        }
    }

    moderation_service::screen_fields(&[("reason", reason)]).await?;

    let now = now_rfc3339();
    let flipped =
        activity_repo::mark_cancelled(pool, activity_id, user_id, reason, &now).await?;
    if flipped == 0 {
        return Err(ServiceError::InvalidState(
            "activity was already cancelled or completed".to_string(),
        ));
    }

    tracing::info!(activity_id = %activity_id, "activity_cancelled");
    Ok(CancelConfirmation {
        activity_id: activity_id.to_string(),
        status: ActivityStatus::Cancelled.as_str().to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct ParticipantPreview {
    pub user_id: String,
    pub joined_at: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityDetailView {
    pub activity_id: String,
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
    pub is_creator: bool,
    pub is_joined: bool,
    pub can_join: bool,
    pub participants: Vec<ParticipantPreview>,
}

/// Detail lookup. A direct id loads any activity the viewer is allowed to
/// see; a loose reference resolves among the viewer's own recent ones.
pub async fn get_activity_detail(
    pool: &SqlitePool,
    user_id: &str,
    reference: &ActivityRef,
) -> Result<ActivityDetailView, ServiceError> {
    let activity = match reference.activity_id.as_deref() {
        Some(id) => activity_repo::load_activity_by_id(pool, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("activity {id}")))?,
        None => {
            resolver_service::resolve(pool, user_id, reference, ResolutionScope::Mine)
                .await?
                .activity
        }
    };

    // Drafts stay private to their creator until published.
    if activity.status() == Some(ActivityStatus::Draft) && activity.creator_id != user_id {
        return Err(ServiceError::NotFound(format!(
            "activity {}",
            activity.activity_id
        )));
    }

    let is_creator = activity.creator_id == user_id;
    let membership =
        participant_repo::find_participant(pool, &activity.activity_id, user_id).await?;
    let is_joined = membership.as_ref().map(|m| m.is_joined()).unwrap_or(false) || is_creator;

    let start_in_future = parse_instant(&activity.start_at)
        .map(|t| t > Utc::now())
        .unwrap_or(false);
    let can_join = activity.status() == Some(ActivityStatus::Active)
        && !is_creator
        && !is_joined
        && activity.current_participants < activity.max_participants
        && start_in_future;

    let participants = participant_repo::list_joined(
        pool,
        &activity.activity_id,
        PARTICIPANT_PREVIEW_LIMIT,
    )
    .await?
    .into_iter()
    .map(|p| ParticipantPreview {
        user_id: p.user_id,
        joined_at: p.joined_at,
    })
    .collect();

    Ok(ActivityDetailView {
        activity_id: activity.activity_id,
        status: activity.status,
        title: activity.title,
        category: activity.category,
        location_name: activity.location_name,
        location_hint: activity.location_hint,
        latitude: activity.latitude,
        longitude: activity.longitude,
        start_at: activity.start_at,
        max_participants: activity.max_participants,
        current_participants: activity.current_participants,
        summary: activity.summary,
        is_creator,
        is_joined,
        can_join,
        participants,
    })
}

#[derive(Debug, Serialize)]
pub struct DraftResolution {
    pub draft: DraftView,
    pub alternatives: Vec<AlternativeRef>,
}

pub async fn get_draft(
    pool: &SqlitePool,
    user_id: &str,
    reference: &ActivityRef,
) -> Result<DraftResolution, ServiceError> {
    let resolved =
        resolver_service::resolve(pool, user_id, reference, ResolutionScope::Drafts).await?;
    Ok(DraftResolution {
        draft: DraftView::from_row(resolved.activity),
        alternatives: resolved.alternatives,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MyActivitiesFilter {
    Created,
    Joined,
}

impl MyActivitiesFilter {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "created" => Some(MyActivitiesFilter::Created),
            "joined" => Some(MyActivitiesFilter::Joined),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivitySummaryView {
    pub activity_id: String,
    pub status: String,
    pub title: String,
    pub category: String,
    pub location_name: String,
    pub start_at: String,
    pub current_participants: i64,
    pub max_participants: i64,
    pub is_creator: bool,
}

pub async fn get_my_activities(
    pool: &SqlitePool,
    user_id: &str,
    filter: MyActivitiesFilter,
    limit: i64,
) -> Result<Vec<ActivitySummaryView>, ServiceError> {
    let limit = limit.clamp(1, 50);
    let rows = match filter {
        MyActivitiesFilter::Created => {
            activity_repo::list_created_by(pool, user_id, limit).await?
        }
        MyActivitiesFilter::Joined => activity_repo::list_joined_by(pool, user_id, limit).await?,
    };
    Ok(rows
        .into_iter()
        .map(|row| ActivitySummaryView {
            is_creator: row.creator_id == user_id,
            activity_id: row.activity_id,
            status: row.status,
            title: row.title,
            category: row.category,
            location_name: row.location_name,
            start_at: row.start_at,
            current_participants: row.current_participants,
            max_participants: row.max_participants,
        })
        .collect())
}
