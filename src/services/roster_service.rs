use serde::Serialize;
use sqlx::SqlitePool;

use crate::database::{activity_repo, intent_repo, participant_repo};
use crate::error::ServiceError;
use crate::models::ActivityStatus;
use crate::services::activity_service::{now_rfc3339, parse_instant};

#[derive(Debug, Serialize)]
pub struct JoinConfirmation {
    pub activity_id: String,
    pub title: String,
    pub start_at: String,
    pub current_participants: i64,
    pub max_participants: i64,
}

/// Join: guard order is NotFound, InvalidState, Forbidden, Expired,
/// AlreadyJoined, then the atomic capacity admission. The pre-checks give
/// precise errors; the guarded transaction is what actually holds the
/// capacity invariant under races.
pub async fn join_activity(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
) -> Result<JoinConfirmation, ServiceError> {
    let activity = activity_repo::load_activity_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("activity {activity_id}")))?;

    if activity.status() != Some(ActivityStatus::Active) {
        return Err(ServiceError::InvalidState(format!(
            "activity is {}, only active activities can be joined",
            activity.status
        )));
    }
    if activity.creator_id == user_id {
        return Err(ServiceError::Forbidden(
            "creators are already part of their own activity".to_string(),
        ));
    }
    let start_at = parse_instant(&activity.start_at)?;
    if start_at <= chrono::Utc::now() {
        return Err(ServiceError::Expired);
    }
    if let Some(existing) = participant_repo::find_participant(pool, activity_id, user_id).await? {
        if existing.is_joined() {
            return Err(ServiceError::AlreadyJoined);
        }
    }

    let now = now_rfc3339();
    match participant_repo::join_guarded(pool, activity_id, user_id, &now).await? {
        participant_repo::JoinOutcome::Admitted => {}
        participant_repo::JoinOutcome::CapacityExhausted => {
            tracing::info!(activity_id = %activity_id, user_id = %user_id, "join_capacity_exceeded");
            return Err(ServiceError::CapacityExceeded);
        }
        participant_repo::JoinOutcome::AlreadyJoined => return Err(ServiceError::AlreadyJoined),
    }

    // Re-read for the confirmed counter value.
    let refreshed = activity_repo::load_activity_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("activity {activity_id}")))?;
    tracing::info!(
        activity_id = %activity_id,
        user_id = %user_id,
        current = refreshed.current_participants,
        max = refreshed.max_participants,
        "join_admitted"
    );
    Ok(JoinConfirmation {
        activity_id: refreshed.activity_id,
        title: refreshed.title,
        start_at: refreshed.start_at,
        current_participants: refreshed.current_participants,
        max_participants: refreshed.max_participants,
    })
}

#[derive(Debug, Serialize)]
pub struct LeaveConfirmation {
    pub activity_id: String,
    pub current_participants: i64,
}

/// Leave flips the membership row to 'quit' and releases the slot in one
/// transaction. The flip is the idempotency guard, so a repeated leave is a
/// DuplicateAction rather than a second decrement.
pub async fn leave_activity(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
) -> Result<LeaveConfirmation, ServiceError> {
    let activity = activity_repo::load_activity_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("activity {activity_id}")))?;
    if activity.creator_id == user_id {
        return Err(ServiceError::Forbidden(
            "the creator cannot leave; cancel the activity instead".to_string(),
        ));
    }

    let now = now_rfc3339();
    if !participant_repo::leave_guarded(pool, activity_id, user_id, &now).await? {
        return Err(ServiceError::DuplicateAction(
            "you are not currently joined".to_string(),
        ));
    }

    let refreshed = activity_repo::load_activity_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("activity {activity_id}")))?;
    Ok(LeaveConfirmation {
        activity_id: refreshed.activity_id,
        current_participants: refreshed.current_participants,
    })
}

#[derive(Debug, Serialize)]
pub struct IntentCancelConfirmation {
    pub intent_id: String,
    pub status: String,
}

pub async fn cancel_intent(
    pool: &SqlitePool,
    user_id: &str,
    intent_id: &str,
) -> Result<IntentCancelConfirmation, ServiceError> {
    let intent = intent_repo::load_intent(pool, intent_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("intent {intent_id}")))?;
    if intent.user_id != user_id {
        return Err(ServiceError::Forbidden(
            "this intent belongs to someone else".to_string(),
        ));
    }

    let now = now_rfc3339();
    let flipped = intent_repo::cancel_intent(pool, intent_id, user_id, &now).await?;
    if flipped == 0 {
        return Err(ServiceError::DuplicateAction(
            "intent is already cancelled".to_string(),
        ));
    }
    Ok(IntentCancelConfirmation {
        intent_id: intent_id.to_string(),
        status: "cancelled".to_string(),
    })
}
