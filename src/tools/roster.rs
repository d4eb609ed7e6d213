use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::error::ServiceError;
use crate::services::roster_service;
use crate::tools::{parse_args, to_data, Caller};

#[derive(Debug, Deserialize)]
struct JoinArgs {
    activity_id: String,
}

pub async fn join_activity(
    pool: &SqlitePool,
    caller: &Caller,
    args: Value,
) -> Result<Value, ServiceError> {
    let input: JoinArgs = parse_args(args)?;

    let Some(user_id) = caller.user_id() else {
        return Ok(serde_json::json!({
            "activity_id": input.activity_id,
            "title": "☕ Sandbox coffee meetup",
            "start_at": "2099-01-01T10:00:00+00:00",
            "current_participants": 3,
            "max_participants": 4,
        }));
    };

    let confirmation = roster_service::join_activity(pool, user_id, &input.activity_id).await?;
    to_data(confirmation)
}

pub async fn leave_activity(
    pool: &SqlitePool,
    caller: &Caller,
    args: Value,
) -> Result<Value, ServiceError> {
    let input: JoinArgs = parse_args(args)?;

    let Some(user_id) = caller.user_id() else {
        return Ok(serde_json::json!({
            "activity_id": input.activity_id,
            "current_participants": 2,
        }));
    };

    let confirmation = roster_service::leave_activity(pool, user_id, &input.activity_id).await?;
    to_data(confirmation)
}

#[derive(Debug, Deserialize)]
struct CancelIntentArgs {
    intent_id: String,
}

pub async fn cancel_intent(
    pool: &SqlitePool,
    caller: &Caller,
    args: Value,
) -> Result<Value, ServiceError> {
    let input: CancelIntentArgs = parse_args(args)?;

    let Some(user_id) = caller.user_id() else {
        return Ok(serde_json::json!({
            "intent_id": input.intent_id,
            "status": "cancelled",
        }));
    };

    let confirmation = roster_service::cancel_intent(pool, user_id, &input.intent_id).await?;
    to_data(confirmation)
}
