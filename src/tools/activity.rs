use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::error::ServiceError;
use crate::services::activity_service::{self, MyActivitiesFilter};
use crate::services::resolver_service::ActivityRef;
use crate::tools::{parse_args, sandbox_activity, to_data, Caller};

#[derive(Debug, Deserialize)]
struct PublishArgs {
    activity_id: String,
}

pub async fn publish_activity(
    pool: &SqlitePool,
    caller: &Caller,
    args: Value,
) -> Result<Value, ServiceError> {
    let input: PublishArgs = parse_args(args)?;

    let Some(user_id) = caller.user_id() else {
        return Ok(serde_json::json!({
            "activity_id": input.activity_id,
            "status": "active",
            "share_path": format!("/activities/{}", input.activity_id),
            "remaining_quota": activity_service::daily_create_quota() - 1,
        }));
    };

    let confirmation =
        activity_service::publish_activity(pool, user_id, &input.activity_id).await?;
    to_data(confirmation)
}

#[derive(Debug, Deserialize)]
struct CancelArgs {
    activity_id: String,
    #[serde(default)]
    reason: Option<String>,
}

pub async fn cancel_activity(
    pool: &SqlitePool,
    caller: &Caller,
    args: Value,
) -> Result<Value, ServiceError> {
    let input: CancelArgs = parse_args(args)?;

    let Some(user_id) = caller.user_id() else {
        return Ok(serde_json::json!({
            "activity_id": input.activity_id,
            "status": "cancelled",
        }));
    };

    let confirmation = activity_service::cancel_activity(
        pool,
        user_id,
        &input.activity_id,
        input.reason.as_deref(),
    )
    .await?;
    to_data(confirmation)
}

pub async fn get_activity_detail(
    pool: &SqlitePool,
    caller: &Caller,
    args: Value,
) -> Result<Value, ServiceError> {
    let reference: ActivityRef = parse_args(args)?;

    let Some(user_id) = caller.user_id() else {
        let mut detail = sandbox_activity();
        detail["is_creator"] = Value::Bool(false);
        detail["is_joined"] = Value::Bool(false);
        detail["can_join"] = Value::Bool(true);
        detail["participants"] = serde_json::json!([
            { "user_id": "sandbox-host", "joined_at": "2099-01-01T09:00:00+00:00" },
        ]);
        return Ok(detail);
    };

    let view = activity_service::get_activity_detail(pool, user_id, &reference).await?;
    to_data(view)
}

#[derive(Debug, Deserialize)]
struct MyActivitiesArgs {
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
}

pub async fn get_my_activities(
    pool: &SqlitePool,
    caller: &Caller,
    args: Value,
) -> Result<Value, ServiceError> {
    let input: MyActivitiesArgs = parse_args(args)?;
    let filter_raw = input.filter.as_deref().unwrap_or("created");
    let filter = MyActivitiesFilter::parse(filter_raw).ok_or_else(|| {
        ServiceError::ValidationFailed(format!(
            "filter must be 'created' or 'joined', got '{filter_raw}'"
        ))
    })?;
    let limit = input.limit.unwrap_or(10);

    let Some(user_id) = caller.user_id() else {
        return Ok(serde_json::json!({ "activities": [sandbox_activity()] }));
    };

    let summaries = activity_service::get_my_activities(pool, user_id, filter, limit).await?;
    Ok(serde_json::json!({ "activities": to_data(summaries)? }))
}
