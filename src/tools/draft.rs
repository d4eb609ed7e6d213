use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::services::activity_service::{self, CreateDraftInput, RefineDraftInput};
use crate::services::resolver_service::ActivityRef;
use crate::tools::{parse_args, sandbox_activity, to_data, Caller};

pub async fn create_draft(
    pool: &SqlitePool,
    caller: &Caller,
    args: Value,
) -> Result<Value, ServiceError> {
    let input: CreateDraftInput = parse_args(args)?;

    let Some(user_id) = caller.user_id() else {
        // Sandbox: same validation, no storage, echoed draft.
        activity_service::validate_create(&input)?;
        return Ok(serde_json::json!({
            "activity_id": format!("sandbox-{}", Uuid::new_v4()),
            "status": "draft",
            "title": input.title.trim(),
            "category": input.category,
            "location_name": input.location_name.trim(),
            "location_hint": input.location_hint,
            "latitude": input.latitude,
            "longitude": input.longitude,
            "start_at": input.start_at,
            "max_participants": input.max_participants,
            "current_participants": 1,
            "summary": input.summary,
        }));
    };

    let view = activity_service::create_draft(pool, user_id, &input).await?;
    to_data(view)
}

pub async fn refine_draft(
    pool: &SqlitePool,
    caller: &Caller,
    args: Value,
) -> Result<Value, ServiceError> {
    let input: RefineDraftInput = parse_args(args)?;

    let Some(user_id) = caller.user_id() else {
        // Sandbox: same field validation as the authenticated path.
        activity_service::validate_refine(&input)?;
        return Ok(serde_json::json!({
            "activity_id": input.activity_id,
            "status": "draft",
            "updated": {
                "title": input.title,
                "category": input.category,
                "location_name": input.location_name,
                "location_hint": input.location_hint,
                "latitude": input.latitude,
                "longitude": input.longitude,
                "start_at": input.start_at,
                "max_participants": input.max_participants,
                "summary": input.summary,
            },
        }));
    };

    let view = activity_service::refine_draft(pool, user_id, &input).await?;
    to_data(view)
}

pub async fn get_draft(
    pool: &SqlitePool,
    caller: &Caller,
    args: Value,
) -> Result<Value, ServiceError> {
    let reference: ActivityRef = parse_args(args)?;

    let Some(user_id) = caller.user_id() else {
        let mut draft = sandbox_activity();
        draft["status"] = Value::String("draft".to_string());
        return Ok(serde_json::json!({ "draft": draft, "alternatives": [] }));
    };

    let resolution = activity_service::get_draft(pool, user_id, &reference).await?;
    to_data(resolution)
}
