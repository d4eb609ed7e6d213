use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::error::ServiceError;

pub mod activity;
pub mod draft;
pub mod preference;
pub mod roster;

/// Who is calling. Resolved once by the identity middleware; tools branch on
/// it instead of re-checking "is there a user" ad hoc.
#[derive(Debug, Clone)]
pub enum Caller {
    Authenticated(String),
    /// No durable identity: validate inputs, echo plausible results, write
    /// nothing.
    Sandbox,
}

impl Caller {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Caller::Authenticated(id) => Some(id),
            Caller::Sandbox => None,
        }
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, Caller::Sandbox)
    }
}

/// The uniform result shape. No tool signals failure by panicking or by an
/// HTTP status; every failure is a value inside this envelope.
#[derive(Debug, Serialize)]
pub struct ToolEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "errorKind", skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl ToolEnvelope {
    pub fn ok(data: Value) -> Self {
        ToolEnvelope {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn fail(err: &ServiceError) -> Self {
        ToolEnvelope {
            success: false,
            data: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }
}

pub const TOOL_NAMES: &[&str] = &[
    "create_draft",
    "refine_draft",
    "publish_activity",
    "join_activity",
    "leave_activity",
    "cancel_activity",
    "get_activity_detail",
    "get_draft",
    "get_my_activities",
    "cancel_intent",
    "ask_preference",
];

pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ServiceError> {
    // A missing body means "no arguments".
    let args = if args.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| ServiceError::ValidationFailed(e.to_string()))
}

pub(crate) fn to_data<T: Serialize>(value: T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|e| ServiceError::Unavailable(e.to_string()))
}

/// The fixed synthetic candidate every read tool resolves to in sandbox
/// mode, so the tool set can be exercised without an account.
pub(crate) fn sandbox_activity() -> Value {
    serde_json::json!({
        "activity_id": "sandbox-activity",
        "status": "active",
        "title": "☕ Sandbox coffee meetup",
        "category": "social",
        "location_name": "Sandbox Cafe",
        "location_hint": null,
        "latitude": null,
        "longitude": null,
        "start_at": "2099-01-01T10:00:00+00:00",
        "max_participants": 4,
        "current_participants": 2,
        "summary": "A synthetic activity used when no account is attached.",
    })
}

/// The tool dispatch table. Tools never call each other; any sequencing
/// across tools belongs to the conversational agent.
pub async fn dispatch(
    pool: &SqlitePool,
    caller: &Caller,
    tool_name: &str,
    args: Value,
) -> ToolEnvelope {
    let result = match tool_name {
        "create_draft" => draft::create_draft(pool, caller, args).await,
        "refine_draft" => draft::refine_draft(pool, caller, args).await,
        "get_draft" => draft::get_draft(pool, caller, args).await,
        "publish_activity" => activity::publish_activity(pool, caller, args).await,
        "cancel_activity" => activity::cancel_activity(pool, caller, args).await,
        "get_activity_detail" => activity::get_activity_detail(pool, caller, args).await,
        "get_my_activities" => activity::get_my_activities(pool, caller, args).await,
        "join_activity" => roster::join_activity(pool, caller, args).await,
        "leave_activity" => roster::leave_activity(pool, caller, args).await,
        "cancel_intent" => roster::cancel_intent(pool, caller, args).await,
        "ask_preference" => preference::ask_preference(caller, args),
        _ => Err(ServiceError::ValidationFailed(format!(
            "unknown tool '{tool_name}'"
        ))),
    };

    match result {
        Ok(data) => ToolEnvelope::ok(data),
        Err(err) => {
            if err.is_retryable() {
                tracing::error!(tool = %tool_name, error = %err, "tool_infrastructure_failure");
            } else {
                tracing::info!(tool = %tool_name, kind = err.kind(), "tool_rejected");
            }
            ToolEnvelope::fail(&err)
        }
    }
}
