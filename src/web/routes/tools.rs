use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::tools::{self, Caller, ToolEnvelope};

/// Single dispatch route for the whole tool menu. Business failures are
/// values inside the envelope, so this always answers 200.
pub async fn call_tool_handler(
    State(pool): State<SqlitePool>,
    Extension(caller): Extension<Caller>,
    Path(tool_name): Path<String>,
    body: Option<Json<Value>>,
) -> Json<ToolEnvelope> {
    let args = body.map(|Json(v)| v).unwrap_or(Value::Null);
    tracing::info!(tool = %tool_name, sandbox = caller.is_sandbox(), "tool_call");
    Json(tools::dispatch(&pool, &caller, &tool_name, args).await)
}

pub async fn health_handler() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "tools": tools::TOOL_NAMES,
    }))
}
