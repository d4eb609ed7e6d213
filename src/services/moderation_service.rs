use std::time::Duration;

use serde::Deserialize;

use crate::error::ServiceError;

// Outbound text-safety screening for user-authored fields. This runs before
// any row is written and outside every storage transaction, so a slow
// classifier can never hold a capacity or quota lock.

fn text_safety_url() -> Option<String> {
    std::env::var("TEXT_SAFETY_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
}

fn text_safety_timeout() -> Duration {
    let ms = std::env::var("TEXT_SAFETY_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    Duration::from_millis(ms)
}

#[derive(Debug, Deserialize)]
struct ScreenVerdict {
    allowed: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Screens one free-text field. With TEXT_SAFETY_URL unset (local dev, test
/// suite) screening is a pass-through.
pub async fn screen_text(field: &str, text: &str) -> Result<(), ServiceError> {
    let Some(base_url) = text_safety_url() else {
        return Ok(());
    };
    let url = format!("{}/v1/screen", base_url.trim_end_matches('/'));

    let client = reqwest::Client::builder()
        .timeout(text_safety_timeout())
        .build()
        .map_err(|e| ServiceError::Unavailable(e.to_string()))?;

    let resp = client
        .post(&url)
        .json(&serde_json::json!({ "field": field, "text": text }))
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(field = %field, error = %e, "text_safety_unreachable");
            ServiceError::Unavailable(format!("text safety classifier: {e}"))
        })?;

    if !resp.status().is_success() {
        tracing::warn!(field = %field, status = %resp.status(), "text_safety_bad_status");
        return Err(ServiceError::Unavailable(format!(
            "text safety classifier returned {}",
            resp.status()
        )));
    }

    let verdict: ScreenVerdict = resp
        .json()
        .await
        .map_err(|e| ServiceError::Unavailable(e.to_string()))?;

    if !verdict.allowed {
        let reason = verdict.reason.unwrap_or_else(|| "content rejected".to_string());
        tracing::info!(field = %field, reason = %reason, "text_safety_rejected");
        return Err(ServiceError::ValidationFailed(format!(
            "{field} was rejected by content screening: {reason}"
        )));
    }
    Ok(())
}

/// Screens several optional fields in one go; the first rejection wins.
pub async fn screen_fields(fields: &[(&str, Option<&str>)]) -> Result<(), ServiceError> {
    for (name, value) in fields {
        if let Some(text) = value {
            if !text.trim().is_empty() {
                screen_text(name, text).await?;
            }
        }
    }
    Ok(())
}
