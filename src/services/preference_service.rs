use serde::Deserialize;
use serde_json::Value;

use crate::error::ServiceError;

// Stateless packaging for preference elicitation. The engine only shapes the
// prompt; how often the agent asks is the agent's policy, not ours.

const MIN_OPTIONS: usize = 3;

#[derive(Debug, Deserialize)]
pub struct PreferencePromptInput {
    pub question_type: String,
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub allow_skip: Option<bool>,
    #[serde(default)]
    pub collected_info: Option<Value>,
}

pub fn build_prompt(input: &PreferencePromptInput) -> Result<Value, ServiceError> {
    if input.question_type != "location" && input.question_type != "type" {
        return Err(ServiceError::ValidationFailed(format!(
            "unknown question_type '{}', expected 'location' or 'type'",
            input.question_type
        )));
    }
    if input.question.trim().is_empty() {
        return Err(ServiceError::ValidationFailed(
            "question must not be empty".to_string(),
        ));
    }
    let options: Vec<&str> = input
        .options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .collect();
    if options.len() < MIN_OPTIONS {
        return Err(ServiceError::ValidationFailed(format!(
            "need at least {MIN_OPTIONS} non-empty options, got {}",
            options.len()
        )));
    }

    let allow_skip = input.allow_skip.unwrap_or(true);
    let option_items: Vec<Value> = options
        .iter()
        .enumerate()
        .map(|(index, label)| serde_json::json!({ "index": index, "label": label }))
        .collect();

    // The collected-info bag round-trips untouched so the conversation can
    // carry earlier answers through the next turn.
    Ok(serde_json::json!({
        "kind": "preference_prompt",
        "question_type": input.question_type,
        "question": input.question.trim(),
        "options": option_items,
        "skip": {
            "allowed": allow_skip,
            "label": if allow_skip { "skip" } else { "" },
        },
        "collected_info": input.collected_info.clone().unwrap_or(Value::Null),
    }))
}
