use serde_json::Value;

use crate::error::ServiceError;
use crate::services::preference_service::{self, PreferencePromptInput};
use crate::tools::{parse_args, Caller};

/// Stateless in both modes: the prompt payload never touches storage, so
/// sandbox and authenticated callers take the same path.
pub fn ask_preference(_caller: &Caller, args: Value) -> Result<Value, ServiceError> {
    let input: PreferencePromptInput = parse_args(args)?;
    preference_service::build_prompt(&input)
}
