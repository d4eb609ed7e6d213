use thiserror::Error;

/// Business-rule failures surfaced to the agent as values in the tool
/// envelope. None of these are retried by the engine; only `Storage` and
/// `Unavailable` are worth a caller-side retry.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("activity is full")]
    CapacityExceeded,
    #[error("daily creation quota exhausted")]
    QuotaExhausted,
    #[error("activity start time has already passed")]
    Expired,
    #[error("already joined this activity")]
    AlreadyJoined,
    #[error("duplicate action: {0}")]
    DuplicateAction(String),
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl ServiceError {
    /// Stable wire name for `errorKind` in the tool envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::InvalidState(_) => "invalid_state",
            ServiceError::CapacityExceeded => "capacity_exceeded",
            ServiceError::QuotaExhausted => "quota_exhausted",
            ServiceError::Expired => "expired",
            ServiceError::AlreadyJoined => "already_joined",
            ServiceError::DuplicateAction(_) => "duplicate_action",
            ServiceError::ValidationFailed(_) => "validation_failed",
            ServiceError::Unavailable(_) | ServiceError::Storage(_) => "unavailable",
        }
    }

    /// Whether a retry could plausibly succeed. Business errors are final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Unavailable(_) | ServiceError::Storage(_)
        )
    }
}
