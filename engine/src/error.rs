//! Engine error handling
//!
//! Collaborator failures ([`CoreError`]) are caught at the narrowest
//! component boundary that has a meaningful fallback (weather falls back to a
//! default context, food search degrades to a weaker ranking strategy).
//! Failures with no safe fallback propagate through [`EngineError`] as a
//! tagged failure, never as a silent empty result.

use fitpulse_shared::CoreError;
use thiserror::Error;
use uuid::Uuid;

/// Service-layer error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("upstream unavailable: {0}")]
    Upstream(String),

    #[error("malformed data: {0}")]
    MalformedData(String),

    #[error("goal generation failed for user {user_id}")]
    GoalGeneration {
        user_id: Uuid,
        #[source]
        source: anyhow::Error,
    },

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(msg) => EngineError::NotFound(msg),
            CoreError::UpstreamUnavailable(msg) => EngineError::Upstream(msg),
            CoreError::MalformedData(msg) => EngineError::MalformedData(msg),
            CoreError::PermissionDenied(msg) => {
                // Reaching here means a caller skipped its fallback path.
                EngineError::Upstream(format!("permission denied: {msg}"))
            }
        }
    }
}

/// Result type alias for engine services
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err = EngineError::from(CoreError::NotFound("profile".into()));
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn test_upstream_maps_to_upstream() {
        let err = EngineError::from(CoreError::UpstreamUnavailable("weather".into()));
        assert!(matches!(err, EngineError::Upstream(_)));
    }

    #[test]
    fn test_goal_generation_error_carries_user() {
        let user_id = Uuid::new_v4();
        let err = EngineError::GoalGeneration {
            user_id,
            source: anyhow::anyhow!("store write failed"),
        };
        assert!(err.to_string().contains(&user_id.to_string()));
    }
}
