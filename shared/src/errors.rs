//! Error types for the FitPulse engine

use thiserror::Error;

/// Failures raised by external collaborators (store, weather, location,
/// corpus). Each variant maps to a distinct recovery policy:
///
/// - `PermissionDenied`: location access refused; callers fall back to the
///   default weather context.
/// - `UpstreamUnavailable`: weather API or persistence unreachable;
///   recoverable wherever a default can be supplied, otherwise surfaced.
/// - `NotFound`: missing record (e.g. user profile); fatal to the enclosing
///   operation.
/// - `MalformedData`: corrupt corpus or cache; triggers a rebuild-from-source
///   path, fatal only if the source itself is unreadable.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed data: {0}")]
    MalformedData(String),
}

impl CoreError {
    /// Whether a caller with a sensible default may swallow this error
    /// instead of propagating it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::PermissionDenied(_) | CoreError::UpstreamUnavailable(_)
        )
    }
}
