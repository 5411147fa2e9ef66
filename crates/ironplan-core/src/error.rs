use thiserror::Error;

use crate::program::ProgramParseError;

/// Failures surfaced by engine operations.
///
/// Storage failures carry the query layer's context chain and are never
/// swallowed by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A program, user program, exercise progress row, or scheduled workout
    /// does not exist, is not visible to the caller, or is not active.
    #[error("not found: {0}")]
    NotFound(String),

    /// The program is already running for this user.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed input, rejected before anything is written.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl EngineError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(what: impl Into<String>) -> Self {
        Self::Validation(what.into())
    }
}

impl From<ProgramParseError> for EngineError {
    fn from(err: ProgramParseError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keeps_context_chain() {
        let err: EngineError = anyhow::anyhow!("connection reset")
            .context("failed to lock user program")
            .into();
        assert!(matches!(err, EngineError::Storage(_)));
        assert_eq!(err.to_string(), "failed to lock user program");
    }

    #[test]
    fn parse_errors_become_validation() {
        let err: EngineError = ProgramParseError::NoWorkouts.into();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
