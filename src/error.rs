//! Error types for the analysis session.
//!
//! Every error surfaced to the user ends up as a message string; none of
//! them leave the session in a state that refuses a new submission.

use thiserror::Error;

/// Message shown when the service fails without a structured error payload.
pub const FALLBACK_ERROR_MESSAGE: &str = "An error occurred while fetching comments";

/// Message shown when the submitted input is empty.
pub const EMPTY_INPUT_MESSAGE: &str = "Please enter a YouTube URL";

/// Errors returned directly by the session controller's entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Empty or whitespace-only input. Never reaches the service.
    #[error("{}", EMPTY_INPUT_MESSAGE)]
    Validation,

    /// A submission is already in flight.
    #[error("An analysis is already in progress")]
    Busy,
}

/// Errors produced by the analysis service collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network failure, timeout, or a non-success response without a structured body.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with an `error` payload.
    #[error("{0}")]
    Service(String),
}

impl FetchError {
    /// The message a user sees once this error lands in the session state.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Transport(_) => FALLBACK_ERROR_MESSAGE.to_string(),
            FetchError::Service(message) => message.clone(),
        }
    }
}

/// A classified comment that cannot be placed in any category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataIntegrityError {
    #[error("sentiment label {0} is outside 0..=2")]
    LabelOutOfRange(i64),

    #[error("expected 3 sentiment probabilities, got {0}")]
    ProbabilityArity(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_uses_fallback() {
        let err = FetchError::Transport("connection refused".to_string());
        assert_eq!(err.user_message(), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_service_error_is_verbatim() {
        let err = FetchError::Service("quota exceeded".to_string());
        assert_eq!(err.user_message(), "quota exceeded");
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_validation_message() {
        assert_eq!(SessionError::Validation.to_string(), EMPTY_INPUT_MESSAGE);
    }
}
