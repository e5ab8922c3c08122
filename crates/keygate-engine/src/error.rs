//! Engine configuration errors.
//!
//! Every variant describes a defect in the declared model and is returned
//! at setup time. Runtime event processing never fails: unmatched events are
//! dropped and logged instead.

use thiserror::Error;

use crate::StateId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("State machine needs at least one state")]
    InvalidStateCount,

    #[error("Invalid state {state}: model has {count} states")]
    InvalidState { state: StateId, count: usize },

    #[error("Event '{event}' already has a transition from state {state}")]
    DuplicateEvent { state: StateId, event: String },

    #[error("Name '{0}' is already registered")]
    DuplicateName(String),

    #[error("Invalid event name '{0}'")]
    InvalidName(String),

    #[error("Unknown event '{0}'")]
    UnknownEvent(String),

    #[error("Transition from state {0} lists no events")]
    EmptyEventSet(StateId),

    #[error("Unknown timer '{0}'")]
    UnknownTimer(String),

    #[error("Timer '{0}' needs a non-zero duration")]
    InvalidDuration(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EngineError::InvalidState { state: 9, count: 7 }.to_string(),
            "Invalid state 9: model has 7 states"
        );
        assert_eq!(
            EngineError::DuplicateEvent {
                state: 2,
                event: "correct_passcode".into()
            }
            .to_string(),
            "Event 'correct_passcode' already has a transition from state 2"
        );
        assert_eq!(
            EngineError::DuplicateName("button1".into()).to_string(),
            "Name 'button1' is already registered"
        );
    }
}
