//! Host error types.

use crate::core::{EventCode, StateError};
use thiserror::Error;

/// Errors raised while registering, validating or driving a host.
///
/// Every variant signals a programming or configuration defect. The host
/// never retries, and a rejected request leaves the host unchanged.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HostError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("The starting state for the Top state must be provided")]
    MissingTopStartingState,

    #[error("State '{0}' cannot be its own parent")]
    OwnParent(String),

    #[error("State '{0}' cannot be its own starting state")]
    OwnStartingState(String),

    #[error("State '{0}' has already been registered")]
    DuplicateState(String),

    #[error("State name '{0}' is reserved for the root state")]
    ReservedStateName(String),

    #[error("The Top state cannot be given a parent")]
    TopWithParent,

    #[error("Parent of state '{state}' was never registered")]
    UnregisteredParent { state: String },

    #[error("Only infrastructure events can be negative; got {0}")]
    EventOutOfRange(EventCode),

    #[error("Cannot register the event {0} more than once")]
    DuplicateEvent(EventCode),

    #[error("The event {0} hasn't been registered")]
    UnregisteredEvent(EventCode),

    #[error("The infrastructure event {0} cannot be raised by the application")]
    ReservedEvent(EventCode),

    #[error("The state '{0}' hasn't been registered")]
    UnregisteredState(String),

    #[error("Transitions cannot be made during Start or Exit events; current state '{current}'")]
    TransitionsBlocked { current: String },

    #[error("State topology is invalid: {}", join(.0))]
    InvalidTopology(Vec<TopologyError>),
}

/// Defects found by the checks that run once registration is complete.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TopologyError {
    #[error("Event numbering is incorrect. Expected: {expected}; Found: {found}")]
    EventNumbering { expected: i32, found: i32 },

    #[error("State '{state}' declares starting state '{starting}' but has no children")]
    StartingStateWithoutChildren { state: String, starting: String },

    #[error("State '{state}' declares starting state '{starting}' which is not one of its children")]
    StartingStateNotChild { state: String, starting: String },

    #[error("State '{state}' is not reachable from Top; its parent chain forms a cycle")]
    DetachedState { state: String },
}

fn join(errors: &[TopologyError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
