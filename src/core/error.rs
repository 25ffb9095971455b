//! Errors raised by state construction and node algorithms.

use super::id::StateId;
use thiserror::Error;

/// Errors that can occur when building states or walking the state tree.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StateError {
    #[error("Invalid state name '{name}'. A state's name must match {pattern}")]
    InvalidName { name: String, pattern: &'static str },

    #[error("State {0} is not registered with this host")]
    UnknownState(StateId),

    #[error("State '{parent}' already has child {child}")]
    DuplicateChild { parent: String, child: StateId },

    #[error("The state host cannot process more than one instruction at a time")]
    Reentrant,
}
