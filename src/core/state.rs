//! State handles.
//!
//! A [`State`] is the application's name for a node in the tree: a cheap,
//! cloneable pair of id and name. Everything structural (parent, children,
//! starting child, handler) lives in the host's registry.

use super::error::StateError;
use super::id::{IdAllocator, StateId};
use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Pattern every state name must match in full.
pub const STATE_NAME_PATTERN: &str = "^[a-zA-Z][a-zA-Z0-9_-]*$";

/// Name of the root state every host creates for itself.
pub const TOP_STATE_NAME: &str = "Top";

static STATE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(STATE_NAME_PATTERN).expect("state name pattern is valid"));

/// Handle to a state.
///
/// # Example
///
/// ```rust
/// use hierarch::core::State;
///
/// let idle = State::new("Idle").unwrap();
/// assert_eq!(idle.name(), "Idle");
///
/// assert!(State::new("9lives").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct State {
    id: StateId,
    name: Arc<str>,
}

impl State {
    /// Create a state with an id from the process-wide allocator.
    pub fn new(name: &str) -> Result<Self, StateError> {
        Self::with_allocator(name, &IdAllocator::shared())
    }

    /// Create a state with an id from `allocator`.
    pub fn with_allocator(name: &str, allocator: &IdAllocator) -> Result<Self, StateError> {
        if !STATE_NAME.is_match(name) {
            return Err(StateError::InvalidName {
                name: name.to_string(),
                pattern: STATE_NAME_PATTERN,
            });
        }

        Ok(Self {
            id: allocator.next_id(),
            name: Arc::from(name),
        })
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the name collides with the root state's reserved name.
    pub(crate) fn has_reserved_name(&self) -> bool {
        self.name.eq_ignore_ascii_case(TOP_STATE_NAME)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.id)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
