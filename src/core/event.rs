//! Event codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer code identifying an event.
///
/// Application events are non-negative and numbered contiguously from 0.
/// The three negative codes are reserved for the lifecycle callbacks the
/// engine drives itself: [`EventCode::START`], [`EventCode::ENTRY`] and
/// [`EventCode::EXIT`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventCode(i32);

impl EventCode {
    /// Delivered to a composite state when it resolves its starting child.
    pub const START: EventCode = EventCode(-3);
    /// Delivered to a state when it is entered.
    pub const ENTRY: EventCode = EventCode(-2);
    /// Delivered to a state when it is exited.
    pub const EXIT: EventCode = EventCode(-1);

    /// All reserved codes in ascending order.
    pub const INFRASTRUCTURE: [EventCode; 3] = [Self::START, Self::ENTRY, Self::EXIT];

    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    /// Whether this is one of the reserved lifecycle codes.
    pub const fn is_infrastructure(self) -> bool {
        self.0 >= Self::START.0 && self.0 <= Self::EXIT.0
    }
}

impl From<i32> for EventCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::START => f.write_str("Start"),
            Self::ENTRY => f.write_str("Entry"),
            Self::EXIT => f.write_str("Exit"),
            Self(code) => write!(f, "{code}"),
        }
    }
}
