//! Core state tree types and algorithms.
//!
//! This module contains the building blocks the host orchestrates:
//! - State identity, names and the id allocator
//! - Event codes, including the reserved lifecycle codes
//! - Tree nodes with their start, entry, exit and dispatch algorithms
//! - Deferred instructions and the transition journal
//!
//! Nothing in here mutates host state directly; nodes reach the host only
//! through the capabilities it lends them.

mod error;
mod event;
mod history;
mod id;
mod instruction;
mod node;
mod state;

pub use error::StateError;
pub use event::EventCode;
pub use history::{TransitionHistory, TransitionRecord};
pub use id::{IdAllocator, StateId};
pub use instruction::{Instruction, InstructionQueue};
pub(crate) use node::NodeHost;
pub use node::{StateLookup, StateNode};
pub use state::{State, STATE_NAME_PATTERN, TOP_STATE_NAME};
