//! Deferred work for a busy host.

use super::event::EventCode;
use super::id::StateId;
use std::collections::VecDeque;

/// A request that arrived while the host was busy.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction<P> {
    /// Dispatch `code` with an optional payload to the current state.
    Event { code: EventCode, payload: Option<P> },

    /// Transition to the target state.
    Transition { target: StateId },
}

impl<P> Instruction<P> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Event { .. } => "event",
            Self::Transition { .. } => "transition",
        }
    }
}

/// Unbounded FIFO of pending instructions.
#[derive(Debug)]
pub struct InstructionQueue<P> {
    pending: VecDeque<Instruction<P>>,
}

impl<P> Default for InstructionQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> InstructionQueue<P> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub fn push(&mut self, instruction: Instruction<P>) {
        self.pending.push_back(instruction);
    }

    pub fn pop(&mut self) -> Option<Instruction<P>> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
