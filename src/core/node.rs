//! State tree nodes and the per-node lifecycle algorithms.
//!
//! A node never owns its relatives. Parent, children and starting child are
//! ids resolved through a [`StateLookup`], and everything a node needs from
//! the host during start, entry and exit goes through [`NodeHost`].

use super::error::StateError;
use super::event::EventCode;
use super::id::StateId;
use super::state::State;
use crate::host::EventHandler;
use std::fmt;
use std::marker::PhantomData;

/// Resolves state ids to registered nodes.
pub trait StateLookup<P> {
    fn lookup(&self, id: StateId) -> Result<&StateNode<P>, StateError>;
}

/// Capabilities a node borrows from its host while running lifecycle steps.
pub(crate) trait NodeHost<P>: StateLookup<P> {
    /// Mark the host as processing. Fails if it already is.
    fn begin_processing(&self) -> Result<(), StateError>;

    /// Release processing and re-allow transitions.
    fn end_processing(&self);

    /// Refuse transition requests until processing is released.
    fn block_transitions(&self);

    /// Run `node`'s handler. Returns whether the event was handled.
    fn dispatch(&self, node: &StateNode<P>, code: EventCode, payload: Option<&P>) -> bool;
}

/// Holds the host's processing flag for one lifecycle step. Dropping it
/// releases the flag, also when a handler unwinds.
struct Processing<'h, P, H: NodeHost<P>> {
    host: &'h H,
    _payload: PhantomData<fn(P)>,
}

impl<'h, P, H: NodeHost<P>> Processing<'h, P, H> {
    fn begin(host: &'h H) -> Result<Self, StateError> {
        host.begin_processing()?;
        Ok(Self {
            host,
            _payload: PhantomData,
        })
    }
}

impl<P, H: NodeHost<P>> Drop for Processing<'_, P, H> {
    fn drop(&mut self) {
        self.host.end_processing();
    }
}

/// A registered state: identity, tree links and handler.
pub struct StateNode<P> {
    state: State,
    parent: Option<StateId>,
    children: Vec<StateId>,
    starting: Option<StateId>,
    handler: EventHandler<P>,
}

impl<P> StateNode<P> {
    pub(crate) fn new(
        state: State,
        handler: EventHandler<P>,
        parent: Option<StateId>,
        starting: Option<StateId>,
    ) -> Self {
        Self {
            state,
            parent,
            children: Vec::new(),
            starting,
            handler,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn id(&self) -> StateId {
        self.state.id()
    }

    pub fn name(&self) -> &str {
        self.state.name()
    }

    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    pub fn children(&self) -> &[StateId] {
        &self.children
    }

    pub fn starting(&self) -> Option<StateId> {
        self.starting
    }

    pub(crate) fn set_starting(&mut self, starting: Option<StateId>) {
        self.starting = starting;
    }

    pub(crate) fn handler(&self) -> &EventHandler<P> {
        &self.handler
    }

    /// The root is the only node without a parent.
    pub fn is_top(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_composite(&self) -> bool {
        !self.children.is_empty()
    }

    pub(crate) fn add_child(&mut self, child: StateId) -> Result<(), StateError> {
        if self.children.contains(&child) {
            return Err(StateError::DuplicateChild {
                parent: self.name().to_string(),
                child,
            });
        }
        self.children.push(child);
        Ok(())
    }

    pub fn is_child(&self, id: StateId) -> bool {
        self.children.contains(&id)
    }

    /// Distinct nodes sharing a parent.
    pub fn is_sibling(&self, other: &StateNode<P>) -> bool {
        self.id() != other.id() && self.parent == other.parent
    }

    /// Whether `other` sits anywhere in this node's subtree.
    pub fn is_descendant(
        &self,
        other: &StateNode<P>,
        lookup: &impl StateLookup<P>,
    ) -> Result<bool, StateError> {
        let mut cursor = other.parent;
        while let Some(id) = cursor {
            if id == self.id() {
                return Ok(true);
            }
            cursor = lookup.lookup(id)?.parent;
        }
        Ok(false)
    }

    /// Whether `other` is a proper ancestor of this node other than the root.
    pub fn has_ancestor(
        &self,
        other: &StateNode<P>,
        lookup: &impl StateLookup<P>,
    ) -> Result<bool, StateError> {
        Ok(!other.is_top() && other.is_descendant(self, lookup)?)
    }

    /// Deliver Start while this composite resolves its starting child.
    pub(crate) fn start(&self, host: &impl NodeHost<P>) -> Result<(), StateError> {
        let _processing = Processing::begin(host)?;
        host.block_transitions();

        if !self.is_top() {
            host.dispatch(self, EventCode::START, None);
        }
        Ok(())
    }

    /// Deliver Entry to this node, and to its parent when the parent is
    /// freshly entered too, after a transition from `source`.
    pub(crate) fn enter(
        &self,
        source: &StateNode<P>,
        host: &impl NodeHost<P>,
    ) -> Result<(), StateError> {
        let _processing = Processing::begin(host)?;
        self.run_entry(source, host)
    }

    fn run_entry(&self, source: &StateNode<P>, host: &impl NodeHost<P>) -> Result<(), StateError> {
        let source_within = self.is_descendant(source, host)?;

        if let Some(parent_id) = self.parent {
            let parent = host.lookup(parent_id)?;
            if !parent.is_top() && !source_within && !source.has_ancestor(parent, host)? {
                host.dispatch(parent, EventCode::ENTRY, None);
            }
        }

        if !source_within {
            host.dispatch(self, EventCode::ENTRY, None);
        }
        Ok(())
    }

    /// Deliver Exit to this node, and to its parent when the destination
    /// lies outside the parent, before a transition to `destination`.
    pub(crate) fn exit(
        &self,
        destination: &StateNode<P>,
        host: &impl NodeHost<P>,
    ) -> Result<(), StateError> {
        let _processing = Processing::begin(host)?;
        host.block_transitions();
        self.run_exit(destination, host)
    }

    fn run_exit(&self, destination: &StateNode<P>, host: &impl NodeHost<P>) -> Result<(), StateError> {
        if self.is_descendant(destination, host)? {
            return Ok(());
        }

        if !self.is_top() {
            host.dispatch(self, EventCode::EXIT, None);
        }

        if let Some(parent_id) = self.parent {
            let parent = host.lookup(parent_id)?;
            if !parent.is_top() && !self.is_sibling(destination) {
                host.dispatch(parent, EventCode::EXIT, None);
            }
        }
        Ok(())
    }

    /// Offer an event to this node, then once to its parent if unhandled.
    ///
    /// Bubbling stops at the immediate parent even when the parent declines.
    pub(crate) fn process_event(
        &self,
        code: EventCode,
        payload: Option<&P>,
        host: &impl NodeHost<P>,
    ) -> Result<bool, StateError> {
        if host.dispatch(self, code, payload) {
            return Ok(true);
        }

        match self.parent {
            Some(parent_id) => {
                let parent = host.lookup(parent_id)?;
                Ok(host.dispatch(parent, code, payload))
            }
            None => Ok(false),
        }
    }
}

impl<P> fmt::Debug for StateNode<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateNode")
            .field("state", &self.state)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("starting", &self.starting)
            .finish_non_exhaustive()
    }
}
