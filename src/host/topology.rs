//! The collaborator contract and the registration phase.

use super::context::{handler, Context, EventHandler};
use super::error::HostError;
use crate::core::{EventCode, State, StateId, StateNode};
use std::collections::{BTreeMap, BTreeSet};

/// Application side of a host: the state tree, the event vocabulary and
/// the handlers.
///
/// Each hook is called exactly once while the host is being built, in this
/// order: [`top_starting_state`](Topology::top_starting_state),
/// [`register_states`](Topology::register_states),
/// [`register_events`](Topology::register_events). Nothing can be
/// registered once the host exists.
pub trait Topology<P: Send + 'static> {
    /// The state the root resolves to by default. Must be registered as a
    /// direct child of the root.
    fn top_starting_state(&self) -> Option<&State>;

    /// Register every application state exactly once.
    fn register_states(&self, registrar: &mut Registrar<P>) -> Result<(), HostError>;

    /// Register every application event exactly once, numbered from 0
    /// without gaps.
    fn register_events(&self, registrar: &mut Registrar<P>) -> Result<(), HostError>;

    /// Handler for the root state. It only ever sees application events
    /// bubbled up from the root's direct children.
    fn top_handler(&self) -> EventHandler<P> {
        handler(|_, _, _| false)
    }
}

/// Collects states and events while a host is being built.
pub struct Registrar<P> {
    top: State,
    nodes: BTreeMap<StateId, StateNode<P>>,
    order: Vec<StateId>,
    events: BTreeSet<EventCode>,
}

/// Output of a completed registration phase.
pub(crate) struct Registration<P> {
    pub(crate) nodes: BTreeMap<StateId, StateNode<P>>,
    pub(crate) events: BTreeSet<EventCode>,
}

impl<P: Send + 'static> Registrar<P> {
    pub(crate) fn new(top: State, top_handler: EventHandler<P>) -> Result<Self, HostError> {
        let mut registrar = Self {
            top: top.clone(),
            nodes: BTreeMap::new(),
            order: Vec::new(),
            events: BTreeSet::new(),
        };
        registrar.insert(&top, top_handler, None, None)?;
        registrar.register_event(EventCode::INFRASTRUCTURE)?;
        Ok(registrar)
    }

    /// The root state. Passing it as a parent is the same as passing `None`.
    pub fn top(&self) -> &State {
        &self.top
    }

    /// Register `state` with its handler.
    ///
    /// Without a parent the state becomes a direct child of the root.
    /// Parents may be registered before or after their children.
    pub fn register_state<F>(
        &mut self,
        state: &State,
        handler: F,
        parent: Option<&State>,
        starting: Option<&State>,
    ) -> Result<(), HostError>
    where
        F: Fn(&Context<'_, P>, EventCode, Option<&P>) -> bool + Send + Sync + 'static,
    {
        self.register_state_with(state, super::context::handler(handler), parent, starting)
    }

    /// Register `state` with an already wrapped handler, e.g. one shared
    /// between several states.
    pub fn register_state_with(
        &mut self,
        state: &State,
        handler: EventHandler<P>,
        parent: Option<&State>,
        starting: Option<&State>,
    ) -> Result<(), HostError> {
        if state.id() != self.top.id() && state.has_reserved_name() {
            return Err(HostError::ReservedStateName(state.name().to_string()));
        }
        self.insert(state, handler, parent, starting)
    }

    fn insert(
        &mut self,
        state: &State,
        handler: EventHandler<P>,
        parent: Option<&State>,
        starting: Option<&State>,
    ) -> Result<(), HostError> {
        if parent == Some(state) {
            return Err(HostError::OwnParent(state.name().to_string()));
        }
        if starting == Some(state) {
            return Err(HostError::OwnStartingState(state.name().to_string()));
        }
        if self.nodes.contains_key(&state.id()) {
            return Err(HostError::DuplicateState(state.name().to_string()));
        }

        let is_top = state.id() == self.top.id();
        let parent = match parent {
            Some(_) if is_top => return Err(HostError::TopWithParent),
            Some(parent) => Some(parent.id()),
            None if is_top => None,
            None => Some(self.top.id()),
        };

        self.nodes.insert(
            state.id(),
            StateNode::new(state.clone(), handler, parent, starting.map(State::id)),
        );
        self.order.push(state.id());
        Ok(())
    }

    /// Register one or more event codes.
    ///
    /// Codes below the reserved range and codes already registered are
    /// rejected.
    pub fn register_event<I>(&mut self, codes: I) -> Result<(), HostError>
    where
        I: IntoIterator,
        I::Item: Into<EventCode>,
    {
        for code in codes {
            let code = code.into();
            if code < EventCode::START {
                return Err(HostError::EventOutOfRange(code));
            }
            if !self.events.insert(code) {
                return Err(HostError::DuplicateEvent(code));
            }
        }
        Ok(())
    }

    pub(crate) fn set_top_starting(&mut self, starting: &State) {
        if let Some(top) = self.nodes.get_mut(&self.top.id()) {
            top.set_starting(Some(starting.id()));
        }
    }

    /// Link every registered state into its parent's children.
    pub(crate) fn finish(mut self) -> Result<Registration<P>, HostError> {
        for child in &self.order {
            let Some(parent) = self.nodes.get(child).and_then(StateNode::parent) else {
                continue;
            };
            if !self.nodes.contains_key(&parent) {
                let state = self
                    .nodes
                    .get(child)
                    .map(|n| n.name().to_string())
                    .unwrap_or_default();
                return Err(HostError::UnregisteredParent { state });
            }
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.add_child(*child)?;
            }
        }

        Ok(Registration {
            nodes: self.nodes,
            events: self.events,
        })
    }
}
