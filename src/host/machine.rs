//! The state host: registry, busy flags, instruction queue and the
//! transition and event protocols.

use super::config::HostConfig;
use super::context::Context;
use super::error::HostError;
use super::topology::{Registrar, Topology};
use super::validate::validate_topology;
use crate::builder::HostBuilder;
use crate::core::{
    EventCode, IdAllocator, Instruction, InstructionQueue, NodeHost, State, StateError, StateId,
    StateLookup, StateNode, TransitionHistory, TransitionRecord, TOP_STATE_NAME,
};
use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use stillwater::validation::Validation;
use tracing::{debug, info, trace, warn};

/// Mutable half of the host, guarded by one lock.
///
/// The lock is only ever held for bookkeeping, never while a handler runs.
struct Control<P> {
    current: StateId,
    transitioning: bool,
    processing: bool,
    allow_transitions: bool,
    queue: InstructionQueue<P>,
    history: TransitionHistory,
}

impl<P> Control<P> {
    fn is_busy(&self) -> bool {
        self.transitioning || self.processing
    }

    /// Clear both busy flags at the end of an instruction.
    fn release(&mut self) {
        self.transitioning = false;
        self.processing = false;
        self.allow_transitions = true;
    }

    /// Pop the oldest instruction and mark it in flight. Only called while
    /// idle.
    fn next_runnable(&mut self) -> Option<Instruction<P>> {
        let instruction = self.queue.pop()?;
        match instruction {
            Instruction::Transition { .. } => self.transitioning = true,
            Instruction::Event { .. } => self.processing = true,
        }
        Some(instruction)
    }
}

/// Busy flags for one in-flight instruction. Unless completed, dropping it
/// releases the flags, so a panicking handler cannot wedge the host.
struct InFlight<'h, P> {
    control: &'h Mutex<Control<P>>,
    armed: bool,
}

impl<'h, P> InFlight<'h, P> {
    fn new(control: &'h Mutex<Control<P>>) -> Self {
        Self {
            control,
            armed: true,
        }
    }

    /// Release the flags and keep the lock, so the caller can pop the next
    /// instruction before anyone else sees the host idle.
    fn complete(mut self) -> MutexGuard<'h, Control<P>> {
        self.armed = false;
        let mut control = self.control.lock();
        control.release();
        control
    }
}

impl<P> Drop for InFlight<'_, P> {
    fn drop(&mut self) {
        if self.armed {
            self.control.lock().release();
        }
    }
}

/// Serializable snapshot of a host.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HostStatus {
    pub name: String,
    pub current: StateId,
    pub current_name: String,
    pub busy: bool,
    pub queued: usize,
    pub transitions: u64,
}

/// A hierarchical state machine host.
///
/// Owns every state node, the registered event codes and the single
/// current-state pointer. Requests made while the host is busy are queued
/// and run strictly in arrival order, each to completion, before the call
/// that found the host idle returns.
///
/// The host is `Sync`: any thread may raise events or request transitions.
/// Whichever caller finds the host idle runs the work, including whatever
/// other threads queue in the meantime; everyone else returns immediately.
///
/// # Example
///
/// ```rust
/// use hierarch::core::{EventCode, State};
/// use hierarch::host::{HostError, Registrar, StateHost, Topology};
///
/// const TOGGLE: EventCode = EventCode::new(0);
///
/// struct Switch {
///     off: State,
///     on: State,
/// }
///
/// impl Topology<()> for Switch {
///     fn top_starting_state(&self) -> Option<&State> {
///         Some(&self.off)
///     }
///
///     fn register_states(&self, registrar: &mut Registrar<()>) -> Result<(), HostError> {
///         let on = self.on.clone();
///         registrar.register_state(&self.off, move |ctx, code, _| {
///             code == TOGGLE && ctx.transition_to(&on).is_ok()
///         }, None, None)?;
///         let off = self.off.clone();
///         registrar.register_state(&self.on, move |ctx, code, _| {
///             code == TOGGLE && ctx.transition_to(&off).is_ok()
///         }, None, None)
///     }
///
///     fn register_events(&self, registrar: &mut Registrar<()>) -> Result<(), HostError> {
///         registrar.register_event([TOGGLE])
///     }
/// }
///
/// let switch = Switch { off: State::new("Off")?, on: State::new("On")? };
/// let on = switch.on.clone();
/// let host: StateHost = StateHost::new(switch)?;
///
/// host.raise_event(TOGGLE, None)?;
/// assert_eq!(host.current_state(), on);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct StateHost<P = ()> {
    config: HostConfig,
    top: State,
    nodes: BTreeMap<StateId, StateNode<P>>,
    events: BTreeSet<EventCode>,
    control: Mutex<Control<P>>,
}

impl<P: Send + 'static> StateHost<P> {
    /// Build and initialize a host with the default configuration.
    ///
    /// Returns once the host has settled in the leaf Top's starting chain
    /// resolves to.
    pub fn new(topology: impl Topology<P>) -> Result<Self, HostError> {
        HostBuilder::new().build(topology)
    }

    /// Run the registration hooks, validate the result and transition into
    /// the starting leaf.
    pub(crate) fn initialize(
        config: HostConfig,
        allocator: &IdAllocator,
        topology: impl Topology<P>,
    ) -> Result<Self, HostError> {
        let top = State::with_allocator(TOP_STATE_NAME, allocator)?;
        let mut registrar = Registrar::new(top.clone(), topology.top_handler())?;

        let starting = topology
            .top_starting_state()
            .ok_or(HostError::MissingTopStartingState)?
            .clone();
        registrar.set_top_starting(&starting);

        topology.register_states(&mut registrar)?;
        topology.register_events(&mut registrar)?;
        let registration = registrar.finish()?;

        if let Validation::Failure(errors) =
            validate_topology(&registration.nodes, &registration.events)
        {
            return Err(HostError::InvalidTopology(errors.iter().cloned().collect()));
        }

        let host = Self {
            control: Mutex::new(Control {
                current: top.id(),
                transitioning: false,
                processing: false,
                allow_transitions: true,
                queue: InstructionQueue::new(),
                history: TransitionHistory::new(config.journal_limit()),
            }),
            config,
            top,
            nodes: registration.nodes,
            events: registration.events,
        };

        host.transition_to(&starting)?;

        info!(
            host = %host.config.name,
            states = host.nodes.len(),
            events = host.events.len(),
            current = %host.current_state(),
            "state host initialized"
        );
        Ok(host)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The root state.
    pub fn top(&self) -> &State {
        &self.top
    }

    /// The state the host is in. Once initialized this is always a leaf,
    /// except while a transition is resolving a composite target.
    pub fn current_state(&self) -> State {
        let current = self.control.lock().current;
        self.nodes
            .get(&current)
            .map(|node| node.state().clone())
            .unwrap_or_else(|| self.top.clone())
    }

    /// Registered node for `state`, if any.
    pub fn node(&self, state: &State) -> Option<&StateNode<P>> {
        self.nodes.get(&state.id())
    }

    /// Registered event codes in ascending order, reserved codes included.
    pub fn events(&self) -> impl Iterator<Item = EventCode> + '_ {
        self.events.iter().copied()
    }

    /// Whether a transition or event is in flight.
    pub fn is_busy(&self) -> bool {
        self.control.lock().is_busy()
    }

    /// Number of instructions waiting to run.
    pub fn queued(&self) -> usize {
        self.control.lock().queue.len()
    }

    /// Copy of the transition journal.
    pub fn history(&self) -> TransitionHistory {
        self.control.lock().history.clone()
    }

    pub fn status(&self) -> HostStatus {
        let current = self.current_state();
        let control = self.control.lock();
        HostStatus {
            name: self.config.name.clone(),
            current: current.id(),
            current_name: current.name().to_string(),
            busy: control.is_busy(),
            queued: control.queue.len(),
            transitions: control.history.total_recorded(),
        }
    }

    /// Request a transition to `destination`.
    ///
    /// Runs to completion before returning if the host is idle, otherwise
    /// queues the request. A request for the current state does nothing.
    /// Fails while a Start or Exit handler is running.
    pub fn transition_to(&self, destination: &State) -> Result<(), HostError> {
        let target = destination.id();
        if !self.nodes.contains_key(&target) {
            return Err(HostError::UnregisteredState(destination.name().to_string()));
        }

        let first = {
            let mut control = self.control.lock();
            if !control.allow_transitions {
                return Err(HostError::TransitionsBlocked {
                    current: self.name_of(control.current),
                });
            }
            if control.current == target {
                trace!(host = %self.config.name, state = %destination, "already in requested state");
                return Ok(());
            }
            self.enqueue(&mut control, Instruction::Transition { target })
        };

        self.run(first)
    }

    /// Raise an application event against the current state.
    ///
    /// Runs to completion before returning if the host is idle, otherwise
    /// queues the event.
    pub fn raise_event(&self, code: EventCode, payload: Option<P>) -> Result<(), HostError> {
        if code.is_infrastructure() {
            return Err(HostError::ReservedEvent(code));
        }
        if !self.events.contains(&code) {
            return Err(HostError::UnregisteredEvent(code));
        }

        let first = {
            let mut control = self.control.lock();
            self.enqueue(&mut control, Instruction::Event { code, payload })
        };

        self.run(first)
    }

    /// Queue `instruction`. If the host is idle, hand back the instruction
    /// the caller should now run, which is the oldest one waiting.
    fn enqueue(&self, control: &mut Control<P>, instruction: Instruction<P>) -> Option<Instruction<P>> {
        let kind = instruction.kind();
        control.queue.push(instruction);
        if control.is_busy() {
            debug!(host = %self.config.name, kind, queued = control.queue.len(), "host busy, instruction queued");
            return None;
        }
        control.next_runnable()
    }

    /// Execute instructions until the queue is drained.
    ///
    /// A failing instruction does not stop the drain; the first error is
    /// returned once the queue is empty.
    fn run(&self, mut next: Option<Instruction<P>>) -> Result<(), HostError> {
        let mut failure = None;
        while let Some(instruction) = next.take() {
            let in_flight = InFlight::new(&self.control);
            let outcome = self.execute(instruction);

            let mut control = in_flight.complete();
            if let Err(error) = outcome {
                warn!(host = %self.config.name, %error, "instruction failed");
                failure.get_or_insert(error);
            }
            next = control.next_runnable();
        }
        failure.map_or(Ok(()), Err)
    }

    fn execute(&self, instruction: Instruction<P>) -> Result<(), HostError> {
        match instruction {
            Instruction::Transition { target } => self.change_state(target),
            Instruction::Event { code, payload } => {
                let current = self.control.lock().current;
                let node = self.lookup(current)?;
                let handled = node.process_event(code, payload.as_ref(), self)?;
                if !handled {
                    trace!(host = %self.config.name, state = %node.state(), event = %code, "event not handled");
                }
                Ok(())
            }
        }
    }

    /// Exit the current state, resolve `target` down to a leaf through
    /// starting children, then enter that leaf.
    fn change_state(&self, target: StateId) -> Result<(), HostError> {
        let old = self.lookup(self.control.lock().current)?;
        let destination = self.lookup(target)?;

        old.exit(destination, self)?;
        self.set_current(destination.id());

        let mut current = destination;
        while let Some(starting) = current.starting() {
            current.start(self)?;
            current = self.lookup(starting)?;
            self.set_current(current.id());
        }

        current.enter(old, self)?;

        debug!(
            host = %self.config.name,
            from = %old.state(),
            requested = %destination.state(),
            to = %current.state(),
            "transition complete"
        );
        self.control.lock().history.record(TransitionRecord {
            from: old.id(),
            target,
            to: current.id(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn set_current(&self, id: StateId) {
        self.control.lock().current = id;
    }

    fn name_of(&self, id: StateId) -> String {
        self.nodes
            .get(&id)
            .map(|node| node.name().to_string())
            .unwrap_or_else(|| id.to_string())
    }
}

impl<P> StateLookup<P> for StateHost<P> {
    fn lookup(&self, id: StateId) -> Result<&StateNode<P>, StateError> {
        self.nodes.get(&id).ok_or(StateError::UnknownState(id))
    }
}

impl<P: Send + 'static> NodeHost<P> for StateHost<P> {
    fn begin_processing(&self) -> Result<(), StateError> {
        let mut control = self.control.lock();
        if control.processing {
            return Err(StateError::Reentrant);
        }
        control.processing = true;
        Ok(())
    }

    fn end_processing(&self) {
        let mut control = self.control.lock();
        control.processing = false;
        control.allow_transitions = true;
    }

    fn block_transitions(&self) {
        self.control.lock().allow_transitions = false;
    }

    fn dispatch(&self, node: &StateNode<P>, code: EventCode, payload: Option<&P>) -> bool {
        trace!(host = %self.config.name, state = %node.state(), event = %code, "dispatch");
        let context = Context::new(self, node.state());
        (node.handler())(&context, code, payload)
    }
}
