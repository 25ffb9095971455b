//! Handler signature and the context handed to handlers.

use super::error::HostError;
use super::machine::StateHost;
use crate::core::{EventCode, State};
use std::sync::Arc;

/// Per-state event handler.
///
/// Receives the dispatch context, the event code and the optional payload,
/// and reports whether it handled the event. Handlers see the reserved
/// Start, Entry and Exit codes as well as application events.
pub type EventHandler<P> =
    Arc<dyn Fn(&Context<'_, P>, EventCode, Option<&P>) -> bool + Send + Sync>;

/// Wrap a closure as an [`EventHandler`].
pub fn handler<P, F>(f: F) -> EventHandler<P>
where
    F: Fn(&Context<'_, P>, EventCode, Option<&P>) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What a handler can see and do while it runs.
///
/// Requests made through the context never run inline: the host is busy
/// while a handler runs, so they are queued and executed in order once the
/// current instruction completes.
pub struct Context<'a, P> {
    host: &'a StateHost<P>,
    state: &'a State,
}

impl<'a, P: Send + 'static> Context<'a, P> {
    pub(crate) fn new(host: &'a StateHost<P>, state: &'a State) -> Self {
        Self { host, state }
    }

    /// The state whose handler is running. For a bubbled event this is the
    /// parent, not the current leaf.
    pub fn state(&self) -> &State {
        self.state
    }

    /// The host's current state.
    pub fn current(&self) -> State {
        self.host.current_state()
    }

    pub fn host_name(&self) -> &str {
        self.host.name()
    }

    /// Request a transition. Fails while a Start or Exit handler is running.
    pub fn transition_to(&self, destination: &State) -> Result<(), HostError> {
        self.host.transition_to(destination)
    }

    /// Raise an application event.
    pub fn raise_event(&self, code: EventCode, payload: Option<P>) -> Result<(), HostError> {
        self.host.raise_event(code, payload)
    }
}
