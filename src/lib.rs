//! Hierarch: a hierarchical state machine engine
//!
//! Hierarch lets an application describe a tree of nested states, route events
//! through it with statechart entry and exit semantics, and serialize every
//! event and transition request into a strict run-to-completion order.
//!
//! # Core Concepts
//!
//! - **State**: A named node in the tree; composite states declare a starting child
//! - **Topology**: The application's states, events and handlers, registered once
//! - **Host**: Owns the tree and the current state, and queues requests while busy
//! - **Lifecycle events**: Start, Entry and Exit, delivered by the host itself
//!
//! # Example
//!
//! ```rust
//! use hierarch::core::{EventCode, IdAllocator, State};
//! use hierarch::host::{HostError, Registrar, StateHost, Topology};
//! use hierarch::{events, states};
//! use std::sync::{Arc, Mutex};
//!
//! states! {
//!     struct Player {
//!         stopped,
//!         playing,
//!         track,
//!         paused,
//!     }
//! }
//!
//! events! {
//!     mod input {
//!         PLAY,
//!         PAUSE,
//!         STOP,
//!     }
//! }
//!
//! struct Machine {
//!     states: Player,
//!     log: Arc<Mutex<Vec<String>>>,
//! }
//!
//! impl Topology<()> for Machine {
//!     fn top_starting_state(&self) -> Option<&State> {
//!         Some(&self.states.stopped)
//!     }
//!
//!     fn register_states(&self, registrar: &mut Registrar<()>) -> Result<(), HostError> {
//!         let s = self.states.clone();
//!         let log = Arc::clone(&self.log);
//!         registrar.register_state(&s.stopped, {
//!             let playing = s.playing.clone();
//!             move |ctx, code, _| code == input::PLAY && ctx.transition_to(&playing).is_ok()
//!         }, None, None)?;
//!         registrar.register_state(&s.playing, {
//!             let stopped = s.stopped.clone();
//!             move |ctx, code, _| code == input::STOP && ctx.transition_to(&stopped).is_ok()
//!         }, None, Some(&s.track))?;
//!         registrar.register_state(&s.track, move |_, code, _| {
//!             log.lock().unwrap().push(format!("track {code}"));
//!             code == EventCode::ENTRY
//!         }, Some(&s.playing), None)?;
//!         registrar.register_state(&s.paused, |_, _, _| false, Some(&s.playing), None)
//!     }
//!
//!     fn register_events(&self, registrar: &mut Registrar<()>) -> Result<(), HostError> {
//!         registrar.register_event(input::ALL.iter().copied())
//!     }
//! }
//!
//! let states = Player::new(&IdAllocator::shared())?;
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let host: StateHost = StateHost::new(Machine { states: states.clone(), log: Arc::clone(&log) })?;
//!
//! host.raise_event(input::PLAY, None)?;
//! assert_eq!(host.current_state(), states.track);
//! assert_eq!(log.lock().unwrap().as_slice(), ["track Entry"]);
//!
//! host.raise_event(input::STOP, None)?;
//! assert_eq!(host.current_state(), states.stopped);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod core;
pub mod host;

// Re-export commonly used types
pub use crate::builder::HostBuilder;
pub use crate::core::{EventCode, State, StateId};
pub use crate::host::{Context, HostError, Registrar, StateHost, Topology};
