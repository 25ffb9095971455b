//! The state host and its collaborator contract.
//!
//! A host is built from a [`Topology`]: the application registers its states
//! and events through a [`Registrar`], the host validates the result and
//! settles into the starting leaf. From then on the tree is fixed and the
//! host only routes events and transitions through it.

mod config;
mod context;
mod error;
mod machine;
mod topology;
mod validate;

pub use config::HostConfig;
pub use context::{handler, Context, EventHandler};
pub use error::{HostError, TopologyError};
pub use machine::{HostStatus, StateHost};
pub use topology::{Registrar, Topology};
