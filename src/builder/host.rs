//! Builder for constructing state hosts.

use crate::core::IdAllocator;
use crate::host::{HostConfig, HostError, StateHost, Topology};
use std::sync::Arc;

/// Builder for configuring and initializing a [`StateHost`].
///
/// # Example
///
/// ```rust
/// use hierarch::builder::HostBuilder;
/// use hierarch::core::{IdAllocator, State};
/// use hierarch::host::{HostError, Registrar, StateHost, Topology};
/// use std::sync::Arc;
///
/// struct Single(State);
///
/// impl Topology<()> for Single {
///     fn top_starting_state(&self) -> Option<&State> {
///         Some(&self.0)
///     }
///
///     fn register_states(&self, registrar: &mut Registrar<()>) -> Result<(), HostError> {
///         registrar.register_state(&self.0, |_, _, _| false, None, None)
///     }
///
///     fn register_events(&self, _registrar: &mut Registrar<()>) -> Result<(), HostError> {
///         Ok(())
///     }
/// }
///
/// let ids = Arc::new(IdAllocator::new());
/// let only = State::with_allocator("Only", &ids).unwrap();
///
/// let host: StateHost = HostBuilder::new()
///     .name("single")
///     .history_limit(Some(16))
///     .allocator(Arc::clone(&ids))
///     .build(Single(only.clone()))
///     .unwrap();
///
/// assert_eq!(host.name(), "single");
/// assert_eq!(host.current_state(), only);
/// ```
#[derive(Debug, Default)]
pub struct HostBuilder {
    config: HostConfig,
    allocator: Option<Arc<IdAllocator>>,
}

impl HostBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Name used in log events and status snapshots.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn record_history(mut self, enabled: bool) -> Self {
        self.config.record_history = enabled;
        self
    }

    /// Cap the transition journal; `None` keeps everything.
    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Allocator for the root state's id. Must be the one the topology's
    /// states were created with. Defaults to [`IdAllocator::shared`].
    pub fn allocator(mut self, allocator: Arc<IdAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// Run the topology's registration hooks, validate the tree and settle
    /// the host in its starting leaf.
    pub fn build<P, T>(self, topology: T) -> Result<StateHost<P>, HostError>
    where
        P: Send + 'static,
        T: Topology<P>,
    {
        let allocator = self.allocator.unwrap_or_else(IdAllocator::shared);
        StateHost::initialize(self.config, &allocator, topology)
    }
}
