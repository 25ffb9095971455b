//! State identity and the id allocator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

static SHARED: LazyLock<Arc<IdAllocator>> = LazyLock::new(|| Arc::new(IdAllocator::new()));

/// Unique identity of a state, assigned once at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(u64);

impl StateId {
    /// Raw numeric value of the id.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of [`StateId`]s.
///
/// Ids start at 0, strictly increase, and are never handed out twice by the
/// same allocator. Allocation is lock-free and safe from any number of threads
/// constructing states at once.
///
/// Every state registered with one host must come from the same allocator,
/// otherwise two states may share an id and registration fails. Most programs
/// use [`IdAllocator::shared`]; tests and embedders that want isolation can
/// inject their own through [`HostBuilder::allocator`](crate::builder::HostBuilder::allocator).
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// The process-wide allocator.
    pub fn shared() -> Arc<IdAllocator> {
        Arc::clone(&SHARED)
    }

    /// Hand out the next id.
    pub fn next_id(&self) -> StateId {
        StateId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
