//! Transition journal.
//!
//! The host appends one [`TransitionRecord`] per completed transition. The
//! journal can be capped, in which case the oldest records are dropped first.

use super::id::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single completed transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The leaf the host was in before the transition
    pub from: StateId,
    /// The state the transition was requested for
    pub target: StateId,
    /// The leaf the target resolved to through starting children
    pub to: StateId,
    /// When the transition completed
    pub timestamp: DateTime<Utc>,
}

/// Ordered journal of transitions.
///
/// # Example
///
/// ```rust
/// use hierarch::core::{IdAllocator, TransitionHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let ids = IdAllocator::new();
/// let (a, b, c) = (ids.next_id(), ids.next_id(), ids.next_id());
///
/// let mut history = TransitionHistory::new(None);
/// history.record(TransitionRecord { from: a, target: b, to: b, timestamp: Utc::now() });
/// history.record(TransitionRecord { from: b, target: c, to: c, timestamp: Utc::now() });
///
/// assert_eq!(history.get_path(), vec![a, b, c]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionHistory {
    records: VecDeque<TransitionRecord>,
    limit: Option<usize>,
    total: u64,
}

impl TransitionHistory {
    /// Create an empty journal keeping at most `limit` records.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            records: VecDeque::new(),
            limit,
            total: 0,
        }
    }

    /// Append a record, evicting the oldest ones past the limit.
    pub fn record(&mut self, record: TransitionRecord) {
        self.total += 1;
        if self.limit == Some(0) {
            return;
        }
        self.records.push_back(record);
        if let Some(limit) = self.limit {
            while self.records.len() > limit {
                self.records.pop_front();
            }
        }
    }

    /// Records currently retained, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of transitions ever recorded, including evicted ones.
    pub fn total_recorded(&self) -> u64 {
        self.total
    }

    /// Leaves traversed: the first retained `from`, then every `to`.
    pub fn get_path(&self) -> Vec<StateId> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.front() {
            path.push(first.from);
        }
        path.extend(self.records.iter().map(|r| r.to));
        path
    }

    /// Time between the first and last retained record.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.records.front()?;
        let last = self.records.back()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }
}
