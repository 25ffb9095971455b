//! Checks run once registration is complete.
//!
//! Every check contributes to a single `Validation`, so a broken topology
//! reports all of its defects at once instead of one per attempt.

use super::error::TopologyError;
use crate::core::{EventCode, StateId, StateNode};
use std::collections::{BTreeMap, BTreeSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<TopologyError>>;

/// Validate event numbering, parent chains and every declared starting state.
pub(crate) fn validate_topology<P>(
    nodes: &BTreeMap<StateId, StateNode<P>>,
    events: &BTreeSet<EventCode>,
) -> Check {
    let mut checks = vec![check_event_numbering(events)];
    checks.extend(nodes.values().map(|node| check_attached(node, nodes)));
    checks.extend(nodes.values().map(|node| check_starting_state(node, nodes)));

    Validation::all_vec(checks).map(|_| ())
}

/// Registered codes, sorted, must be exactly `-3, -2, -1, 0, 1, ..`.
pub(crate) fn check_event_numbering(events: &BTreeSet<EventCode>) -> Check {
    let sequence = EventCode::START.value()..;
    for (expected, found) in sequence.zip(events.iter().map(|code| code.value())) {
        if expected != found {
            return Validation::fail(TopologyError::EventNumbering { expected, found });
        }
    }
    Validation::success(())
}

/// Every parent chain must end at Top within `nodes.len()` hops.
///
/// Top is the only node without a parent, so a chain that never ends
/// there loops.
pub(crate) fn check_attached<P>(
    node: &StateNode<P>,
    nodes: &BTreeMap<StateId, StateNode<P>>,
) -> Check {
    let mut cursor = node;
    for _ in 0..nodes.len() {
        let Some(parent) = cursor.parent() else {
            return Validation::success(());
        };
        match nodes.get(&parent) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    Validation::fail(TopologyError::DetachedState {
        state: node.name().to_string(),
    })
}

/// A declared starting state must be one of the declaring state's children.
pub(crate) fn check_starting_state<P>(
    node: &StateNode<P>,
    nodes: &BTreeMap<StateId, StateNode<P>>,
) -> Check {
    let Some(starting) = node.starting() else {
        return Validation::success(());
    };

    let starting_name = nodes
        .get(&starting)
        .map(|n| n.name().to_string())
        .unwrap_or_else(|| starting.to_string());

    if !node.is_composite() {
        Validation::fail(TopologyError::StartingStateWithoutChildren {
            state: node.name().to_string(),
            starting: starting_name,
        })
    } else if !node.is_child(starting) {
        Validation::fail(TopologyError::StartingStateNotChild {
            state: node.name().to_string(),
            starting: starting_name,
        })
    } else {
        Validation::success(())
    }
}
