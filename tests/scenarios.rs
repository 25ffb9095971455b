//! End-to-end behaviour of a state host driven through its public API.

use hierarch::core::{EventCode, IdAllocator, State, StateId};
use hierarch::host::{
    handler, Context, EventHandler, HostError, Registrar, StateHost, Topology, TopologyError,
};
use hierarch::HostBuilder;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const E0: EventCode = EventCode::new(0);
const E1: EventCode = EventCode::new(1);

#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

/// Declarative test topology. Every handler logs `Name:code` before
/// running its optional reaction.
struct Fixture {
    ids: Arc<IdAllocator>,
    states: HashMap<String, State>,
    links: Vec<(State, Option<State>, Option<State>)>,
    top_starting: Option<State>,
    events: Vec<i32>,
    reactions: HashMap<StateId, EventHandler<u32>>,
    log: Log,
}

impl Fixture {
    fn new() -> Self {
        Self {
            ids: Arc::new(IdAllocator::new()),
            states: HashMap::new(),
            links: Vec::new(),
            top_starting: None,
            events: vec![0, 1],
            reactions: HashMap::new(),
            log: Log::default(),
        }
    }

    fn get(&mut self, name: &str) -> State {
        let ids = Arc::clone(&self.ids);
        self.states
            .entry(name.to_string())
            .or_insert_with(|| State::with_allocator(name, &ids).unwrap())
            .clone()
    }

    fn state(mut self, name: &str, parent: Option<&str>, starting: Option<&str>) -> Self {
        let state = self.get(name);
        let parent = parent.map(|p| self.get(p));
        let starting = starting.map(|s| self.get(s));
        self.links.push((state, parent, starting));
        self
    }

    fn top_starting(mut self, name: &str) -> Self {
        self.top_starting = Some(self.get(name));
        self
    }

    fn events(mut self, codes: &[i32]) -> Self {
        self.events = codes.to_vec();
        self
    }

    fn react<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Context<'_, u32>, EventCode, Option<&u32>) -> bool + Send + Sync + 'static,
    {
        let id = self.get(name).id();
        self.reactions.insert(id, handler(f));
    }

    fn build(&self) -> Result<StateHost<u32>, HostError> {
        let topology = FixtureTopology {
            links: self.links.clone(),
            top_starting: self.top_starting.clone(),
            events: self.events.clone(),
            reactions: self.reactions.clone(),
            log: self.log.clone(),
        };
        HostBuilder::new()
            .name("fixture")
            .allocator(Arc::clone(&self.ids))
            .build(topology)
    }
}

struct FixtureTopology {
    links: Vec<(State, Option<State>, Option<State>)>,
    top_starting: Option<State>,
    events: Vec<i32>,
    reactions: HashMap<StateId, EventHandler<u32>>,
    log: Log,
}

impl Topology<u32> for FixtureTopology {
    fn top_starting_state(&self) -> Option<&State> {
        self.top_starting.as_ref()
    }

    fn register_states(&self, registrar: &mut Registrar<u32>) -> Result<(), HostError> {
        for (state, parent, starting) in &self.links {
            let log = self.log.clone();
            let name = state.name().to_string();
            let reaction = self.reactions.get(&state.id()).cloned();
            registrar.register_state(
                state,
                move |ctx, code, payload| {
                    log.push(format!("{name}:{code}"));
                    reaction.as_ref().is_some_and(|r| r(ctx, code, payload))
                },
                parent.as_ref(),
                starting.as_ref(),
            )?;
        }
        Ok(())
    }

    fn register_events(&self, registrar: &mut Registrar<u32>) -> Result<(), HostError> {
        registrar.register_event(self.events.iter().copied())
    }

    fn top_handler(&self) -> EventHandler<u32> {
        let log = self.log.clone();
        handler(move |_, code, _| {
            log.push(format!("Top:{code}"));
            false
        })
    }
}

/// Top(starting A) ─ A(starting A1) ─ A1
///                 └ B
fn basic() -> Fixture {
    Fixture::new()
        .state("A", None, Some("A1"))
        .state("A1", Some("A"), None)
        .state("B", None, None)
        .top_starting("A")
}

#[test]
fn construction_settles_in_starting_leaf() {
    let mut fx = basic();
    let host = fx.build().unwrap();

    assert_eq!(host.current_state(), fx.get("A1"));
    assert_eq!(fx.log.take(), vec!["A:Start", "A:Entry", "A1:Entry"]);
    assert!(!host.is_busy());
}

#[test]
fn leaving_composite_exits_leaf_then_parent() {
    let mut fx = basic();
    let b = fx.get("B");
    fx.react("A1", move |ctx, code, _| {
        code == E0 && ctx.transition_to(&b).is_ok()
    });
    let host = fx.build().unwrap();
    fx.log.take();

    host.raise_event(E0, None).unwrap();

    assert_eq!(host.current_state(), fx.get("B"));
    assert_eq!(fx.log.take(), vec!["A1:0", "A1:Exit", "A:Exit", "B:Entry"]);
}

#[test]
fn entering_composite_resolves_to_leaf() {
    let mut fx = basic().top_starting("B");
    let a = fx.get("A");
    let host = fx.build().unwrap();
    assert_eq!(fx.log.take(), vec!["B:Entry"]);

    host.transition_to(&a).unwrap();

    assert_eq!(host.current_state(), fx.get("A1"));
    assert_eq!(
        fx.log.take(),
        vec!["B:Exit", "A:Start", "A:Entry", "A1:Entry"]
    );
}

#[test]
fn transition_to_current_state_is_a_no_op() {
    let mut fx = basic();
    let host = fx.build().unwrap();
    fx.log.take();
    let before = host.history().total_recorded();

    host.transition_to(&fx.get("A1")).unwrap();

    assert!(fx.log.take().is_empty());
    assert_eq!(host.history().total_recorded(), before);
}

#[test]
fn queued_transition_to_new_current_state_runs_again() {
    let mut fx = Fixture::new()
        .state("A", None, None)
        .state("B", None, None)
        .top_starting("A");
    let b = fx.get("B");
    fx.react("A", move |ctx, code, _| {
        if code != E0 {
            return false;
        }
        ctx.transition_to(&b).unwrap();
        ctx.transition_to(&b).unwrap();
        true
    });
    let host = fx.build().unwrap();
    fx.log.take();

    host.raise_event(E0, None).unwrap();

    assert_eq!(host.current_state(), fx.get("B"));
    assert_eq!(
        fx.log.take(),
        vec!["A:0", "A:Exit", "B:Entry", "B:Exit", "B:Entry"]
    );
}

#[test]
fn host_recovers_after_handler_panics() {
    let mut fx = basic();
    fx.react("A1", |_, code, _| {
        if code == E0 {
            panic!("handler failure");
        }
        false
    });
    let b = fx.get("B");
    let host = fx.build().unwrap();

    let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        host.raise_event(E0, None)
    }));
    assert!(unwound.is_err());
    assert!(!host.is_busy());

    host.transition_to(&b).unwrap();
    assert_eq!(host.current_state(), b);
    assert_eq!(host.queued(), 0);
}

#[test]
fn unregistered_event_fails_without_side_effects() {
    let mut fx = basic();
    let host = fx.build().unwrap();
    fx.log.take();

    assert_eq!(
        host.raise_event(EventCode::new(5), None),
        Err(HostError::UnregisteredEvent(EventCode::new(5)))
    );
    assert_eq!(
        host.raise_event(EventCode::EXIT, None),
        Err(HostError::ReservedEvent(EventCode::EXIT))
    );
    assert_eq!(host.current_state(), fx.get("A1"));
    assert_eq!(host.queued(), 0);
    assert!(fx.log.take().is_empty());
}

#[test]
fn unregistered_state_cannot_be_targeted() {
    let fx = basic();
    let host = fx.build().unwrap();
    let stranger = State::with_allocator("Stranger", &fx.ids).unwrap();

    assert_eq!(
        host.transition_to(&stranger),
        Err(HostError::UnregisteredState("Stranger".to_string()))
    );
}

#[test]
fn unhandled_event_bubbles_one_level_only() {
    let mut fx = Fixture::new()
        .state("G", None, Some("P"))
        .state("P", Some("G"), Some("L"))
        .state("L", Some("P"), None)
        .top_starting("G");
    fx.react("G", |_, code, _| code == E0);
    let host = fx.build().unwrap();
    fx.log.take();

    host.raise_event(E0, None).unwrap();

    assert_eq!(fx.log.take(), vec!["L:0", "P:0"]);
}

#[test]
fn children_of_top_bubble_into_top_handler() {
    let mut fx = basic().top_starting("B");
    let host = fx.build().unwrap();
    fx.log.take();

    host.raise_event(E1, Some(3)).unwrap();

    assert_eq!(host.current_state(), fx.get("B"));
    assert_eq!(fx.log.take(), vec!["B:1", "Top:1"]);
}

#[test]
fn payload_reaches_handler_and_parent() {
    let mut fx = basic();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for name in ["A", "A1"] {
        let seen = Arc::clone(&seen);
        let label = name.to_string();
        fx.react(name, move |_, code, payload| {
            if code == E0 {
                seen.lock().push((label.clone(), payload.copied()));
            }
            false
        });
    }
    let host = fx.build().unwrap();

    host.raise_event(E0, Some(42)).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![("A1".to_string(), Some(42)), ("A".to_string(), Some(42))]
    );
}

#[test]
fn requests_from_handlers_run_after_in_arrival_order() {
    let mut fx = basic();
    let b = fx.get("B");
    fx.react("A1", move |ctx, code, _| {
        if code != E0 {
            return false;
        }
        ctx.transition_to(&b).unwrap();
        ctx.raise_event(E1, None).unwrap();
        assert_eq!(ctx.current().name(), "A1");
        true
    });
    fx.react("B", |_, code, _| code == E1);
    let host = fx.build().unwrap();
    fx.log.take();

    host.raise_event(E0, None).unwrap();

    assert_eq!(
        fx.log.take(),
        vec!["A1:0", "A1:Exit", "A:Exit", "B:Entry", "B:1"]
    );
    assert_eq!(host.queued(), 0);
}

#[test]
fn transitions_are_blocked_during_start_and_exit() {
    let mut fx = basic();
    let b = fx.get("B");
    let outcomes = Arc::new(Mutex::new(Vec::new()));

    for name in ["A", "A1"] {
        let b = b.clone();
        let outcomes = Arc::clone(&outcomes);
        fx.react(name, move |ctx, code, _| {
            if code == EventCode::START || code == EventCode::EXIT {
                outcomes
                    .lock()
                    .push((ctx.state().name().to_string(), code, ctx.transition_to(&b)));
            }
            false
        });
    }
    let host = fx.build().unwrap();

    host.transition_to(&b).unwrap();
    assert_eq!(host.current_state(), b);

    let outcomes = outcomes.lock();
    assert_eq!(outcomes.len(), 3);
    for (state, code, result) in outcomes.iter() {
        assert!(
            matches!(result, Err(HostError::TransitionsBlocked { .. })),
            "{state}:{code} should have been blocked"
        );
    }
    assert_eq!(outcomes[0].1, EventCode::START);
    assert_eq!(outcomes[1].0, "A1");
    assert_eq!(outcomes[2].0, "A");
}

#[test]
fn transitions_requested_on_entry_are_queued() {
    let mut fx = basic();
    let b = fx.get("B");
    fx.react("A1", move |ctx, code, _| {
        code == EventCode::ENTRY && ctx.transition_to(&b).is_ok()
    });
    let host = fx.build().unwrap();

    assert_eq!(host.current_state(), fx.get("B"));
    assert_eq!(
        fx.log.take(),
        vec!["A:Start", "A:Entry", "A1:Entry", "A1:Exit", "A:Exit", "B:Entry"]
    );
}

#[test]
fn invalid_topology_reports_every_defect() {
    let fx = Fixture::new()
        .state("A", None, Some("B"))
        .state("A1", Some("A"), None)
        .state("B", None, None)
        .state("Leaf", None, Some("B"))
        .top_starting("A")
        .events(&[0, 2]);

    match fx.build() {
        Err(HostError::InvalidTopology(errors)) => {
            assert_eq!(errors.len(), 3);
            assert!(errors.contains(&TopologyError::EventNumbering {
                expected: 1,
                found: 2
            }));
            assert!(errors.contains(&TopologyError::StartingStateNotChild {
                state: "A".to_string(),
                starting: "B".to_string()
            }));
            assert!(errors.contains(&TopologyError::StartingStateWithoutChildren {
                state: "Leaf".to_string(),
                starting: "B".to_string()
            }));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected topology validation to fail"),
    }
}

#[test]
fn top_starting_state_must_be_child_of_top() {
    let fx = basic().top_starting("A1");
    assert!(matches!(
        fx.build(),
        Err(HostError::InvalidTopology(errors))
            if errors.iter().any(|e| matches!(e, TopologyError::StartingStateNotChild { state, .. } if state == "Top"))
    ));
}

#[test]
fn parent_cycles_are_rejected() {
    let fx = basic()
        .state("X", Some("Y"), None)
        .state("Y", Some("X"), None);

    match fx.build() {
        Err(HostError::InvalidTopology(errors)) => {
            assert_eq!(errors.len(), 2);
            for state in ["X", "Y"] {
                assert!(errors.contains(&TopologyError::DetachedState {
                    state: state.to_string()
                }));
            }
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected the cycle to be rejected"),
    }
}

#[test]
fn duplicate_registration_fails_initialization() {
    let fx = basic().state("B", None, None);
    assert!(matches!(
        fx.build(),
        Err(HostError::DuplicateState(name)) if name == "B"
    ));
}

#[test]
fn missing_top_starting_state_fails_initialization() {
    let mut fx = basic();
    fx.top_starting = None;
    assert!(matches!(fx.build(), Err(HostError::MissingTopStartingState)));
}

#[test]
fn history_tracks_resolved_leaves() {
    let mut fx = basic();
    let (a, a1, b) = (fx.get("A"), fx.get("A1"), fx.get("B"));
    let host = fx.build().unwrap();

    host.transition_to(&b).unwrap();
    host.transition_to(&a).unwrap();

    let history = host.history();
    assert_eq!(history.get_path(), vec![host.top().id(), a1.id(), b.id(), a1.id()]);
    let last = history.transitions().last().unwrap();
    assert_eq!(last.target, a.id());
    assert_eq!(last.to, a1.id());
    assert_eq!(host.status().transitions, 3);
}

#[test]
fn concurrent_callers_never_overlap_handlers() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;

    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));
    let handled = Arc::new(AtomicUsize::new(0));

    let mut fx = basic();
    {
        let (in_flight, max_seen, handled) =
            (Arc::clone(&in_flight), Arc::clone(&max_seen), Arc::clone(&handled));
        fx.react("A1", move |_, code, payload| {
            if code != E0 {
                return false;
            }
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_seen.fetch_max(now, Ordering::SeqCst);
            assert!(payload.is_some());
            thread::yield_now();
            handled.fetch_add(1, Ordering::SeqCst);
            in_flight.fetch_sub(1, Ordering::SeqCst);
            true
        });
    }
    let host = fx.build().unwrap();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let host = &host;
            scope.spawn(move || {
                for i in 0..PER_THREAD {
                    host.raise_event(E0, Some((t * PER_THREAD + i) as u32)).unwrap();
                }
            });
        }
    });

    assert_eq!(handled.load(Ordering::SeqCst), THREADS * PER_THREAD);
    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert_eq!(host.queued(), 0);
    assert!(!host.is_busy());
}

#[test]
fn status_reflects_current_state() {
    let fx = basic();
    let host = fx.build().unwrap();

    let status = host.status();
    assert_eq!(status.name, "fixture");
    assert_eq!(status.current_name, "A1");
    assert!(!status.busy);
    assert_eq!(status.queued, 0);
}
