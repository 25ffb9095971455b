//! Door Controller
//!
//! This example drives a small hierarchical state machine for a door.
//!
//! Key concepts:
//! - Composite state (`closed`) with a starting child (`unlocked`)
//! - Entry and exit notifications cascading one level up the tree
//! - Events bubbling from a leaf to its parent
//! - Typed payloads (a keypad code)
//!
//! Run with: cargo run --example door_controller

use hierarch::core::{EventCode, State};
use hierarch::host::{HostError, Registrar, Topology};
use hierarch::{events, states, HostBuilder, StateHost};

states! {
    struct Door {
        closed,
        unlocked,
        locked,
        opened,
    }
}

events! {
    mod door {
        OPEN,
        CLOSE,
        LOCK,
        UNLOCK,
    }
}

const KEYPAD_CODE: u32 = 1234;

struct DoorTopology {
    states: Door,
}

fn announce(state: &str, code: EventCode) {
    if code == EventCode::ENTRY {
        println!("  -> entered {state}");
    } else if code == EventCode::EXIT {
        println!("  <- left {state}");
    }
}

impl Topology<u32> for DoorTopology {
    fn top_starting_state(&self) -> Option<&State> {
        Some(&self.states.closed)
    }

    fn register_states(&self, registrar: &mut Registrar<u32>) -> Result<(), HostError> {
        let s = self.states.clone();

        // Opening is handled by the composite, so both children inherit it.
        let opened = s.opened.clone();
        registrar.register_state(
            &s.closed,
            move |ctx, code, _| {
                announce("closed", code);
                code == door::OPEN && ctx.transition_to(&opened).is_ok()
            },
            None,
            Some(&s.unlocked),
        )?;

        let locked = s.locked.clone();
        registrar.register_state(
            &s.unlocked,
            move |ctx, code, _| {
                announce("unlocked", code);
                code == door::LOCK && ctx.transition_to(&locked).is_ok()
            },
            Some(&s.closed),
            None,
        )?;

        let unlocked = s.unlocked.clone();
        registrar.register_state(
            &s.locked,
            move |ctx, code, payload| {
                announce("locked", code);
                match code {
                    c if c == door::UNLOCK && payload == Some(&KEYPAD_CODE) => {
                        ctx.transition_to(&unlocked).is_ok()
                    }
                    c if c == door::UNLOCK => {
                        println!("  wrong code {payload:?}");
                        true
                    }
                    // Swallow OPEN so it never reaches `closed`.
                    c if c == door::OPEN => {
                        println!("  the door is locked");
                        true
                    }
                    _ => false,
                }
            },
            Some(&s.closed),
            None,
        )?;

        let closed = s.closed.clone();
        registrar.register_state(
            &s.opened,
            move |ctx, code, _| {
                announce("opened", code);
                code == door::CLOSE && ctx.transition_to(&closed).is_ok()
            },
            None,
            None,
        )
    }

    fn register_events(&self, registrar: &mut Registrar<u32>) -> Result<(), HostError> {
        registrar.register_event(door::ALL.iter().copied())
    }
}

fn press(host: &StateHost<u32>, label: &str, code: EventCode, payload: Option<u32>) {
    println!("{label}:");
    if let Err(error) = host.raise_event(code, payload) {
        println!("  rejected: {error}");
    }
    println!("  now in {}\n", host.current_state());
}

fn main() {
    println!("=== Door Controller ===\n");

    let states = Door::new(&hierarch::core::IdAllocator::shared()).unwrap();

    println!("Initializing:");
    let host = HostBuilder::new()
        .name("door")
        .build(DoorTopology { states })
        .unwrap();
    println!("  now in {}\n", host.current_state());

    press(&host, "Lock", door::LOCK, None);
    press(&host, "Open while locked", door::OPEN, None);
    press(&host, "Unlock with wrong code", door::UNLOCK, Some(1111));
    press(&host, "Unlock", door::UNLOCK, Some(KEYPAD_CODE));
    press(&host, "Open", door::OPEN, None);
    press(&host, "Close", door::CLOSE, None);
    press(&host, "Reserved code", EventCode::ENTRY, None);

    println!("Visited: {:?}", host.history().get_path());
    println!("Status: {:?}", host.status());

    println!("\n=== Example Complete ===");
}
