//! Controller-level tests: state derivation, precondition-guarded pulses,
//! debounced event emission, bind rollback and shutdown semantics.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use embedded_hal::digital::PinState;
use garagepi::app::events::{DoorEvent, EventKind};
use garagepi::app::ports::GpioError;
use garagepi::door::{DoorController, DoorState, PULSE_WIDTH};
use garagepi::Error;

use crate::mock_gpio::{
    fire_edge, pulse_gap, set_level, test_config, MockGpio, SharedState, BUTTON, CLOSE, OPEN,
    SENSOR, STEP, STOP,
};

fn make_door(initial_sensor: PinState) -> (DoorController<MockGpio>, SharedState) {
    let (gpio, state) = MockGpio::new();
    set_level(&state, SENSOR, initial_sensor);
    let door = DoorController::new(test_config(), gpio).expect("bind must succeed");
    (door, state)
}

/// Collect every event of one kind into a shared vec.
fn collect_events(
    door: &DoorController<MockGpio>,
    kind: EventKind,
) -> Arc<Mutex<Vec<DoorEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    door.events().subscribe(kind, move |event| {
        sink.lock().unwrap().push(*event);
        Ok(())
    });
    seen
}

// ── State derivation ─────────────────────────────────────────

#[test]
fn state_is_pure_function_of_sensor_level() {
    let (door, state) = make_door(PinState::Low);
    assert_eq!(door.state(), DoorState::Closed);

    set_level(&state, SENSOR, PinState::High);
    assert_eq!(door.state(), DoorState::Open);

    state.lock().unwrap().fail_reads = true;
    assert_eq!(door.state(), DoorState::Unknown);

    // Recovery: the next successful read is authoritative again.
    state.lock().unwrap().fail_reads = false;
    assert_eq!(door.state(), DoorState::Open);
}

#[test]
fn button_state_is_a_raw_read() {
    let (door, state) = make_door(PinState::Low);
    // Pull-up idle.
    assert!(door.button_state());
    set_level(&state, BUTTON, PinState::Low);
    assert!(!door.button_state());
}

#[test]
fn button_read_failure_reports_not_pressed() {
    let (door, state) = make_door(PinState::Low);
    // Pull-up idle reads high while the line is healthy.
    assert!(door.button_state());

    state.lock().unwrap().fail_reads = true;
    assert!(!door.button_state());

    state.lock().unwrap().fail_reads = false;
    assert!(door.button_state());
}

#[test]
fn relays_rest_inactive_after_bind() {
    let (_door, state) = make_door(PinState::Low);
    let s = state.lock().unwrap();
    for line in [STOP, OPEN, CLOSE, STEP] {
        assert_eq!(s.levels.get(&line), Some(&PinState::Low), "line {line}");
    }
}

#[test]
fn inverted_relays_rest_high_and_pulse_low() {
    let (gpio, state) = MockGpio::new();
    set_level(&state, SENSOR, PinState::Low);
    let mut config = test_config();
    config.invert_relay = true;
    let door = DoorController::new(config, gpio).unwrap();

    assert_eq!(
        state.lock().unwrap().levels.get(&STEP),
        Some(&PinState::High)
    );

    door.open();
    let writes = state.lock().unwrap().writes_on(STEP);
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].level, PinState::Low);
    assert_eq!(writes[1].level, PinState::High);
}

// ── Precondition-guarded commands ────────────────────────────

#[test]
fn open_from_closed_pulses_step_relay_once() {
    let (door, state) = make_door(PinState::Low);
    door.open();

    let s = state.lock().unwrap();
    let writes = s.writes_on(STEP);
    assert_eq!(writes.len(), 2, "one activation, one restore");
    assert_eq!(writes[0].level, PinState::High);
    assert_eq!(writes[1].level, PinState::Low);
    // The dedicated open relay is never driven; the opener is one toggle.
    assert!(s.writes_on(OPEN).is_empty());

    let held = pulse_gap(&writes);
    assert!(held >= PULSE_WIDTH, "pulse held only {held:?}");
    assert!(held < PULSE_WIDTH + Duration::from_millis(300));
}

#[test]
fn open_while_open_is_a_noop() {
    let (door, state) = make_door(PinState::High);
    door.open();
    assert!(state.lock().unwrap().writes.is_empty());
}

#[test]
fn close_while_closed_is_a_noop() {
    let (door, state) = make_door(PinState::Low);
    door.close();
    assert!(state.lock().unwrap().writes.is_empty());
}

#[test]
fn close_from_open_pulses_step_relay() {
    let (door, state) = make_door(PinState::High);
    door.close();
    assert_eq!(state.lock().unwrap().writes_on(STEP).len(), 2);
}

#[test]
fn step_requires_closed() {
    let (door, state) = make_door(PinState::High);
    door.step();
    assert!(state.lock().unwrap().writes_on(STEP).is_empty());

    set_level(&state, SENSOR, PinState::Low);
    door.step();
    assert_eq!(state.lock().unwrap().writes_on(STEP).len(), 2);
}

#[test]
fn stop_pulses_regardless_of_state() {
    let (door, state) = make_door(PinState::High);
    state.lock().unwrap().fail_reads = true;
    assert_eq!(door.state(), DoorState::Unknown);

    door.stop();
    let writes = state.lock().unwrap().writes_on(STOP);
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].level, PinState::High);
    assert_eq!(writes[1].level, PinState::Low);
}

// ── Debounced event emission ─────────────────────────────────

#[test]
fn sensor_edge_settles_then_emits_fresh_state() {
    let (door, state) = make_door(PinState::Low);
    let seen = collect_events(&door, EventKind::StateChanged);

    // The level flips after the edge; the settled re-read must see it.
    set_level(&state, SENSOR, PinState::High);
    fire_edge(&state, SENSOR);
    thread::sleep(Duration::from_millis(500));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![DoorEvent::StateChanged(DoorState::Open)]
    );
}

#[test]
fn every_debounced_edge_emits_even_without_a_state_change() {
    let (door, state) = make_door(PinState::Low);
    let seen = collect_events(&door, EventKind::StateChanged);

    // Two debounced edges, same resulting state: no cross-edge dedup.
    fire_edge(&state, SENSOR);
    fire_edge(&state, SENSOR);
    thread::sleep(Duration::from_millis(900));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            DoorEvent::StateChanged(DoorState::Closed),
            DoorEvent::StateChanged(DoorState::Closed),
        ]
    );
}

#[test]
fn button_edge_emits_button_pressed_only_to_its_subscribers() {
    let (door, state) = make_door(PinState::Low);
    let presses = collect_events(&door, EventKind::ButtonPressed);
    let states = collect_events(&door, EventKind::StateChanged);

    fire_edge(&state, BUTTON);
    thread::sleep(Duration::from_millis(400));

    assert_eq!(*presses.lock().unwrap(), vec![DoorEvent::ButtonPressed]);
    assert!(states.lock().unwrap().is_empty());
}

#[test]
fn failing_subscriber_does_not_starve_the_next_one() {
    let (door, state) = make_door(PinState::Low);
    door.events().subscribe(EventKind::ButtonPressed, |_| {
        Err(anyhow::anyhow!("publish failed"))
    });
    let presses = collect_events(&door, EventKind::ButtonPressed);

    fire_edge(&state, BUTTON);
    thread::sleep(Duration::from_millis(400));

    assert_eq!(presses.lock().unwrap().len(), 1);
}

// ── Bind rollback and shutdown ───────────────────────────────

#[test]
fn bind_failure_rolls_back_claimed_lines() {
    let (gpio, state) = MockGpio::new();
    state.lock().unwrap().fail_claim_line = Some(CLOSE);

    let err = DoorController::new(test_config(), gpio).unwrap_err();
    match err {
        Error::HardwareBind { door, line, .. } => {
            assert_eq!(door, "left");
            assert_eq!(line, CLOSE);
        }
        other => panic!("expected HardwareBind, got {other:?}"),
    }

    let s = state.lock().unwrap();
    assert_eq!(s.release_calls, 1, "rollback must release claimed lines");
    assert!(s.claimed.is_empty());
}

#[test]
fn watch_registration_failure_rolls_back_like_a_claim_failure() {
    let (gpio, state) = MockGpio::new();
    state.lock().unwrap().fail_watch_line = Some(SENSOR);

    // All six claims succeed; registering the sensor watch does not.
    let err = DoorController::new(test_config(), gpio).unwrap_err();
    match err {
        Error::HardwareBind { door, line, source, .. } => {
            assert_eq!(door, "left");
            assert_eq!(line, SENSOR);
            assert_eq!(source, GpioError::WatchUnsupported(SENSOR));
        }
        other => panic!("expected HardwareBind, got {other:?}"),
    }

    let s = state.lock().unwrap();
    assert_eq!(s.release_calls, 1, "rollback must release claimed lines");
    assert!(s.claimed.is_empty());
    assert!(s.watches.is_empty());
}

#[test]
fn duplicate_line_config_is_rejected_before_binding() {
    let (gpio, state) = MockGpio::new();
    let mut config = test_config();
    config.relay_open = config.relay_step;
    assert!(matches!(
        DoorController::new(config, gpio),
        Err(Error::Config(_))
    ));
    assert!(state.lock().unwrap().claimed.is_empty());
}

#[test]
fn shutdown_releases_lines_exactly_once() {
    let (mut door, state) = make_door(PinState::Low);
    door.shutdown();
    door.shutdown();
    drop(door);
    assert_eq!(state.lock().unwrap().release_calls, 1);
}

#[test]
fn drop_releases_lines() {
    let (door, state) = make_door(PinState::Low);
    drop(door);
    let s = state.lock().unwrap();
    assert_eq!(s.release_calls, 1);
    // Relays are rested before the lines are released.
    assert_eq!(s.writes_on(STOP).last().map(|w| w.level), Some(PinState::Low));
}

#[test]
fn edges_after_shutdown_are_inert() {
    let (mut door, state) = make_door(PinState::Low);
    let seen = collect_events(&door, EventKind::StateChanged);
    door.shutdown();

    fire_edge(&state, SENSOR);
    thread::sleep(Duration::from_millis(400));
    assert!(seen.lock().unwrap().is_empty());
}
