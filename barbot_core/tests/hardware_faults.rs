mod common;

use std::sync::Arc;
use std::time::Duration;

use barbot_core::mocks::{ManualClock, RecordingRelays};
use barbot_core::{DispenseError, Executor, InterruptReason, Policy, RelayPhase, RunStatus};
use common::*;
use rstest::rstest;

fn hardware_error(status: &RunStatus) -> &DispenseError {
    match status {
        RunStatus::Interrupted(InterruptReason::Hardware(e)) => e,
        other => panic!("expected hardware interruption, got {other:?}"),
    }
}

fn trio() -> barbot_core::DispensePlan {
    // Relay order after sorting: 21 (1 s), 19 (2 s), 23 (4 s).
    planner(1.0)
        .plan(&recipe("Trio", &[("A", 1, 4.0), ("B", 2, 1.0), ("C", 3, 2.0)]))
        .expect("valid recipe")
}

#[rstest]
fn sequential_activation_failure_stops_the_run() {
    let clock = ManualClock::new();
    let driver = Arc::new(RecordingRelays::new(clock.clone()).failing_activate(19));
    let exec = Executor::builder()
        .with_driver(driver.clone())
        .with_clock(clock)
        .build()
        .expect("valid executor");

    let run = exec.execute_with(&trio(), Policy::Sequential);

    assert!(matches!(hardware_error(&run.status), DispenseError::Hardware(_)));
    let phases: Vec<_> = run.relays.iter().map(|r| r.phase).collect();
    assert_eq!(phases, vec![RelayPhase::Done, RelayPhase::Idle, RelayPhase::Idle]);
    assert_eq!(driver.activation_order(), vec![21, 19]);
    assert!(driver.energised().is_empty());
}

#[rstest]
fn staggered_activation_failure_switches_off_earlier_relays() {
    let clock = ManualClock::new();
    let driver = Arc::new(RecordingRelays::new(clock.clone()).failing_activate(23));
    let exec = Executor::builder()
        .with_driver(driver.clone())
        .with_clock(clock)
        .build()
        .expect("valid executor");

    let run = exec.execute_with(&trio(), Policy::Staggered);

    hardware_error(&run.status);
    assert!(driver.energised().is_empty());
    assert_eq!(driver.deactivation_order(), vec![21, 19]);
    assert_eq!(run.relays[0].phase, RelayPhase::Deactivated);
    assert_eq!(run.relays[1].phase, RelayPhase::Deactivated);
    assert_eq!(run.relays[2].phase, RelayPhase::Idle);
    assert_eq!(run.elapsed(), Duration::ZERO);
}

#[rstest]
fn parallel_failure_cancels_sibling_tasks() {
    let driver = Arc::new(RecordingRelays::new(barbot_traits::MonotonicClock::new()).failing_activate(21));
    let exec = Executor::builder()
        .with_driver(driver.clone())
        .with_policy(Policy::Parallel)
        .build()
        .expect("valid executor");
    // Every pour lasts seconds; the failure must cut them short.
    let plan = planner(1.0)
        .plan(&recipe("Trio", &[("A", 1, 4.0), ("B", 2, 3.0), ("C", 3, 2.0)]))
        .expect("valid recipe");

    let run = exec.execute(&plan);

    hardware_error(&run.status);
    assert!(run.elapsed() < Duration::from_secs(1));
    assert!(driver.energised().is_empty());
    assert!(run.relays.iter().all(|r| r.phase != RelayPhase::Done));
    // The caller's token is untouched by an internal failure.
    assert!(!exec.cancel_token().is_cancelled());
}

#[rstest]
fn stuck_relay_is_reported_as_energised() {
    let clock = ManualClock::new();
    let driver = Arc::new(RecordingRelays::new(clock.clone()).failing_deactivate(21));
    let exec = Executor::builder()
        .with_driver(driver.clone())
        .with_clock(clock)
        .build()
        .expect("valid executor");

    let run = exec.execute_with(&trio(), Policy::Sequential);

    let err = hardware_error(&run.status);
    assert!(err.to_string().contains("stuck on"), "{err}");
    assert_eq!(run.energised(), vec![21]);
    // Initial switch-off plus one retry during cleanup.
    assert_eq!(driver.deactivation_order(), vec![21, 21]);
    assert_eq!(driver.activation_order(), vec![21]);
}

#[rstest]
fn simulated_board_fault_maps_to_hardware_fault() {
    let board = barbot_hardware::SimulatedRelayBoard::new().with_fault(19);
    let exec = Executor::builder()
        .with_driver(board)
        .with_clock(ManualClock::new())
        .build()
        .expect("valid executor");
    exec.initialize(planner(1.0).motors()).expect("initialize");

    let run = exec.execute_with(&trio(), Policy::Staggered);

    assert!(matches!(
        hardware_error(&run.status),
        DispenseError::HardwareFault(_)
    ));
    assert!(exec.driver().energised().is_empty());
}
