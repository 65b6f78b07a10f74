mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use barbot_core::mocks::{ManualClock, RecordingRelays};
use barbot_core::{CancelToken, Executor, Policy, RelayPhase, RunStatus, InterruptReason};
use common::*;
use rstest::rstest;

fn cancel_at(
    at: Duration,
) -> (
    Executor<SimDriver, CancelAtClock>,
    SimDriver,
    CancelToken,
) {
    let inner = ManualClock::new();
    let token = CancelToken::new();
    let driver = Arc::new(RecordingRelays::new(inner.clone()));
    let exec = Executor::builder()
        .with_driver(driver.clone())
        .with_clock(CancelAtClock {
            inner,
            at,
            token: token.clone(),
        })
        .with_cancel_token(token.clone())
        .build()
        .expect("valid executor");
    (exec, driver, token)
}

#[rstest]
#[case::sequential(Policy::Sequential)]
#[case::staggered(Policy::Staggered)]
fn cancel_mid_pour_switches_everything_off(#[case] policy: Policy) {
    let (exec, driver, _token) = cancel_at(Duration::from_secs(20));
    let plan = planner(1.75)
        .plan(&recipe("Pair", &[("Rum", 1, 52.5), ("Lime", 2, 30.0)]))
        .expect("valid recipe");

    let run = exec.execute_with(&plan, policy);

    assert_eq!(run.status, RunStatus::Interrupted(InterruptReason::Cancelled));
    assert!(run.was_cancelled());
    assert!(driver.energised().is_empty());
    assert!(run.energised().is_empty());
    // Lime (17.1 s) finished; rum was cut short.
    assert_eq!(run.relays[0].phase, RelayPhase::Done);
    assert_eq!(run.relays[1].phase, RelayPhase::Deactivated);
    // Cancellation latency is bounded by one poll slice.
    assert_close(run.elapsed(), Duration::from_secs(20), Duration::from_millis(5));
}

#[rstest]
#[case::sequential(Policy::Sequential)]
#[case::staggered(Policy::Staggered)]
#[case::parallel(Policy::Parallel)]
fn cancelled_before_start_touches_nothing(#[case] policy: Policy) {
    let (exec, driver) = virtual_executor(ManualClock::new());
    let plan = planner(1.0)
        .plan(&recipe("One", &[("A", 1, 5.0)]))
        .expect("valid recipe");
    exec.cancel_token().cancel();

    let run = exec.execute_with(&plan, policy);

    assert!(run.was_cancelled());
    assert_eq!(driver.call_count(), 0);
    assert_eq!(run.relays[0].phase, RelayPhase::Idle);
}

#[rstest]
fn reset_token_allows_the_next_run() {
    let (exec, _driver) = virtual_executor(ManualClock::new());
    let plan = planner(1.0)
        .plan(&recipe("One", &[("A", 1, 5.0)]))
        .expect("valid recipe");
    let token = exec.cancel_token();
    token.cancel();
    assert!(exec.execute(&plan).was_cancelled());
    token.reset();
    assert!(exec.execute(&plan).is_complete());
}

#[rstest]
fn parallel_cancel_from_another_thread() {
    let driver = real_driver();
    let token = CancelToken::new();
    let exec = Executor::builder()
        .with_driver(driver.clone())
        .with_cancel_token(token.clone())
        .with_policy(Policy::Parallel)
        .build()
        .expect("valid executor");
    // 2 s and 3 s pours.
    let plan = planner(10.0)
        .plan(&recipe("Slow", &[("A", 1, 20.0), ("B", 2, 30.0)]))
        .expect("valid recipe");

    let run = thread::scope(|s| {
        s.spawn(|| {
            thread::sleep(Duration::from_millis(50));
            token.cancel();
        });
        exec.execute(&plan)
    });

    assert!(run.was_cancelled());
    assert!(run.elapsed() < Duration::from_secs(1));
    assert!(driver.energised().is_empty());
    assert!(
        run.relays
            .iter()
            .all(|r| r.phase == RelayPhase::Deactivated)
    );
}
