#![allow(dead_code)]
use std::sync::Arc;
use std::time::Duration;

use barbot_core::mocks::{ManualClock, RecordingRelays};
use barbot_core::{CancelToken, Executor, FlowRate, Ingredient, MotorMap, Planner, Recipe};
use barbot_traits::{Clock, MonotonicClock};

pub const PINS: [u8; 11] = [23, 21, 19, 15, 13, 11, 7, 5, 31, 33, 35];

pub fn planner(flow_ml_per_s: f64) -> Planner {
    let motors = MotorMap::new(PINS.to_vec()).expect("pins are unique");
    Planner::new(motors, FlowRate::new(flow_ml_per_s).expect("flow rate is valid"))
}

pub fn recipe(name: &str, ingredients: &[(&str, u32, f64)]) -> Recipe {
    Recipe::new(
        name,
        ingredients
            .iter()
            .map(|&(n, m, q)| Ingredient::new(n, m, q))
            .collect(),
    )
}

pub type SimDriver = Arc<RecordingRelays<ManualClock>>;

/// Executor on virtual time. The returned driver shares the executor's timeline.
pub fn virtual_executor(clock: ManualClock) -> (Executor<SimDriver, ManualClock>, SimDriver) {
    let driver = Arc::new(RecordingRelays::new(clock.clone()));
    let exec = Executor::builder()
        .with_driver(driver.clone())
        .with_clock(clock)
        .build()
        .expect("valid executor");
    (exec, driver)
}

pub type RealDriver = Arc<RecordingRelays<MonotonicClock>>;

pub fn real_driver() -> RealDriver {
    Arc::new(RecordingRelays::new(MonotonicClock::new()))
}

/// Sleeps overrun by a fixed amount, like a loaded scheduler.
#[derive(Debug, Clone)]
pub struct OverrunClock {
    pub inner: ManualClock,
    pub overrun: Duration,
}

impl Clock for OverrunClock {
    fn now(&self) -> std::time::Instant {
        self.inner.now()
    }

    fn sleep(&self, d: Duration) {
        self.inner.advance(d + self.overrun);
    }
}

/// Virtual clock that trips a cancel token once `at` has elapsed.
#[derive(Debug, Clone)]
pub struct CancelAtClock {
    pub inner: ManualClock,
    pub at: Duration,
    pub token: CancelToken,
}

impl Clock for CancelAtClock {
    fn now(&self) -> std::time::Instant {
        self.inner.now()
    }

    fn sleep(&self, d: Duration) {
        self.inner.advance(d);
        if self.inner.elapsed() >= self.at {
            self.token.cancel();
        }
    }
}

pub fn assert_close(actual: Duration, expected: Duration, tol: Duration) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= tol,
        "expected {expected:?} ± {tol:?}, got {actual:?}"
    );
}
