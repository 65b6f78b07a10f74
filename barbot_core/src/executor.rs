//! Runs a dispense plan against a relay driver.
//!
//! Every policy goes through a `Ledger` that remembers which relays are on.
//! The ledger switches off anything still energised when the run ends, on
//! every exit path including cancellation, driver failure, and unwinding.
use std::sync::OnceLock;
use std::thread;
use std::time::Instant;

use barbot_traits::{Clock, MonotonicClock, RelayDriver};
use crossbeam_channel as xch;
use tracing::{debug, error, info, warn};

use crate::builder::ExecutorBuilder;
use crate::cancel::CancelToken;
use crate::config::{ExecutorCfg, Policy, StaggerTiming};
use crate::error::DispenseError;
use crate::hw_error::map_hw_error;
use crate::motor_map::MotorMap;
use crate::planner::{DispensePlan, PlanStep};
use crate::progress::{Progress, ProgressTicker, publish_final};
use crate::run::{DispenseRun, RelayRecord};
use crate::status::{InterruptReason, RelayPhase, RunStatus};
use crate::util::duration_ms;

/// Records of one run plus the first driver failure, if any.
type Outcome = (Vec<RelayRecord>, Option<DispenseError>);

pub struct Executor<R, C = MonotonicClock> {
    pub(crate) driver: R,
    pub(crate) clock: C,
    pub(crate) cfg: ExecutorCfg,
    pub(crate) cancel: CancelToken,
    pub(crate) progress: Option<xch::Sender<Progress>>,
}

impl<R, C> core::fmt::Debug for Executor<R, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Executor")
            .field("cfg", &self.cfg)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl<R: RelayDriver> Executor<R> {
    /// Start building an Executor on the wall clock.
    pub fn builder() -> ExecutorBuilder<R> {
        ExecutorBuilder::default()
    }
}

impl<R: RelayDriver, C: Clock + Sync> Executor<R, C> {
    pub fn driver(&self) -> &R {
        &self.driver
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &ExecutorCfg {
        &self.cfg
    }

    /// Token observed by every run. Cancelling it interrupts the current run
    /// and every later run until `CancelToken::reset` is called.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Put every mapped relay into its safe state.
    pub fn initialize(&self, motors: &MotorMap) -> Result<(), DispenseError> {
        self.driver
            .initialize(motors.relays())
            .map_err(|e| map_hw_error(&*e))
    }

    pub fn shutdown(&self) -> Result<(), DispenseError> {
        self.driver.shutdown().map_err(|e| map_hw_error(&*e))
    }

    /// Run `plan` under the configured policy.
    pub fn execute(&self, plan: &DispensePlan) -> DispenseRun {
        self.execute_with(plan, self.cfg.policy)
    }

    /// Run `plan` under `policy`. Returns once every relay switched on by this
    /// run has been switched off again.
    pub fn execute_with(&self, plan: &DispensePlan, policy: Policy) -> DispenseRun {
        let total = plan.expected_total(policy);
        let started_at = self.clock.now();
        info!(
            name = plan.name(),
            %policy,
            steps = plan.len(),
            expected_ms = duration_ms(total),
            "dispense start"
        );

        let (relays, failure) = thread::scope(|s| {
            let _ticker = self.progress.clone().map(|tx| {
                ProgressTicker::spawn(s, &self.clock, tx, started_at, total, self.cfg.progress_tick)
            });
            match policy {
                Policy::Sequential => self.run_sequential(plan),
                Policy::Staggered => self.run_staggered(plan),
                Policy::Parallel => self.run_parallel(plan),
            }
        });

        let finished_at = self.clock.now();
        let status = match failure {
            Some(e) => RunStatus::Interrupted(InterruptReason::Hardware(e)),
            None if relays.iter().all(|r| r.phase == RelayPhase::Done) => RunStatus::Complete,
            None => RunStatus::Interrupted(InterruptReason::Cancelled),
        };
        let elapsed = finished_at.saturating_duration_since(started_at);

        match &status {
            RunStatus::Complete => {
                info!(
                    name = plan.name(),
                    elapsed_ms = self.clock.ms_since(started_at),
                    "dispense complete"
                );
            }
            RunStatus::Interrupted(InterruptReason::Cancelled) => {
                warn!(name = plan.name(), elapsed_ms = duration_ms(elapsed), "dispense cancelled");
            }
            RunStatus::Interrupted(InterruptReason::Hardware(e)) => {
                error!(name = plan.name(), error = %e, "dispense aborted");
            }
        }

        if let Some(tx) = &self.progress {
            let mut last = Progress::at(elapsed, total, status.state());
            if matches!(status, RunStatus::Complete) {
                last.fraction = 1.0;
            }
            publish_final(tx, last, self.cfg.progress_tick);
        }

        DispenseRun {
            name: plan.name().to_owned(),
            policy,
            status,
            started_at,
            finished_at,
            relays,
        }
    }

    /// Sleep until `deadline` in slices of at most `cancel_poll`.
    /// Returns false when cancelled first.
    fn wait_until(&self, deadline: Instant, cancel: &CancelToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let now = self.clock.now();
            if now >= deadline {
                return true;
            }
            self.clock
                .sleep_until(deadline.min(now + self.cfg.cancel_poll));
        }
    }

    fn run_sequential(&self, plan: &DispensePlan) -> Outcome {
        let mut ledger = Ledger::new(&self.driver, &self.clock, plan.steps());
        for (i, step) in plan.steps().iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            let Some(on_at) = ledger.activate(i) else {
                break;
            };
            ledger.begin(i);
            if !self.wait_until(on_at + step.duration(), &self.cancel) {
                break;
            }
            if !ledger.deactivate(i, true) {
                break;
            }
        }
        ledger.finish()
    }

    fn run_staggered(&self, plan: &DispensePlan) -> Outcome {
        let mut ledger = Ledger::new(&self.driver, &self.clock, plan.steps());
        for i in 0..plan.len() {
            if self.cancel.is_cancelled() || ledger.activate(i).is_none() {
                return ledger.finish();
            }
        }

        let t0 = self.clock.now();
        for i in 0..plan.len() {
            ledger.begin(i);
        }
        let mut prev = std::time::Duration::ZERO;
        for (i, step) in plan.steps().iter().enumerate() {
            let deadline = match self.cfg.stagger_timing {
                StaggerTiming::Absolute => t0 + step.duration(),
                StaggerTiming::Relative => {
                    self.clock.now() + step.duration().saturating_sub(prev)
                }
            };
            prev = step.duration();
            if !self.wait_until(deadline, &self.cancel) {
                break;
            }
            if !ledger.deactivate(i, true) {
                break;
            }
        }
        ledger.finish()
    }

    fn run_parallel(&self, plan: &DispensePlan) -> Outcome {
        // Siblings stop early on the first failure without cancelling the caller's token.
        let run_cancel = self.cancel.child();
        let first_failure: OnceLock<DispenseError> = OnceLock::new();

        let relays = thread::scope(|s| {
            let handles: Vec<_> = plan
                .steps()
                .iter()
                .map(|step| {
                    let run_cancel = &run_cancel;
                    let first_failure = &first_failure;
                    s.spawn(move || self.run_one(step, run_cancel, first_failure))
                })
                .collect();
            handles
                .into_iter()
                .zip(plan.steps())
                .map(|(handle, step)| {
                    handle.join().unwrap_or_else(|_| {
                        let _ = first_failure.set(DispenseError::State(format!(
                            "relay {} task panicked",
                            step.relay
                        )));
                        run_cancel.cancel();
                        RelayRecord::from_step(step)
                    })
                })
                .collect::<Vec<_>>()
        });
        (relays, first_failure.into_inner())
    }

    /// One relay task: owns `step.relay` for its whole lifetime.
    fn run_one(
        &self,
        step: &PlanStep,
        cancel: &CancelToken,
        first_failure: &OnceLock<DispenseError>,
    ) -> RelayRecord {
        let mut ledger = Ledger::new(&self.driver, &self.clock, std::slice::from_ref(step));
        if !cancel.is_cancelled()
            && let Some(on_at) = ledger.activate(0)
        {
            ledger.begin(0);
            if self.wait_until(on_at + step.duration(), cancel) {
                ledger.deactivate(0, true);
            }
        }
        let (mut records, failure) = ledger.finish();
        if let Some(err) = failure {
            let _ = first_failure.set(err);
            cancel.cancel();
        }
        records
            .pop()
            .unwrap_or_else(|| RelayRecord::from_step(step))
    }
}

/// Relays switched on during a run. Anything still on when the ledger is
/// finished or dropped gets switched off.
struct Ledger<'a, R: RelayDriver, C: Clock> {
    driver: &'a R,
    clock: &'a C,
    records: Vec<RelayRecord>,
    failure: Option<DispenseError>,
}

impl<'a, R: RelayDriver, C: Clock> Ledger<'a, R, C> {
    fn new(driver: &'a R, clock: &'a C, steps: &[PlanStep]) -> Self {
        Self {
            driver,
            clock,
            records: steps.iter().map(RelayRecord::from_step).collect(),
            failure: None,
        }
    }

    /// Switch relay `i` on. Returns the activation instant, or None on driver failure.
    fn activate(&mut self, i: usize) -> Option<Instant> {
        let relay = self.records[i].relay;
        match self.driver.activate(relay) {
            Ok(()) => {
                let now = self.clock.now();
                let rec = &mut self.records[i];
                rec.activated_at = Some(now);
                rec.phase = RelayPhase::Activated;
                debug!(relay, motor = rec.motor, planned_ms = duration_ms(rec.planned), "relay on");
                Some(now)
            }
            Err(e) => {
                let err = map_hw_error(&*e);
                error!(relay, error = %err, "relay activation failed");
                self.fail(err);
                None
            }
        }
    }

    fn begin(&mut self, i: usize) {
        if self.records[i].phase == RelayPhase::Activated {
            self.records[i].phase = RelayPhase::Dispensing;
        }
    }

    /// Switch relay `i` off; `completed` marks a full-length pour.
    fn deactivate(&mut self, i: usize, completed: bool) -> bool {
        let relay = self.records[i].relay;
        match self.driver.deactivate(relay) {
            Ok(()) => {
                let now = self.clock.now();
                let rec = &mut self.records[i];
                rec.deactivated_at = Some(now);
                rec.phase = if completed {
                    RelayPhase::Done
                } else {
                    RelayPhase::Deactivated
                };
                debug!(relay, completed, "relay off");
                true
            }
            Err(e) => {
                let err = map_hw_error(&*e);
                error!(relay, error = %err, "relay deactivation failed");
                self.fail(err);
                false
            }
        }
    }

    fn fail(&mut self, err: DispenseError) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
    }

    fn release_all(&mut self) {
        for i in 0..self.records.len() {
            if self.records[i].phase.is_energised() {
                warn!(relay = self.records[i].relay, "switching off relay before returning");
                self.deactivate(i, false);
            }
        }
    }

    fn finish(mut self) -> Outcome {
        self.release_all();
        (
            std::mem::take(&mut self.records),
            self.failure.take(),
        )
    }
}

impl<R: RelayDriver, C: Clock> Drop for Ledger<'_, R, C> {
    fn drop(&mut self) {
        self.release_all();
    }
}
