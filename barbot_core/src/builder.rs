//! Builder for `Executor`.
//!
//! Every field has a default except the relay driver. `build()` checks the
//! timing knobs and reports problems as `BuildError` wrapped in an `eyre::Report`.

use std::time::Duration;

use barbot_traits::clock::{Clock, MonotonicClock};
use barbot_traits::RelayDriver;
use crossbeam_channel as xch;

use crate::cancel::CancelToken;
use crate::config::{ExecutorCfg, Policy, StaggerTiming};
use crate::error::{BuildError, Result};
use crate::executor::Executor;
use crate::progress::Progress;

/// Longest accepted progress tick and cancel poll interval.
const MAX_INTERVAL: Duration = Duration::from_secs(10);

pub struct ExecutorBuilder<R, C = MonotonicClock> {
    driver: Option<R>,
    clock: C,
    cfg: ExecutorCfg,
    cancel: Option<CancelToken>,
    progress: Option<xch::Sender<Progress>>,
}

impl<R> Default for ExecutorBuilder<R> {
    fn default() -> Self {
        Self {
            driver: None,
            clock: MonotonicClock::new(),
            cfg: ExecutorCfg::default(),
            cancel: None,
            progress: None,
        }
    }
}

impl<R, C> ExecutorBuilder<R, C> {
    pub fn with_driver(mut self, driver: R) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Swap the time source, typically for a simulated clock in tests.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ExecutorBuilder<R, C2> {
        ExecutorBuilder {
            driver: self.driver,
            clock,
            cfg: self.cfg,
            cancel: self.cancel,
            progress: self.progress,
        }
    }

    pub fn with_config(mut self, cfg: ExecutorCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.cfg.policy = policy;
        self
    }

    pub fn with_stagger_timing(mut self, timing: StaggerTiming) -> Self {
        self.cfg.stagger_timing = timing;
        self
    }

    pub fn with_progress_tick(mut self, tick: Duration) -> Self {
        self.cfg.progress_tick = tick;
        self
    }

    pub fn with_cancel_poll(mut self, poll: Duration) -> Self {
        self.cfg.cancel_poll = poll;
        self
    }

    /// Share a cancellation token with the caller (e.g. a Ctrl-C handler).
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Publish progress updates on `tx` while a run is in flight.
    pub fn with_progress(mut self, tx: xch::Sender<Progress>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn build(self) -> Result<Executor<R, C>>
    where
        R: RelayDriver,
        C: Clock,
    {
        let driver = self
            .driver
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDriver))?;
        if self.cfg.progress_tick.is_zero() || self.cfg.progress_tick > MAX_INTERVAL {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "progress_tick must be in (0, 10s]",
            )));
        }
        if self.cfg.cancel_poll.is_zero() || self.cfg.cancel_poll > MAX_INTERVAL {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "cancel_poll must be in (0, 10s]",
            )));
        }
        Ok(Executor {
            driver,
            clock: self.clock,
            cfg: self.cfg,
            cancel: self.cancel.unwrap_or_default(),
            progress: self.progress,
        })
    }
}
