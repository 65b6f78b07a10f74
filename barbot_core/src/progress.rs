//! Background progress publishing.
//!
//! While a run is in flight a scoped ticker thread publishes `Progress` on a
//! crossbeam channel every tick, computed as `elapsed / planned_total`. Sends
//! never block: when a bounded channel is full the update is dropped and the
//! next tick carries fresher data.
//!
//! Ticks are paced by `recv_timeout` on a stop channel, not by the executor's
//! clock, so a simulated clock is never advanced by the ticker. The ticker
//! stops as soon as its handle is dropped.
use crossbeam_channel as xch;
use barbot_traits::Clock;
use std::thread::{Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use crate::status::RunState;
use crate::util::fraction;

/// One progress update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Completion in `[0, 1]`.
    pub fraction: f64,
    pub elapsed: Duration,
    pub state: RunState,
}

impl Progress {
    pub fn at(elapsed: Duration, total: Duration, state: RunState) -> Self {
        Self {
            fraction: fraction(elapsed, total),
            elapsed,
            state,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self.state, RunState::Complete | RunState::Interrupted)
    }
}

pub type Sender = xch::Sender<Progress>;
pub type Receiver = xch::Receiver<Progress>;

/// Unbounded channel suitable for `ExecutorBuilder::with_progress`.
pub fn channel() -> (Sender, Receiver) {
    xch::unbounded()
}

pub(crate) struct ProgressTicker<'scope> {
    /// Dropping the sender wakes the ticker with `Disconnected`.
    stop: Option<xch::Sender<()>>,
    join_handle: Option<ScopedJoinHandle<'scope, ()>>,
}

impl<'scope> ProgressTicker<'scope> {
    pub(crate) fn spawn<'env, C: Clock + Sync>(
        scope: &'scope Scope<'scope, 'env>,
        clock: &'env C,
        tx: xch::Sender<Progress>,
        start: Instant,
        total: Duration,
        tick: Duration,
    ) -> Self {
        let (stop_tx, stop_rx) = xch::bounded::<()>(0);
        let join_handle = scope.spawn(move || {
            loop {
                let elapsed = clock.now().saturating_duration_since(start);
                if tx
                    .try_send(Progress::at(elapsed, total, RunState::Running))
                    .is_err_and(|e| e.is_disconnected())
                {
                    tracing::debug!("progress consumer disconnected, stopping ticker");
                    break;
                }
                match stop_rx.recv_timeout(tick) {
                    Err(xch::RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            }
            tracing::trace!("progress ticker exiting cleanly");
        });
        Self {
            stop: Some(stop_tx),
            join_handle: Some(join_handle),
        }
    }
}

impl Drop for ProgressTicker<'_> {
    fn drop(&mut self) {
        self.stop.take();
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("progress ticker panicked during shutdown");
        }
    }
}

/// Publish the terminal update, waiting up to `tick` for room in a bounded channel.
pub(crate) fn publish_final(tx: &xch::Sender<Progress>, progress: Progress, tick: Duration) {
    if tx.send_timeout(progress, tick).is_err() {
        tracing::debug!(state = ?progress.state, "final progress update dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barbot_traits::MonotonicClock;

    #[test]
    fn ticker_publishes_until_dropped() {
        let clock = MonotonicClock::new();
        let (tx, rx) = channel();
        let start = clock.now();
        std::thread::scope(|s| {
            let ticker = ProgressTicker::spawn(
                s,
                &clock,
                tx,
                start,
                Duration::from_millis(40),
                Duration::from_millis(2),
            );
            std::thread::sleep(Duration::from_millis(25));
            drop(ticker);
        });
        let updates: Vec<Progress> = rx.try_iter().collect();
        assert!(updates.len() >= 2, "got {} updates", updates.len());
        assert!(updates.iter().all(|p| p.state == RunState::Running));
        assert!(
            updates
                .windows(2)
                .all(|w| w[0].fraction <= w[1].fraction)
        );
        assert!(updates.iter().all(|p| (0.0..=1.0).contains(&p.fraction)));
    }

    #[test]
    fn full_bounded_channel_never_blocks_ticker() {
        let clock = MonotonicClock::new();
        let (tx, rx) = xch::bounded(1);
        let start = clock.now();
        std::thread::scope(|s| {
            let ticker = ProgressTicker::spawn(
                s,
                &clock,
                tx,
                start,
                Duration::from_millis(10),
                Duration::from_millis(1),
            );
            std::thread::sleep(Duration::from_millis(10));
            drop(ticker);
        });
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn final_progress_is_marked() {
        let p = Progress::at(
            Duration::from_secs(3),
            Duration::from_secs(2),
            RunState::Complete,
        );
        assert!(p.is_final());
        assert_eq!(p.fraction, 1.0);
    }
}
