//! Runtime configuration for the dispense executor.
//!
//! Separate from the TOML-deserialized config in `barbot_config`; see
//! `conversions` for the mapping.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Concurrency strategy for running a dispense plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// One pump at a time, shortest pour first. Total time is the sum of all pours.
    #[default]
    Sequential,
    /// All pumps start together; a single thread switches each off when its pour is done.
    Staggered,
    /// One thread per pump. Total time is the longest pour.
    Parallel,
}

impl Policy {
    pub fn as_str(self) -> &'static str {
        match self {
            Policy::Sequential => "sequential",
            Policy::Staggered => "staggered",
            Policy::Parallel => "parallel",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(Policy::Sequential),
            "staggered" => Ok(Policy::Staggered),
            "parallel" => Ok(Policy::Parallel),
            other => Err(format!(
                "unknown policy {other:?} (expected sequential|staggered|parallel)"
            )),
        }
    }
}

/// How the staggered policy schedules switch-off times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaggerTiming {
    /// Each relay's deadline is measured from the moment all relays were on.
    /// Sleep overrun on one step does not push later steps back.
    #[default]
    Absolute,
    /// Sleep the difference between successive durations; overruns accumulate.
    Relative,
}

/// Executor knobs.
#[derive(Debug, Clone)]
pub struct ExecutorCfg {
    /// Policy used by `Executor::execute`.
    pub policy: Policy,
    pub stagger_timing: StaggerTiming,
    /// Interval between progress updates. Default: 50 ms.
    pub progress_tick: Duration,
    /// Longest uninterrupted sleep while a pump runs; bounds cancellation latency. Default: 5 ms.
    pub cancel_poll: Duration,
}

impl Default for ExecutorCfg {
    fn default() -> Self {
        Self {
            policy: Policy::Sequential,
            stagger_timing: StaggerTiming::Absolute,
            progress_tick: Duration::from_millis(50),
            cancel_poll: Duration::from_millis(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Parallel".parse::<Policy>(), Ok(Policy::Parallel));
        assert_eq!("staggered".parse::<Policy>(), Ok(Policy::Staggered));
        assert!("threaded".parse::<Policy>().is_err());
    }

    #[test]
    fn policy_display_round_trips() {
        for p in [Policy::Sequential, Policy::Staggered, Policy::Parallel] {
            assert_eq!(p.to_string().parse::<Policy>(), Ok(p));
        }
    }
}
