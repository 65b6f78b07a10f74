//! Per-relay and per-run states.

use crate::error::DispenseError;

/// Lifecycle of one relay within a run.
///
/// `Idle → Activated → Dispensing → Deactivated → Done`. A relay that is
/// switched off before its pour finished stays at `Deactivated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    /// Never switched on during this run.
    Idle,
    /// Switch-on acknowledged by the driver.
    Activated,
    /// Pump running, waiting for the pour to elapse.
    Dispensing,
    /// Switched off early (cancellation or a fault elsewhere).
    Deactivated,
    /// Switched off after the full planned duration.
    Done,
}

impl RelayPhase {
    /// Whether the relay may still be energised.
    pub fn is_energised(self) -> bool {
        matches!(self, RelayPhase::Activated | RelayPhase::Dispensing)
    }
}

/// Overall run state, as published on the progress channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Complete,
    Interrupted,
}

/// Why a run stopped before finishing its plan.
#[derive(Debug, Clone, PartialEq)]
pub enum InterruptReason {
    /// The caller cancelled. Expected; not an error.
    Cancelled,
    /// A driver call failed. Carries the first failure seen.
    Hardware(DispenseError),
}

/// Final outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Every relay ran its full duration and was switched off.
    Complete,
    /// Stopped early; every relay that was switched on has been switched off
    /// unless the driver refused, in which case the reason is `Hardware`.
    Interrupted(InterruptReason),
}

impl RunStatus {
    pub fn state(&self) -> RunState {
        match self {
            RunStatus::Complete => RunState::Complete,
            RunStatus::Interrupted(_) => RunState::Interrupted,
        }
    }
}
