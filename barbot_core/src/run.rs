//! Per-run result owned by the caller.
use std::time::{Duration, Instant};

use barbot_traits::RelayId;

use crate::config::Policy;
use crate::planner::PlanStep;
use crate::status::{InterruptReason, RelayPhase, RunStatus};

/// What happened to one relay during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayRecord {
    pub relay: RelayId,
    pub motor: u32,
    pub ingredient: String,
    pub volume_ml: f64,
    pub planned: Duration,
    pub phase: RelayPhase,
    pub activated_at: Option<Instant>,
    pub deactivated_at: Option<Instant>,
}

impl RelayRecord {
    pub(crate) fn from_step(step: &PlanStep) -> Self {
        Self {
            relay: step.relay,
            motor: step.motor,
            ingredient: step.ingredient.clone(),
            volume_ml: step.volume_ml,
            planned: step.duration(),
            phase: RelayPhase::Idle,
            activated_at: None,
            deactivated_at: None,
        }
    }

    /// Time the relay spent on, when it was both switched on and off.
    pub fn on_time(&self) -> Option<Duration> {
        match (self.activated_at, self.deactivated_at) {
            (Some(on), Some(off)) => Some(off.saturating_duration_since(on)),
            _ => None,
        }
    }
}

/// Result of executing one plan.
#[derive(Debug, Clone, PartialEq)]
pub struct DispenseRun {
    pub name: String,
    pub policy: Policy,
    pub status: RunStatus,
    pub started_at: Instant,
    pub finished_at: Instant,
    /// One record per plan step, in plan order.
    pub relays: Vec<RelayRecord>,
}

impl DispenseRun {
    pub fn elapsed(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, RunStatus::Complete)
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(
            self.status,
            RunStatus::Interrupted(InterruptReason::Cancelled)
        )
    }

    pub fn record(&self, relay: RelayId) -> Option<&RelayRecord> {
        self.relays.iter().find(|r| r.relay == relay)
    }

    /// Relays that may still be on. Empty unless the driver refused a switch-off.
    pub fn energised(&self) -> Vec<RelayId> {
        self.relays
            .iter()
            .filter(|r| r.phase.is_energised())
            .map(|r| r.relay)
            .collect()
    }
}
