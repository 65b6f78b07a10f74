//! Recipe → dispense plan.
//!
//! Each ingredient becomes one `(relay, duration)` step with
//! `duration = quantity_ml / flow_rate`. Steps are ordered by ascending
//! duration; ties keep recipe order. Planning is pure: no relay is touched.

use std::time::Duration;

use barbot_traits::RelayId;

use crate::config::Policy;
use crate::error::ValidationError;
use crate::motor_map::MotorMap;
use crate::recipe::Recipe;

/// Longest single pour the planner accepts.
pub const MAX_POUR: Duration = Duration::from_secs(3_600);

/// Pump throughput in mL per second. Always finite and > 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowRate(f64);

impl FlowRate {
    pub fn new(ml_per_s: f64) -> Result<Self, ValidationError> {
        if ml_per_s.is_finite() && ml_per_s > 0.0 {
            Ok(Self(ml_per_s))
        } else {
            Err(ValidationError::InvalidFlowRate(ml_per_s))
        }
    }

    pub fn ml_per_s(self) -> f64 {
        self.0
    }

    /// Seconds a pump must run to deliver `volume_ml`.
    pub fn seconds_for(self, volume_ml: f64) -> f64 {
        volume_ml / self.0
    }
}

/// One relay activation in a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    pub relay: RelayId,
    pub motor: u32,
    pub ingredient: String,
    pub volume_ml: f64,
    /// Run time in seconds, exactly `volume_ml / flow_rate`.
    pub duration_s: f64,
}

impl PlanStep {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_s)
    }
}

/// Ordered `(relay, duration)` steps for one drink, shortest first.
#[derive(Debug, Clone, PartialEq)]
pub struct DispensePlan {
    name: String,
    steps: Vec<PlanStep>,
}

impl DispensePlan {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn relays(&self) -> impl Iterator<Item = RelayId> + '_ {
        self.steps.iter().map(|s| s.relay)
    }

    /// Sum of all step durations: wall-clock time under `Policy::Sequential`.
    pub fn sequential_total(&self) -> Duration {
        self.steps.iter().map(PlanStep::duration).sum()
    }

    /// Longest step: wall-clock time when all pumps run together.
    pub fn parallel_total(&self) -> Duration {
        self.steps
            .last()
            .map(PlanStep::duration)
            .unwrap_or(Duration::ZERO)
    }

    /// Planned wall-clock time under `policy`.
    pub fn expected_total(&self, policy: Policy) -> Duration {
        match policy {
            Policy::Sequential => self.sequential_total(),
            Policy::Staggered | Policy::Parallel => self.parallel_total(),
        }
    }
}

/// Which pumps a manual pour drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualTarget {
    Motor(u32),
    All,
}

/// Turns recipes into plans for a fixed motor map and flow rate.
#[derive(Debug, Clone)]
pub struct Planner {
    motors: MotorMap,
    flow_rate: FlowRate,
}

impl Planner {
    pub fn new(motors: MotorMap, flow_rate: FlowRate) -> Self {
        Self { motors, flow_rate }
    }

    pub fn motors(&self) -> &MotorMap {
        &self.motors
    }

    pub fn flow_rate(&self) -> FlowRate {
        self.flow_rate
    }

    pub fn plan(&self, recipe: &Recipe) -> Result<DispensePlan, ValidationError> {
        if recipe.ingredients.is_empty() {
            return Err(ValidationError::EmptyRecipe {
                recipe: recipe.name.clone(),
            });
        }
        let mut steps: Vec<PlanStep> = Vec::with_capacity(recipe.ingredients.len());
        for ing in &recipe.ingredients {
            if steps.iter().any(|s| s.motor == ing.motor) {
                return Err(ValidationError::DuplicateMotor {
                    recipe: recipe.name.clone(),
                    motor: ing.motor,
                });
            }
            steps.push(self.step(&ing.name, ing.motor, ing.quantity_ml)?);
        }
        Ok(Self::sorted(recipe.name.clone(), steps))
    }

    /// Plan a manual pour of `volume_ml` from one motor or from every motor.
    pub fn plan_manual(
        &self,
        target: ManualTarget,
        volume_ml: f64,
    ) -> Result<DispensePlan, ValidationError> {
        let steps = match target {
            ManualTarget::Motor(motor) => vec![self.step(&format!("Motor {motor}"), motor, volume_ml)?],
            ManualTarget::All => self
                .motors
                .iter()
                .map(|(motor, _)| self.step(&format!("Motor {motor}"), motor, volume_ml))
                .collect::<Result<Vec<_>, _>>()?,
        };
        let name = match target {
            ManualTarget::Motor(motor) => format!("Motor {motor}"),
            ManualTarget::All => "All Motors".to_owned(),
        };
        Ok(Self::sorted(name, steps))
    }

    fn step(&self, ingredient: &str, motor: u32, volume_ml: f64) -> Result<PlanStep, ValidationError> {
        let relay = self
            .motors
            .relay_for(motor)
            .ok_or_else(|| ValidationError::UnknownMotor {
                ingredient: ingredient.to_owned(),
                motor,
                available: self.motors.len(),
            })?;
        if !(volume_ml.is_finite() && volume_ml > 0.0) {
            return Err(ValidationError::NonPositiveQuantity {
                ingredient: ingredient.to_owned(),
                quantity: volume_ml,
            });
        }
        let duration_s = self.flow_rate.seconds_for(volume_ml);
        if duration_s > MAX_POUR.as_secs_f64() {
            return Err(ValidationError::PourTooLong {
                ingredient: ingredient.to_owned(),
                seconds: duration_s,
                limit_s: MAX_POUR.as_secs(),
            });
        }
        Ok(PlanStep {
            relay,
            motor,
            ingredient: ingredient.to_owned(),
            volume_ml,
            duration_s,
        })
    }

    fn sorted(name: String, mut steps: Vec<PlanStep>) -> DispensePlan {
        // Stable: equal durations keep their recipe order.
        steps.sort_by(|a, b| a.duration_s.total_cmp(&b.duration_s));
        DispensePlan { name, steps }
    }
}
