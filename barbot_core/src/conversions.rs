//! Conversions from `barbot_config` documents to core types.

use std::time::Duration;

use crate::config::{ExecutorCfg, Policy, StaggerTiming};
use crate::error::ValidationError;
use crate::motor_map::MotorMap;
use crate::planner::{FlowRate, Planner};
use crate::recipe::{ImageRef, Ingredient, Recipe, RecipeBook};

impl From<barbot_config::PolicyCfg> for Policy {
    fn from(p: barbot_config::PolicyCfg) -> Self {
        match p {
            barbot_config::PolicyCfg::Sequential => Self::Sequential,
            barbot_config::PolicyCfg::Staggered => Self::Staggered,
            barbot_config::PolicyCfg::Parallel => Self::Parallel,
        }
    }
}

impl From<barbot_config::StaggerTimingCfg> for StaggerTiming {
    fn from(t: barbot_config::StaggerTimingCfg) -> Self {
        match t {
            barbot_config::StaggerTimingCfg::Absolute => Self::Absolute,
            barbot_config::StaggerTimingCfg::Relative => Self::Relative,
        }
    }
}

impl From<&barbot_config::Dispense> for ExecutorCfg {
    fn from(d: &barbot_config::Dispense) -> Self {
        Self {
            policy: d.policy.into(),
            stagger_timing: d.stagger_timing.into(),
            progress_tick: Duration::from_millis(d.progress_tick_ms),
            cancel_poll: Duration::from_millis(d.cancel_poll_ms),
        }
    }
}

impl From<&barbot_config::Config> for ExecutorCfg {
    fn from(c: &barbot_config::Config) -> Self {
        Self::from(&c.dispense)
    }
}

impl TryFrom<&barbot_config::Config> for Planner {
    type Error = ValidationError;

    fn try_from(c: &barbot_config::Config) -> Result<Self, Self::Error> {
        let motors = MotorMap::new(c.relays.pins.clone())?;
        let flow_rate = FlowRate::new(c.pump.flow_rate_ml_per_s)?;
        Ok(Self::new(motors, flow_rate))
    }
}

impl From<&barbot_config::RecipeDoc> for ImageRef {
    fn from(d: &barbot_config::RecipeDoc) -> Self {
        Self {
            path: d.imgpath.clone(),
            url: d.image_url.clone(),
        }
    }
}

impl From<&barbot_config::RecipeDocument> for RecipeBook {
    fn from(doc: &barbot_config::RecipeDocument) -> Self {
        doc.cocktails
            .iter()
            .map(|(name, recipe)| Recipe {
                name: name.clone(),
                ingredients: recipe
                    .ingredients
                    .iter()
                    .map(|i| Ingredient::new(i.name.clone(), i.motor, i.quantity))
                    .collect(),
                image: ImageRef::from(recipe),
            })
            .collect()
    }
}
