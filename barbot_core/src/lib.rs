#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core dispensing logic (hardware-agnostic).
//!
//! All relay I/O goes through `barbot_traits::RelayDriver`; all timing goes
//! through `barbot_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Recipes**: `Recipe`, `RecipeBook` (`recipe` module)
//! - **Motor map**: motor number to relay id (`motor_map` module)
//! - **Planner**: recipe to a duration-sorted `DispensePlan` (`planner` module)
//! - **Executor**: sequential, staggered, or parallel runs (`executor` module)
//! - **Progress**: crossbeam channel fed by a scoped ticker (`progress` module)
//! - **Status**: per-relay phases and run outcome (`status`, `run` modules)
//!
//! A run never returns while a relay it switched on may still be on, unless
//! the driver itself refuses to switch it off; see `DispenseRun::energised`.

pub mod builder;
pub mod cancel;
pub mod config;
pub mod conversions;
pub mod error;
pub mod executor;
pub mod hw_error;
pub mod manual;
pub mod mocks;
pub mod motor_map;
pub mod planner;
pub mod progress;
pub mod recipe;
pub mod run;
pub mod session;
pub mod status;
pub mod util;

pub use builder::ExecutorBuilder;
pub use cancel::CancelToken;
pub use config::{ExecutorCfg, Policy, StaggerTiming};
pub use error::{BuildError, DispenseError, Result, ValidationError};
pub use executor::Executor;
pub use manual::dispense_manual;
pub use motor_map::MotorMap;
pub use planner::{DispensePlan, FlowRate, ManualTarget, PlanStep, Planner};
pub use progress::Progress;
pub use recipe::{ImageRef, Ingredient, Recipe, RecipeBook};
pub use run::{DispenseRun, RelayRecord};
pub use session::Bartender;
pub use status::{InterruptReason, RelayPhase, RunState, RunStatus};
