//! Manual pours from one pump or from every pump at once.
use barbot_traits::{Clock, RelayDriver};
use tracing::info;

use crate::config::Policy;
use crate::error::ValidationError;
use crate::executor::Executor;
use crate::planner::{ManualTarget, Planner};
use crate::run::DispenseRun;

/// Pour `volume_ml` from `target`. Always runs under `Policy::Parallel`, so
/// "all motors" takes as long as a single pump would.
///
/// Validation happens before any relay is touched.
pub fn dispense_manual<R, C>(
    executor: &Executor<R, C>,
    planner: &Planner,
    target: ManualTarget,
    volume_ml: f64,
) -> Result<DispenseRun, ValidationError>
where
    R: RelayDriver,
    C: Clock + Sync,
{
    let plan = planner.plan_manual(target, volume_ml)?;
    info!(name = plan.name(), volume_ml, "manual pour");
    Ok(executor.execute_with(&plan, Policy::Parallel))
}
