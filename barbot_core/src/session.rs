//! `Bartender`: recipe book, planner, and executor behind one handle.
use barbot_traits::{Clock, MonotonicClock, RelayDriver};
use tracing::debug;

use crate::config::Policy;
use crate::error::{DispenseError, ValidationError};
use crate::executor::Executor;
use crate::manual::dispense_manual;
use crate::planner::{DispensePlan, ManualTarget, Planner};
use crate::recipe::RecipeBook;
use crate::run::DispenseRun;

pub struct Bartender<R, C = MonotonicClock> {
    book: RecipeBook,
    planner: Planner,
    executor: Executor<R, C>,
}

impl<R: RelayDriver, C: Clock + Sync> Bartender<R, C> {
    pub fn new(book: RecipeBook, planner: Planner, executor: Executor<R, C>) -> Self {
        Self {
            book,
            planner,
            executor,
        }
    }

    pub fn book(&self) -> &RecipeBook {
        &self.book
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn executor(&self) -> &Executor<R, C> {
        &self.executor
    }

    /// Switch every mapped relay off before the first order.
    pub fn open(&self) -> Result<(), DispenseError> {
        self.executor.initialize(self.planner.motors())
    }

    pub fn close(&self) -> Result<(), DispenseError> {
        self.executor.shutdown()
    }

    pub fn plan(&self, cocktail: &str) -> Result<DispensePlan, ValidationError> {
        let recipe = self
            .book
            .get(cocktail)
            .ok_or_else(|| ValidationError::UnknownCocktail(cocktail.to_owned()))?;
        self.planner.plan(recipe)
    }

    /// Plan and pour `cocktail` under the configured policy.
    pub fn order(&self, cocktail: &str) -> Result<DispenseRun, ValidationError> {
        self.order_with(cocktail, self.executor.config().policy)
    }

    pub fn order_with(&self, cocktail: &str, policy: Policy) -> Result<DispenseRun, ValidationError> {
        let plan = self.plan(cocktail)?;
        Ok(self.executor.execute_with(&plan, policy))
    }

    pub fn pump(&self, target: ManualTarget, volume_ml: f64) -> Result<DispenseRun, ValidationError> {
        dispense_manual(&self.executor, &self.planner, target, volume_ml)
    }

    /// Plan every recipe in the book. Returns each failure with its cocktail name.
    pub fn check_recipes(&self) -> Vec<(String, ValidationError)> {
        self.book
            .iter()
            .filter_map(|recipe| match self.planner.plan(recipe) {
                Ok(plan) => {
                    debug!(name = %recipe.name, steps = plan.len(), "recipe plans");
                    None
                }
                Err(e) => Some((recipe.name.clone(), e)),
            })
            .collect()
    }
}
