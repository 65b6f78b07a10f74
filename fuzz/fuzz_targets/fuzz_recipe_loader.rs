#![no_main]
use barbot_core::{FlowRate, MotorMap, Planner, Policy, RecipeBook};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let Ok(doc) = barbot_config::load_recipes_json(data) else {
        return;
    };
    let book = RecipeBook::from(&doc);
    let Ok(motors) = MotorMap::new(vec![23, 21, 19, 15, 13]) else {
        return;
    };
    let Ok(rate) = FlowRate::new(1.75) else {
        return;
    };
    let planner = Planner::new(motors, rate);
    for recipe in book.iter() {
        if let Ok(plan) = planner.plan(recipe) {
            assert!(plan.steps().windows(2).all(|w| w[0].duration_s <= w[1].duration_s));
            assert!(plan.expected_total(Policy::Parallel) <= plan.expected_total(Policy::Sequential));
        }
    }
});
