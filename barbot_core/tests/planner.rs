mod common;

use std::time::Duration;

use barbot_core::{Policy, ValidationError};
use common::{assert_close, planner, recipe};
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
fn plan_is_sorted_by_duration_not_motor() {
    let p = planner(1.75);
    let r = recipe(
        "Tequila Sunrise",
        &[("Tequila", 1, 52.5), ("Orange Juice", 2, 30.0), ("Grenadine", 3, 10.0)],
    );
    let plan = p.plan(&r).expect("valid recipe");
    let motors: Vec<u32> = plan.steps().iter().map(|s| s.motor).collect();
    assert_eq!(motors, vec![3, 2, 1]);
    let relays: Vec<u8> = plan.relays().collect();
    assert_eq!(relays, vec![19, 21, 23]);
}

#[rstest]
fn equal_durations_keep_recipe_order() {
    let p = planner(2.0);
    let r = recipe("Even", &[("A", 4, 10.0), ("B", 2, 10.0), ("C", 7, 10.0)]);
    let plan = p.plan(&r).expect("valid recipe");
    let motors: Vec<u32> = plan.steps().iter().map(|s| s.motor).collect();
    assert_eq!(motors, vec![4, 2, 7]);
}

#[rstest]
fn totals_per_policy() {
    let p = planner(1.75);
    let r = recipe("Pair", &[("A", 1, 30.0), ("B", 2, 52.5)]);
    let plan = p.plan(&r).expect("valid recipe");
    assert_close(
        plan.expected_total(Policy::Sequential),
        Duration::from_secs_f64(30.0 / 1.75 + 30.0),
        Duration::from_micros(1),
    );
    assert_close(
        plan.expected_total(Policy::Parallel),
        Duration::from_secs(30),
        Duration::from_micros(1),
    );
    assert_eq!(
        plan.expected_total(Policy::Staggered),
        plan.expected_total(Policy::Parallel)
    );
}

#[rstest]
#[case::unknown_motor(recipe("X", &[("Rum", 99, 10.0)]))]
#[case::motor_zero(recipe("X", &[("Rum", 0, 10.0)]))]
#[case::zero_quantity(recipe("X", &[("Rum", 1, 0.0)]))]
#[case::negative_quantity(recipe("X", &[("Rum", 1, -5.0)]))]
#[case::nan_quantity(recipe("X", &[("Rum", 1, f64::NAN)]))]
#[case::duplicate_motor(recipe("X", &[("Rum", 1, 10.0), ("Cola", 1, 20.0)]))]
#[case::empty(recipe("X", &[]))]
fn invalid_recipes_are_rejected(#[case] r: barbot_core::Recipe) {
    assert!(planner(1.75).plan(&r).is_err());
}

#[rstest]
fn unknown_motor_reports_available_range() {
    let err = planner(1.75)
        .plan(&recipe("X", &[("Rum", 99, 10.0)]))
        .expect_err("motor 99 does not exist");
    assert_eq!(
        err,
        ValidationError::UnknownMotor {
            ingredient: "Rum".into(),
            motor: 99,
            available: 11,
        }
    );
}

proptest! {
    #[test]
    fn plan_sorted_and_durations_match_flow_rate(
        flow in 0.5f64..50.0,
        quantities in proptest::collection::vec(0.5f64..500.0, 1..=11),
    ) {
        let p = planner(flow);
        let ingredients: Vec<(String, u32, f64)> = quantities
            .iter()
            .enumerate()
            .map(|(i, &q)| (format!("ing{i}"), (i + 1) as u32, q))
            .collect();
        let borrowed: Vec<(&str, u32, f64)> =
            ingredients.iter().map(|(n, m, q)| (n.as_str(), *m, *q)).collect();
        let plan = p.plan(&recipe("prop", &borrowed)).expect("valid recipe");

        prop_assert_eq!(plan.len(), quantities.len());
        prop_assert!(plan.steps().windows(2).all(|w| w[0].duration_s <= w[1].duration_s));
        for step in plan.steps() {
            prop_assert!((step.duration_s - step.volume_ml / flow).abs() < 1e-6);
            prop_assert!(step.duration_s > 0.0);
        }
        prop_assert!(plan.expected_total(Policy::Parallel) <= plan.expected_total(Policy::Sequential));
    }

    #[test]
    fn out_of_range_motor_never_plans(motor in 12u32..10_000) {
        let r = recipe("bad", &[("ok", 1, 10.0), ("bad", motor, 10.0)]);
        let is_unknown = matches!(
            planner(1.0).plan(&r),
            Err(ValidationError::UnknownMotor { .. })
        );
        prop_assert!(is_unknown);
    }
}

#[rstest]
fn absurd_pour_is_rejected() {
    let err = planner(0.01)
        .plan(&recipe("Bucket", &[("Water", 1, 1_000.0)]))
        .expect_err("27 hours of pumping");
    assert!(matches!(err, ValidationError::PourTooLong { limit_s: 3_600, .. }));
}
