mod common;

use std::sync::Arc;
use std::time::Duration;

use barbot_core::mocks::{ManualClock, RecordingRelays};
use barbot_core::{
    Bartender, Executor, ManualTarget, Policy, RecipeBook, ValidationError, dispense_manual,
};
use common::*;
use rstest::{fixture, rstest};

type Bar = Bartender<SimDriver, ManualClock>;

#[fixture]
fn bar() -> (Bar, SimDriver) {
    let book: RecipeBook = vec![
        recipe("Tequila Sunrise", &[("Tequila", 1, 52.5), ("Orange Juice", 2, 30.0)]),
        recipe("Broken", &[("Rum", 99, 10.0)]),
    ]
    .into_iter()
    .collect();
    let (exec, driver) = virtual_executor(ManualClock::new());
    (Bartender::new(book, planner(1.75), exec), driver)
}

#[rstest]
fn order_pours_a_known_cocktail(bar: (Bar, SimDriver)) {
    let (bar, driver) = bar;
    bar.open().expect("open");
    let run = bar.order("Tequila Sunrise").expect("valid cocktail");
    assert!(run.is_complete());
    assert_close(
        run.elapsed(),
        Duration::from_secs_f64(30.0 / 1.75 + 30.0),
        Duration::from_millis(1),
    );
    assert!(driver.energised().is_empty());
    bar.close().expect("close");
}

#[rstest]
fn unknown_cocktail_is_a_validation_error(bar: (Bar, SimDriver)) {
    let (bar, driver) = bar;
    assert_eq!(
        bar.order("Mojito").expect_err("not in the book"),
        ValidationError::UnknownCocktail("Mojito".into())
    );
    assert_eq!(driver.call_count(), 0);
}

#[rstest]
fn invalid_recipe_never_touches_relays(bar: (Bar, SimDriver)) {
    let (bar, driver) = bar;
    assert!(matches!(
        bar.order_with("Broken", Policy::Parallel),
        Err(ValidationError::UnknownMotor { motor: 99, .. })
    ));
    assert_eq!(driver.call_count(), 0);
}

#[rstest]
fn check_recipes_names_the_broken_ones(bar: (Bar, SimDriver)) {
    let (bar, _driver) = bar;
    let problems = bar.check_recipes();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].0, "Broken");
}

#[rstest]
fn pump_all_runs_every_motor_in_parallel(bar: (Bar, SimDriver)) {
    let (bar, driver) = bar;
    let run = bar.pump(ManualTarget::All, 17.5).expect("valid pour");
    assert_eq!(run.name, "All Motors");
    assert_eq!(run.policy, Policy::Parallel);
    assert_eq!(run.relays.len(), PINS.len());
    assert_eq!(driver.activation_order().len(), PINS.len());
    assert!(driver.energised().is_empty());
}

#[rstest]
fn manual_single_motor_pour() {
    let driver = real_driver();
    let exec = Executor::builder()
        .with_driver(driver.clone())
        .build()
        .expect("valid executor");
    // 50 ms at 1000 mL/s.
    let run = dispense_manual(&exec, &planner(1000.0), ManualTarget::Motor(3), 50.0)
        .expect("valid pour");
    assert!(run.is_complete());
    assert_eq!(run.name, "Motor 3");
    assert_eq!(driver.activation_order(), vec![19]);
    let (on, off) = driver.interval(19).expect("relay ran");
    assert!(off - on >= Duration::from_millis(50));
}

#[rstest]
#[case::unknown_motor(ManualTarget::Motor(12), 10.0)]
#[case::zero_volume(ManualTarget::Motor(1), 0.0)]
#[case::negative_volume(ManualTarget::All, -1.0)]
fn manual_pour_validation(#[case] target: ManualTarget, #[case] volume: f64) {
    let clock = ManualClock::new();
    let driver = Arc::new(RecordingRelays::new(clock.clone()));
    let exec = Executor::builder()
        .with_driver(driver.clone())
        .with_clock(clock)
        .build()
        .expect("valid executor");
    assert!(dispense_manual(&exec, &planner(1.0), target, volume).is_err());
    assert_eq!(driver.call_count(), 0);
}
