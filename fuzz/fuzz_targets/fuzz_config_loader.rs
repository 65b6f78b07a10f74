#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = barbot_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        // A validated config must always yield a planner.
        let planner = barbot_core::Planner::try_from(&cfg);
        assert!(planner.is_ok(), "validated config rejected: {planner:?}");
    }
});
