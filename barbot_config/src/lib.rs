#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and recipe document parsing for the bar robot.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `recipes` parses the cocktail JSON document, keeping document order.
use std::path::{Path, PathBuf};

use barbot_hardware::pins::PinNumbering;
use eyre::WrapErr;
use serde::Deserialize;

pub mod recipes;

pub use recipes::{IngredientDoc, RecipeDoc, RecipeDocument, load_recipes_file, load_recipes_json};

/// Pin numbering used for `relays.pins`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Numbering {
    /// Physical header position (what the relay ribbon is wired to).
    #[default]
    Board,
    Bcm,
}

impl From<Numbering> for PinNumbering {
    fn from(n: Numbering) -> Self {
        match n {
            Numbering::Board => Self::Board,
            Numbering::Bcm => Self::Bcm,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Relays {
    /// Relay pins; index 0 drives motor 1.
    pub pins: Vec<u8>,
    #[serde(default)]
    pub numbering: Numbering,
    /// Relay input energises the coil when driven low
    #[serde(default = "default_active_low")]
    pub active_low: bool,
}

fn default_active_low() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct Pump {
    /// Volume delivered per second while a relay is on.
    pub flow_rate_ml_per_s: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyCfg {
    #[default]
    Sequential,
    Staggered,
    Parallel,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StaggerTimingCfg {
    /// Switch-off deadlines measured from the moment all relays came on.
    #[default]
    Absolute,
    /// Sleep the difference between successive durations.
    Relative,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Dispense {
    pub policy: PolicyCfg,
    pub stagger_timing: StaggerTimingCfg,
    /// Interval between progress updates (ms)
    pub progress_tick_ms: u64,
    /// Longest uninterrupted sleep slice; bounds cancellation latency (ms)
    pub cancel_poll_ms: u64,
}

impl Default for Dispense {
    fn default() -> Self {
        Self {
            policy: PolicyCfg::Sequential,
            stagger_timing: StaggerTimingCfg::Absolute,
            progress_tick_ms: 50,
            cancel_poll_ms: 5,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RecipesCfg {
    /// Recipe JSON document; relative paths resolve against the config file's directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub relays: Relays,
    pub pump: Pump,
    #[serde(default)]
    pub dispense: Dispense,
    #[serde(default)]
    pub recipes: RecipesCfg,
    #[serde(default)]
    pub logging: Logging,
}

/// Upper bound for the tick and poll intervals.
const MAX_INTERVAL_MS: u64 = 10_000;

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let mut cfg = load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    if let Some(p) = cfg.recipes.path.as_mut()
        && p.is_relative()
        && let Some(dir) = path.parent()
    {
        *p = dir.join(&*p);
    }
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Relays
        if self.relays.pins.is_empty() {
            eyre::bail!("relays.pins must list at least one pin");
        }
        let numbering: PinNumbering = self.relays.numbering.into();
        for (i, pin) in self.relays.pins.iter().enumerate() {
            if !barbot_hardware::pins::is_gpio(*pin, numbering) {
                eyre::bail!(
                    "relays.pins[{i}] = {pin} is not a gpio pin in {numbering} numbering"
                );
            }
            if self.relays.pins[..i].contains(pin) {
                eyre::bail!("relays.pins contains duplicate pin {pin}");
            }
        }

        // Pump
        let rate = self.pump.flow_rate_ml_per_s;
        if !rate.is_finite() || rate <= 0.0 {
            eyre::bail!("pump.flow_rate_ml_per_s must be a finite value > 0");
        }

        // Dispense
        if self.dispense.progress_tick_ms == 0 || self.dispense.progress_tick_ms > MAX_INTERVAL_MS
        {
            eyre::bail!("dispense.progress_tick_ms must be in [1, {MAX_INTERVAL_MS}]");
        }
        if self.dispense.cancel_poll_ms == 0 || self.dispense.cancel_poll_ms > MAX_INTERVAL_MS {
            eyre::bail!("dispense.cancel_poll_ms must be in [1, {MAX_INTERVAL_MS}]");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[relays]
pins = [23, 21, 19]

[pump]
flow_rate_ml_per_s = 1.75
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = load_toml(MINIMAL).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.relays.numbering, Numbering::Board);
        assert!(cfg.relays.active_low);
        assert_eq!(cfg.dispense.policy, PolicyCfg::Sequential);
        assert_eq!(cfg.dispense.stagger_timing, StaggerTimingCfg::Absolute);
        assert_eq!(cfg.dispense.progress_tick_ms, 50);
        assert_eq!(cfg.dispense.cancel_poll_ms, 5);
        assert!(cfg.recipes.path.is_none());
    }

    #[test]
    fn unknown_policy_fails_to_parse() {
        let text = format!("{MINIMAL}\n[dispense]\npolicy = \"random\"\n");
        assert!(load_toml(&text).is_err());
    }
}
