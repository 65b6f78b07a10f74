//! CLI argument definitions and shared statics.

use barbot_core::Policy;
use clap::{ArgAction, ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

pub fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

#[derive(Parser, Debug)]
#[command(name = "barbot", version, about = "Relay-driven cocktail dispenser")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/barbot.toml")]
    pub config: PathBuf,

    /// Recipe JSON document; overrides [recipes] path in the config
    #[arg(long, value_name = "FILE")]
    pub recipes: Option<PathBuf>,

    /// Print results and errors as JSON lines, and log as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Log level (error|warn|info|debug|trace); overrides [logging] level, RUST_LOG overrides both
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Concurrency policy for a pour.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum PolicyArg {
    /// One pump at a time, shortest pour first
    Sequential,
    /// All pumps on together, switched off as each pour ends (single thread)
    Staggered,
    /// One thread per pump
    Parallel,
}

impl From<PolicyArg> for Policy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Sequential => Policy::Sequential,
            PolicyArg::Staggered => Policy::Staggered,
            PolicyArg::Parallel => Policy::Parallel,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List cocktails in recipe order
    List,
    /// Show a cocktail's ingredients and dispense plan
    Show {
        /// Cocktail name, exactly as in the recipe file
        cocktail: String,
    },
    /// Make a cocktail
    Make {
        /// Cocktail name, exactly as in the recipe file
        cocktail: String,
        /// Override [dispense] policy from the config
        #[arg(long, value_enum, value_name = "POLICY")]
        policy: Option<PolicyArg>,
        /// Do not draw the progress bar
        #[arg(long, action = ArgAction::SetTrue)]
        no_progress: bool,
    },
    /// Pour a volume from one pump or from all of them
    #[command(group(ArgGroup::new("target").required(true).args(["motor", "all"])))]
    Pump {
        /// Motor number (1-based)
        #[arg(long, value_name = "N")]
        motor: Option<u32>,
        /// Run every pump at once
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,
        /// Volume in mL per pump
        #[arg(long, value_name = "ML")]
        volume: f64,
    },
    /// Validate config and recipes, then initialize and release the relays
    SelfCheck,
}
