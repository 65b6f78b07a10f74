//! `barbot`: plan and pour cocktails on a relay-driven pump array.

mod cli;
mod commands;
mod error_fmt;
mod hw;

use std::path::Path;

use barbot_config::Config;
use barbot_core::{CancelToken, ManualTarget};
use clap::Parser;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE, json_mode};
use crate::commands::Outcome;
use crate::error_fmt::{EXIT_INTERRUPTED, exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error hooks: {e}");
    }

    let code = match run(&cli) {
        Ok(Outcome::Done) => 0,
        Ok(Outcome::Interrupted) => EXIT_INTERRUPTED,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "command failed");
            if json_mode() {
                println!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> eyre::Result<Outcome> {
    let (cfg, book) = match commands::load(cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            // Still log the failure to the console.
            init_tracing(cli, None);
            return Err(e);
        }
    };
    init_tracing(cli, Some(&cfg));
    tracing::info!(
        config = %cli.config.display(),
        cocktails = book.len(),
        pumps = cfg.relays.pins.len(),
        "barbot starting"
    );

    match &cli.cmd {
        Commands::List => {
            commands::list(&book);
            Ok(Outcome::Done)
        }
        Commands::Show { cocktail } => {
            commands::show(&cfg, &book, cocktail)?;
            Ok(Outcome::Done)
        }
        Commands::Make {
            cocktail,
            policy,
            no_progress,
        } => commands::make(
            &cfg,
            book,
            cocktail,
            policy.map(Into::into),
            !no_progress,
            ctrl_c_token(),
        ),
        Commands::Pump { motor, all, volume } => {
            let target = match (motor, all) {
                (Some(m), false) => ManualTarget::Motor(*m),
                _ => ManualTarget::All,
            };
            commands::pump(&cfg, target, *volume, ctrl_c_token())
        }
        Commands::SelfCheck => {
            commands::self_check(&cfg, book)?;
            Ok(Outcome::Done)
        }
    }
}

/// Token cancelled by Ctrl-C. Relays are switched off before the run returns.
fn ctrl_c_token() -> CancelToken {
    let token = CancelToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        handler_token.cancel();
    }) {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
    }
    token
}

fn file_appender(path: &Path, rotation: Option<&str>) -> RollingFileAppender {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map_or_else(|| "barbot.log".into(), |n| n.to_os_string());
    match rotation {
        Some("daily") => rolling::daily(dir, name),
        Some("hourly") => rolling::hourly(dir, name),
        _ => rolling::never(dir, name),
    }
}

/// Console logs go to stderr; stdout is reserved for results.
fn init_tracing(cli: &Cli, cfg: Option<&Config>) {
    let level = cli
        .log_level
        .as_deref()
        .or_else(|| cfg.and_then(|c| c.logging.level.as_deref()))
        .unwrap_or("warn");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let console = if cli.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = cfg
        .and_then(|c| c.logging.file.as_deref().map(|f| (f, c.logging.rotation.as_deref())))
        .map(|(file, rotation)| {
            let (writer, guard) =
                tracing_appender::non_blocking(file_appender(Path::new(file), rotation));
            let _ = FILE_GUARD.set(guard);
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed()
        });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();
}
