//! Subcommand bodies: recipe listing, planning, pours, and result rendering.

use std::io::Write;
use std::path::PathBuf;
use std::thread;

use barbot_config::Config;
use barbot_core::progress::channel;
use barbot_core::util::{duration_ms, format_minutes_seconds};
use barbot_core::{
    Bartender, CancelToken, DispenseError, DispenseRun, Executor, ExecutorCfg, InterruptReason,
    ManualTarget, Planner, Policy, Progress, RecipeBook, RelayPhase, RunStatus,
};
use barbot_traits::RelayDriver;
use eyre::WrapErr;
use serde_json::json;

use crate::cli::{Cli, json_mode};
use crate::hw::make_driver;

/// How a command that drives relays ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Interrupted,
}

const BAR_WIDTH: usize = 30;

/// Load and validate the config, then the recipe document it points to.
pub fn load(cli: &Cli) -> eyre::Result<(Config, RecipeBook)> {
    let cfg = barbot_config::load_file(&cli.config)?;
    let path: PathBuf = cli
        .recipes
        .clone()
        .or_else(|| cfg.recipes.path.clone())
        .ok_or_else(|| {
            eyre::eyre!("no recipe file: set [recipes] path in the config or pass --recipes")
        })?;
    let doc = barbot_config::load_recipes_file(&path)?;
    tracing::debug!(path = %path.display(), cocktails = doc.len(), "recipes loaded");
    Ok((cfg, RecipeBook::from(&doc)))
}

fn bartender(
    cfg: &Config,
    book: RecipeBook,
    cancel: CancelToken,
    progress: Option<barbot_core::progress::Sender>,
) -> eyre::Result<Bartender<Box<dyn RelayDriver>>> {
    let planner = Planner::try_from(cfg).map_err(DispenseError::from)?;
    let mut builder = Executor::builder()
        .with_driver(make_driver(cfg)?)
        .with_config(ExecutorCfg::from(cfg))
        .with_cancel_token(cancel);
    if let Some(tx) = progress {
        builder = builder.with_progress(tx);
    }
    Ok(Bartender::new(book, planner, builder.build()?))
}

pub fn list(book: &RecipeBook) {
    for recipe in book.iter() {
        if json_mode() {
            println!(
                "{}",
                json!({
                    "name": recipe.name,
                    "ingredients": recipe.ingredients.len(),
                    "total_ml": recipe.total_ml(),
                })
            );
        } else {
            println!("{} ({} ingredients)", recipe.name, recipe.ingredients.len());
        }
    }
}

pub fn show(cfg: &Config, book: &RecipeBook, cocktail: &str) -> eyre::Result<()> {
    let planner = Planner::try_from(cfg).map_err(DispenseError::from)?;
    let recipe = book
        .get(cocktail)
        .ok_or_else(|| barbot_core::ValidationError::UnknownCocktail(cocktail.to_owned()))
        .map_err(DispenseError::from)?;
    let plan = planner.plan(recipe).map_err(DispenseError::from)?;
    let sequential = plan.expected_total(Policy::Sequential);
    let parallel = plan.expected_total(Policy::Parallel);

    if json_mode() {
        let steps: Vec<_> = plan
            .steps()
            .iter()
            .map(|s| {
                json!({
                    "relay": s.relay,
                    "motor": s.motor,
                    "ingredient": s.ingredient,
                    "volume_ml": s.volume_ml,
                    "duration_s": s.duration_s,
                })
            })
            .collect();
        println!(
            "{}",
            json!({
                "name": recipe.name,
                "imgpath": recipe.image.path,
                "image_url": recipe.image.url,
                "flow_rate_ml_per_s": planner.flow_rate().ml_per_s(),
                "plan": steps,
                "expected_ms": {
                    "sequential": duration_ms(sequential),
                    "staggered": duration_ms(plan.expected_total(Policy::Staggered)),
                    "parallel": duration_ms(parallel),
                },
            })
        );
        return Ok(());
    }

    println!("{}", recipe.name);
    for ing in &recipe.ingredients {
        println!("  {}: {} mL", ing.name, ing.quantity_ml);
    }
    if let Some(img) = recipe.image.path.as_deref().or(recipe.image.url.as_deref()) {
        println!("  image: {img}");
    }
    println!(
        "Plan at {} mL/s:",
        planner.flow_rate().ml_per_s()
    );
    for s in plan.steps() {
        println!(
            "  relay {:>2}  motor {:>2}  {:<20} {:>6.1} mL  {:>7.2} s",
            s.relay, s.motor, s.ingredient, s.volume_ml, s.duration_s
        );
    }
    println!("Expected (sequential): {}", format_minutes_seconds(sequential));
    println!(
        "Expected (staggered/parallel): {}",
        format_minutes_seconds(parallel)
    );
    Ok(())
}

pub fn make(
    cfg: &Config,
    book: RecipeBook,
    cocktail: &str,
    policy: Option<Policy>,
    show_progress: bool,
    cancel: CancelToken,
) -> eyre::Result<Outcome> {
    let show_progress = show_progress && !json_mode();
    let (tx, rx) = channel();
    let bar = bartender(cfg, book, cancel, show_progress.then_some(tx))?;
    let policy = policy.unwrap_or(bar.executor().config().policy);
    let plan = bar.plan(cocktail).map_err(DispenseError::from)?;

    if !json_mode() {
        println!(
            "Making {} ({policy}, {} pumps, about {})",
            plan.name(),
            plan.len(),
            format_minutes_seconds(plan.expected_total(policy))
        );
    }
    bar.open().wrap_err("initialize relays")?;
    let run = thread::scope(|s| {
        if show_progress {
            s.spawn(move || draw_progress(rx.iter()));
        }
        bar.executor().execute_with(&plan, policy)
    });
    close(&bar);
    report_run(&run, "Cocktail ready!")
}

pub fn pump(
    cfg: &Config,
    target: ManualTarget,
    volume_ml: f64,
    cancel: CancelToken,
) -> eyre::Result<Outcome> {
    let bar = bartender(cfg, RecipeBook::default(), cancel, None)?;
    let plan = bar
        .planner()
        .plan_manual(target, volume_ml)
        .map_err(DispenseError::from)?;
    if !json_mode() {
        println!(
            "Pouring {volume_ml} mL from {} (about {})",
            plan.name(),
            format_minutes_seconds(plan.expected_total(Policy::Parallel))
        );
    }
    bar.open().wrap_err("initialize relays")?;
    let run = bar.pump(target, volume_ml).map_err(DispenseError::from)?;
    close(&bar);
    report_run(&run, "Pour finished.")
}

pub fn self_check(cfg: &Config, book: RecipeBook) -> eyre::Result<()> {
    let bar = bartender(cfg, book, CancelToken::new(), None)?;
    let problems = bar.check_recipes();
    for (name, err) in &problems {
        tracing::error!(cocktail = %name, error = %err, "recipe does not plan");
        if !json_mode() {
            eprintln!("{name}: {err}");
        }
    }
    if let Some((name, err)) = problems.into_iter().next() {
        return Err(eyre::Report::new(DispenseError::from(err))
            .wrap_err(format!("recipe {name:?} cannot be made")));
    }
    bar.open().wrap_err("initialize relays")?;
    bar.close().wrap_err("release relays")?;

    let cocktails = bar.book().len();
    let pumps = bar.planner().motors().len();
    if json_mode() {
        println!("{}", json!({ "self_check": "ok", "cocktails": cocktails, "pumps": pumps }));
    } else {
        println!("self-check ok: {cocktails} cocktails, {pumps} pumps");
    }
    Ok(())
}

fn close<R: RelayDriver>(bar: &Bartender<R>) {
    if let Err(e) = bar.close() {
        tracing::warn!(error = %e, "relay shutdown failed");
    }
}

/// Text progress bar, e.g. `[#######.......]`.
pub fn render_progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

fn draw_progress(updates: impl Iterator<Item = Progress>) {
    let mut err = std::io::stderr().lock();
    for p in updates {
        let _ = write!(
            err,
            "\r{} {:>3}%",
            render_progress_bar(p.fraction, BAR_WIDTH),
            (p.fraction * 100.0).round() as u32
        );
        let _ = err.flush();
        if p.is_final() {
            let _ = writeln!(err);
            break;
        }
    }
}

fn phase_name(phase: RelayPhase) -> &'static str {
    match phase {
        RelayPhase::Idle => "idle",
        RelayPhase::Activated => "activated",
        RelayPhase::Dispensing => "dispensing",
        RelayPhase::Deactivated => "stopped early",
        RelayPhase::Done => "done",
    }
}

/// Print a finished run. Hardware interruptions come back as errors.
fn report_run(run: &DispenseRun, ready: &str) -> eyre::Result<Outcome> {
    let stuck = run.energised();
    if !stuck.is_empty() {
        tracing::error!(relays = ?stuck, "relays may still be energised");
        eprintln!("WARNING: relays {stuck:?} did not acknowledge switch-off; cut pump power");
    }

    if json_mode() {
        let relays: Vec<_> = run
            .relays
            .iter()
            .map(|r| {
                json!({
                    "relay": r.relay,
                    "motor": r.motor,
                    "ingredient": r.ingredient,
                    "volume_ml": r.volume_ml,
                    "planned_ms": duration_ms(r.planned),
                    "on_ms": r.on_time().map(duration_ms),
                    "phase": phase_name(r.phase),
                })
            })
            .collect();
        let (status, reason) = match &run.status {
            RunStatus::Complete => ("complete", None),
            RunStatus::Interrupted(InterruptReason::Cancelled) => ("interrupted", Some("cancelled")),
            RunStatus::Interrupted(InterruptReason::Hardware(_)) => ("interrupted", Some("hardware")),
        };
        println!(
            "{}",
            json!({
                "name": run.name,
                "policy": run.policy.as_str(),
                "status": status,
                "reason": reason,
                "elapsed_ms": duration_ms(run.elapsed()),
                "total_time": format_minutes_seconds(run.elapsed()),
                "relays": relays,
            })
        );
    } else {
        for r in &run.relays {
            let on = r
                .on_time()
                .map_or_else(|| "-".to_owned(), |d| format!("{:.2} s", d.as_secs_f64()));
            println!(
                "  {:<20} motor {:>2}  relay {:>2}  {:>6.1} mL  planned {:>7.2} s  on {:>9}  {}",
                r.ingredient,
                r.motor,
                r.relay,
                r.volume_ml,
                r.planned.as_secs_f64(),
                on,
                phase_name(r.phase)
            );
        }
    }

    match &run.status {
        RunStatus::Complete => {
            if !json_mode() {
                println!("{ready}");
                println!("Total time: {}", format_minutes_seconds(run.elapsed()));
            }
            Ok(Outcome::Done)
        }
        RunStatus::Interrupted(InterruptReason::Cancelled) => {
            if !json_mode() {
                println!(
                    "Interrupted after {}; all relays switched off.",
                    format_minutes_seconds(run.elapsed())
                );
            }
            Ok(Outcome::Interrupted)
        }
        RunStatus::Interrupted(InterruptReason::Hardware(e)) => Err(eyre::Report::new(e.clone())
            .wrap_err(format!("{} was interrupted by a relay failure", run.name))),
    }
}
