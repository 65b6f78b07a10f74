//! Human-readable error descriptions and structured JSON error formatting.

use barbot_core::error::{BuildError, DispenseError, ValidationError};

pub const EXIT_GENERIC: i32 = 1;
pub const EXIT_VALIDATION: i32 = 3;
pub const EXIT_HARDWARE: i32 = 4;
pub const EXIT_INTERRUPTED: i32 = 130;

fn find<'a, T: std::error::Error + 'static>(err: &'a eyre::Report) -> Option<&'a T> {
    err.chain().find_map(|e| e.downcast_ref::<T>())
}

fn validation_hint(ve: &ValidationError) -> String {
    let (cause, fix) = match ve {
        ValidationError::UnknownCocktail(_) => (
            "The name does not match any cocktail in the recipe file (names are case-sensitive).",
            "Run `barbot list` to see the available cocktails.",
        ),
        ValidationError::UnknownMotor { .. } => (
            "The recipe references a motor number with no relay in [relays] pins.",
            "Fix the motor number in the recipe file or add the relay pin to the config.",
        ),
        ValidationError::NonPositiveQuantity { .. } => (
            "A quantity in the recipe file is zero, negative, or not a number.",
            "Give every ingredient a positive quantity in mL.",
        ),
        ValidationError::PourTooLong { .. } => (
            "The quantity is far larger than one glass, or the flow rate is far too low.",
            "Check the quantity in the recipe file and pump.flow_rate_ml_per_s.",
        ),
        ValidationError::DuplicateMotor { .. } => (
            "Two ingredients of one recipe use the same pump.",
            "Merge the ingredients or move one to another pump.",
        ),
        ValidationError::EmptyRecipe { .. } => (
            "The recipe lists no ingredients.",
            "Add ingredients to the recipe or remove it.",
        ),
        ValidationError::InvalidFlowRate(_)
        | ValidationError::NoMotors
        | ValidationError::DuplicateRelay(_) => (
            "The [relays] or [pump] section of the config is inconsistent.",
            "Edit the TOML config and try again.",
        ),
    };
    format!("What happened: {ve}.\nLikely causes: {cause}\nHow to fix: {fix}")
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ve) = find::<ValidationError>(err) {
        return validation_hint(ve);
    }

    if let Some(de) = find::<DispenseError>(err) {
        return match de {
            DispenseError::Validation(ve) => validation_hint(ve),
            DispenseError::HardwareFault(_) | DispenseError::Hardware(_) => format!(
                "What happened: A relay command failed ({de}). Every relay this run switched on was sent a switch-off.\nLikely causes: Loose wiring, relay board power, or missing GPIO permissions.\nHow to fix: Check the relay board, then run `barbot self-check`."
            ),
            DispenseError::Config(_) => format!(
                "What happened: {de}.\nLikely causes: A pin in [relays] is not usable as an output.\nHow to fix: Fix the pin list or numbering in the config."
            ),
            DispenseError::State(_) => format!(
                "What happened: {de}.\nLikely causes: The relay driver was already released.\nHow to fix: Restart barbot."
            ),
        };
    }

    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingDriver => {
                "What happened: No relay driver was provided to the executor.\nLikely causes: The relay backend failed to initialize.\nHow to fix: Re-run with --log-level=debug to see why.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in [dispense].\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(te) = find::<toml::de::Error>(err) {
        return format!(
            "What happened: The config file is not valid TOML for barbot.\nLikely causes: A syntax error, a misspelled key, or a missing [relays]/[pump] section.\nHow to fix: {}",
            te.message()
        );
    }

    if let Some(je) = find::<serde_json::Error>(err) {
        return format!(
            "What happened: The recipe file could not be parsed ({je}).\nLikely causes: A JSON syntax error or an ingredient missing name/motor/quantity.\nHow to fix: Fix the recipe file at the reported line."
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = format!("{err:#}").to_ascii_lowercase();

    if lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid ({}).\nLikely causes: Missing or out-of-range values.\nHow to fix: Edit the TOML config and try again.",
            err.root_cause()
        );
    }

    if lower.contains("read config") || lower.contains("read recipes") {
        return format!(
            "What happened: {msg}.\nLikely causes: The path is wrong or the file is not readable.\nHow to fix: Pass --config/--recipes or fix [recipes] path. Cause: {}",
            err.root_cause()
        );
    }

    if lower.contains("open relay gpio") {
        return "What happened: Failed to open the GPIO relay pins.\nLikely causes: Not running on a Raspberry Pi or no permission to access GPIO.\nHow to fix: Run as a user in the gpio group, or build without the hardware feature to simulate.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 validation, 4 hardware, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if find::<ValidationError>(err).is_some() {
        return EXIT_VALIDATION;
    }
    if let Some(de) = find::<DispenseError>(err) {
        return match de {
            DispenseError::Validation(_) | DispenseError::Config(_) => EXIT_VALIDATION,
            DispenseError::Hardware(_) | DispenseError::HardwareFault(_) | DispenseError::State(_) => {
                EXIT_HARDWARE
            }
        };
    }
    if find::<BuildError>(err).is_some()
        || find::<toml::de::Error>(err).is_some()
        || find::<serde_json::Error>(err).is_some()
        || format!("{err:#}").contains("invalid configuration")
    {
        return EXIT_VALIDATION;
    }
    EXIT_GENERIC
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match exit_code_for_error(err) {
        EXIT_VALIDATION => "Validation",
        EXIT_HARDWARE => "Hardware",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "error": format!("{err:#}"),
        "message": humanize(err),
        "exit_code": exit_code_for_error(err),
    })
    .to_string()
}
