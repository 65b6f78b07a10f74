//! Relay backend selection.

use barbot_config::Config;
use barbot_traits::RelayDriver;

/// Comma-separated relay ids the simulated board should refuse to switch on.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub const SIM_FAIL_ENV: &str = "BARBOT_SIM_FAIL_RELAY";

/// GPIO relays on Linux with the `hardware` feature.
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn make_driver(cfg: &Config) -> eyre::Result<Box<dyn RelayDriver>> {
    use eyre::WrapErr;

    let board = barbot_hardware::GpioRelayBoard::new(
        cfg.relays.numbering.into(),
        cfg.relays.active_low,
    )
    .wrap_err("open relay gpio")?;
    tracing::info!(
        numbering = ?cfg.relays.numbering,
        active_low = cfg.relays.active_low,
        relays = cfg.relays.pins.len(),
        "using gpio relay board"
    );
    Ok(Box::new(board))
}

/// Simulated relays everywhere else.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn make_driver(_cfg: &Config) -> eyre::Result<Box<dyn RelayDriver>> {
    let mut board = barbot_hardware::SimulatedRelayBoard::new();
    if let Ok(list) = std::env::var(SIM_FAIL_ENV) {
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let relay: u8 = item
                .parse()
                .map_err(|_| eyre::eyre!("{SIM_FAIL_ENV} must list relay ids, got {item:?}"))?;
            board = board.with_fault(relay);
        }
    }
    tracing::info!("using simulated relay board");
    Ok(Box::new(board))
}
