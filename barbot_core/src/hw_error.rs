//! Maps `Box<dyn Error>` from the relay driver boundary to typed `DispenseError`.
//!
//! `RelayDriver` uses `Box<dyn Error + Send + Sync>` so any backend can plug in;
//! this module converts those to our typed error enum, with an optional
//! feature-gated path for `barbot_hardware::HwError` downcasting.

use crate::error::DispenseError;

/// Map a driver error to a typed `DispenseError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> DispenseError {
    #[cfg(feature = "hardware-errors")]
    {
        use barbot_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::UnknownRelay(_) | HwError::InvalidPin { .. } => {
                    DispenseError::Config(hw.to_string())
                }
                HwError::ShutDown => DispenseError::State(hw.to_string()),
                other => DispenseError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("shut down") {
        DispenseError::State(s)
    } else {
        DispenseError::Hardware(s)
    }
}
