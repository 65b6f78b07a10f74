use barbot_traits::RelayId;
use thiserror::Error;

use crate::pins::PinNumbering;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("relay {0} was not initialized")]
    UnknownRelay(RelayId),
    #[error("pin {pin} is not a usable gpio in {numbering} numbering")]
    InvalidPin { pin: u8, numbering: PinNumbering },
    #[error("relay board has been shut down")]
    ShutDown,
    #[error("simulated fault on relay {0}")]
    InjectedFault(RelayId),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
