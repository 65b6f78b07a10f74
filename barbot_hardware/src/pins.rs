//! Pin numbering for the Raspberry Pi 40-pin header.
//!
//! Relay modules are usually wired by physical header position ("board"
//! numbering), while the GPIO driver addresses Broadcom channel numbers.

use std::fmt;

use crate::error::{HwError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinNumbering {
    /// Physical position on the 40-pin header (1..=40).
    #[default]
    Board,
    /// Broadcom SoC channel number.
    Bcm,
}

impl fmt::Display for PinNumbering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinNumbering::Board => f.write_str("board"),
            PinNumbering::Bcm => f.write_str("bcm"),
        }
    }
}

/// (header pin, BCM channel) for every GPIO-capable header position.
const BOARD_TO_BCM: [(u8, u8); 28] = [
    (3, 2),
    (5, 3),
    (7, 4),
    (8, 14),
    (10, 15),
    (11, 17),
    (12, 18),
    (13, 27),
    (15, 22),
    (16, 23),
    (18, 24),
    (19, 10),
    (21, 9),
    (22, 25),
    (23, 11),
    (24, 8),
    (26, 7),
    (27, 0),
    (28, 1),
    (29, 5),
    (31, 6),
    (32, 12),
    (33, 13),
    (35, 19),
    (36, 16),
    (37, 26),
    (38, 20),
    (40, 21),
];

/// Highest BCM channel exposed on the header.
const MAX_BCM: u8 = 27;

/// Translate a pin in `numbering` to its BCM channel.
pub fn to_bcm(pin: u8, numbering: PinNumbering) -> Result<u8> {
    match numbering {
        PinNumbering::Board => BOARD_TO_BCM
            .iter()
            .find(|(board, _)| *board == pin)
            .map(|(_, bcm)| *bcm)
            .ok_or(HwError::InvalidPin { pin, numbering }),
        PinNumbering::Bcm if pin <= MAX_BCM => Ok(pin),
        PinNumbering::Bcm => Err(HwError::InvalidPin { pin, numbering }),
    }
}

/// True when `pin` names a usable GPIO in `numbering`.
pub fn is_gpio(pin: u8, numbering: PinNumbering) -> bool {
    to_bcm(pin, numbering).is_ok()
}
