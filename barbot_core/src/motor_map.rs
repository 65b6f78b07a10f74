use barbot_traits::RelayId;

use crate::error::ValidationError;

/// Fixed mapping from motor number (1..=N) to the relay that powers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotorMap {
    relays: Vec<RelayId>,
}

impl MotorMap {
    /// `relays[0]` drives motor 1. Relays must be distinct so the mapping is a bijection.
    pub fn new(relays: Vec<RelayId>) -> Result<Self, ValidationError> {
        if relays.is_empty() {
            return Err(ValidationError::NoMotors);
        }
        for (i, relay) in relays.iter().enumerate() {
            if relays[..i].contains(relay) {
                return Err(ValidationError::DuplicateRelay(*relay));
            }
        }
        Ok(Self { relays })
    }

    pub fn relay_for(&self, motor: u32) -> Option<RelayId> {
        let idx = usize::try_from(motor).ok()?.checked_sub(1)?;
        self.relays.get(idx).copied()
    }

    pub fn motor_for(&self, relay: RelayId) -> Option<u32> {
        self.relays
            .iter()
            .position(|r| *r == relay)
            .and_then(|i| u32::try_from(i + 1).ok())
    }

    /// All relays in motor order.
    pub fn relays(&self) -> &[RelayId] {
        &self.relays
    }

    /// `(motor, relay)` pairs in motor order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, RelayId)> + '_ {
        (1u32..).zip(self.relays.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }
}
