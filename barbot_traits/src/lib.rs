//! Seams between the dispensing engine and the outside world: time and relays.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Physical relay identifier (a GPIO pin number in the board's configured numbering).
pub type RelayId = u8;

/// Error type crossing the driver boundary.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// Switches pump relays on and off.
///
/// Methods take `&self` so a single driver can be shared by one task per relay;
/// implementations keep per-relay state and never hold a lock across relays.
/// `deactivate` on a relay that is already off must succeed without side effects.
pub trait RelayDriver: Send + Sync {
    /// Put every listed relay into its safe (off) electrical state.
    fn initialize(&self, relays: &[RelayId]) -> Result<(), DriverError>;
    /// Energise the relay, starting its pump.
    fn activate(&self, relay: RelayId) -> Result<(), DriverError>;
    /// De-energise the relay, stopping its pump.
    fn deactivate(&self, relay: RelayId) -> Result<(), DriverError>;
    /// Release access to the underlying hardware.
    fn shutdown(&self) -> Result<(), DriverError>;
}

impl<R: RelayDriver + ?Sized> RelayDriver for std::sync::Arc<R> {
    fn initialize(&self, relays: &[RelayId]) -> Result<(), DriverError> {
        (**self).initialize(relays)
    }
    fn activate(&self, relay: RelayId) -> Result<(), DriverError> {
        (**self).activate(relay)
    }
    fn deactivate(&self, relay: RelayId) -> Result<(), DriverError> {
        (**self).deactivate(relay)
    }
    fn shutdown(&self) -> Result<(), DriverError> {
        (**self).shutdown()
    }
}

impl<R: RelayDriver + ?Sized> RelayDriver for Box<R> {
    fn initialize(&self, relays: &[RelayId]) -> Result<(), DriverError> {
        (**self).initialize(relays)
    }
    fn activate(&self, relay: RelayId) -> Result<(), DriverError> {
        (**self).activate(relay)
    }
    fn deactivate(&self, relay: RelayId) -> Result<(), DriverError> {
        (**self).deactivate(relay)
    }
    fn shutdown(&self) -> Result<(), DriverError> {
        (**self).shutdown()
    }
}
