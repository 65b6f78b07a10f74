//! Relay board backends: an in-memory simulation and (feature `hardware`) GPIO via rppal.
pub mod error;
pub mod pins;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::GpioRelayBoard;

use barbot_traits::{DriverError, RelayDriver, RelayId};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::HwError;

/// Per-relay state of the simulated board.
#[derive(Debug, Default)]
struct SimRelay {
    on: AtomicBool,
    /// Number of off→on transitions.
    activations: AtomicU64,
}

/// Simulated relay board. Tracks on/off state per relay and logs transitions.
///
/// The relay table is fixed by `initialize`; switching afterwards only touches
/// the relay's own atomics, so concurrent tasks on different relays never contend.
#[derive(Debug, Default)]
pub struct SimulatedRelayBoard {
    relays: RwLock<HashMap<RelayId, SimRelay>>,
    faults: HashSet<RelayId>,
    shut_down: AtomicBool,
}

impl SimulatedRelayBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `activate` fail for `relay`, emulating a wiring fault.
    pub fn with_fault(mut self, relay: RelayId) -> Self {
        self.faults.insert(relay);
        self
    }

    /// Whether the relay is currently energised. Unknown relays read as off.
    pub fn is_on(&self, relay: RelayId) -> bool {
        self.relays
            .read()
            .ok()
            .and_then(|map| map.get(&relay).map(|r| r.on.load(Ordering::SeqCst)))
            .unwrap_or(false)
    }

    /// Relays currently energised, ascending.
    pub fn energised(&self) -> Vec<RelayId> {
        let mut on: Vec<RelayId> = self
            .relays
            .read()
            .map(|map| {
                map.iter()
                    .filter(|(_, r)| r.on.load(Ordering::SeqCst))
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default();
        on.sort_unstable();
        on
    }

    /// How many times the relay went from off to on.
    pub fn activation_count(&self, relay: RelayId) -> u64 {
        self.relays
            .read()
            .ok()
            .and_then(|map| map.get(&relay).map(|r| r.activations.load(Ordering::SeqCst)))
            .unwrap_or(0)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn set(&self, relay: RelayId, on: bool) -> Result<(), HwError> {
        if self.is_shut_down() {
            return Err(HwError::ShutDown);
        }
        let map = self
            .relays
            .read()
            .map_err(|_| HwError::Gpio("relay table poisoned".into()))?;
        let state = map.get(&relay).ok_or(HwError::UnknownRelay(relay))?;
        let was_on = state.on.swap(on, Ordering::SeqCst);
        if on && !was_on {
            state.activations.fetch_add(1, Ordering::SeqCst);
        }
        if was_on != on {
            tracing::debug!(relay, on, "simulated relay switched");
        }
        Ok(())
    }
}

impl RelayDriver for SimulatedRelayBoard {
    fn initialize(&self, relays: &[RelayId]) -> Result<(), DriverError> {
        let mut map = self
            .relays
            .write()
            .map_err(|_| HwError::Gpio("relay table poisoned".into()))?;
        map.clear();
        for &relay in relays {
            map.insert(relay, SimRelay::default());
        }
        self.shut_down.store(false, Ordering::SeqCst);
        tracing::info!(relays = relays.len(), "simulated relay board ready");
        Ok(())
    }

    fn activate(&self, relay: RelayId) -> Result<(), DriverError> {
        if self.faults.contains(&relay) {
            tracing::error!(relay, "simulated relay fault");
            return Err(Box::new(HwError::InjectedFault(relay)));
        }
        self.set(relay, true)?;
        Ok(())
    }

    fn deactivate(&self, relay: RelayId) -> Result<(), DriverError> {
        self.set(relay, false)?;
        Ok(())
    }

    fn shutdown(&self) -> Result<(), DriverError> {
        if let Ok(map) = self.relays.read() {
            for state in map.values() {
                state.on.store(false, Ordering::SeqCst);
            }
        }
        self.shut_down.store(true, Ordering::SeqCst);
        tracing::info!("simulated relay board shut down");
        Ok(())
    }
}
