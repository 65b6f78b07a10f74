//! Relay board driven through the Raspberry Pi GPIO character device.
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use barbot_traits::{DriverError, RelayDriver, RelayId};
use rppal::gpio::{Gpio, OutputPin};
use tracing::{debug, info, warn};

use crate::error::{HwError, Result};
use crate::pins::{PinNumbering, to_bcm};

impl From<rppal::gpio::Error> for HwError {
    fn from(e: rppal::gpio::Error) -> Self {
        HwError::Gpio(e.to_string())
    }
}

pub struct GpioRelayBoard {
    gpio: Gpio,
    numbering: PinNumbering,
    /// Relay modules commonly energise the coil when the input is pulled low.
    active_low: bool,
    /// One lock per relay; the outer lock is only written by initialize/shutdown.
    pins: RwLock<HashMap<RelayId, Mutex<OutputPin>>>,
}

impl GpioRelayBoard {
    pub fn new(numbering: PinNumbering, active_low: bool) -> Result<Self> {
        let gpio = Gpio::new()?;
        Ok(Self {
            gpio,
            numbering,
            active_low,
            pins: RwLock::new(HashMap::new()),
        })
    }

    fn open_off(&self, relay: RelayId) -> Result<OutputPin> {
        let bcm = to_bcm(relay, self.numbering)?;
        let pin = self.gpio.get(bcm)?;
        let out = if self.active_low {
            pin.into_output_high()
        } else {
            pin.into_output_low()
        };
        debug!(relay, bcm, "relay pin opened in off state");
        Ok(out)
    }

    fn drive(&self, relay: RelayId, on: bool) -> Result<()> {
        let pins = self
            .pins
            .read()
            .map_err(|_| HwError::Gpio("pin table poisoned".into()))?;
        let pin = pins.get(&relay).ok_or(HwError::UnknownRelay(relay))?;
        let mut pin = pin
            .lock()
            .map_err(|_| HwError::Gpio(format!("relay {relay} lock poisoned")))?;
        // Level that energises the coil.
        if on != self.active_low {
            pin.set_high();
        } else {
            pin.set_low();
        }
        Ok(())
    }
}

impl RelayDriver for GpioRelayBoard {
    fn initialize(&self, relays: &[RelayId]) -> std::result::Result<(), DriverError> {
        let mut opened = HashMap::with_capacity(relays.len());
        for &relay in relays {
            opened.insert(relay, Mutex::new(self.open_off(relay)?));
        }
        let mut pins = self
            .pins
            .write()
            .map_err(|_| HwError::Gpio("pin table poisoned".into()))?;
        *pins = opened;
        info!(
            relays = relays.len(),
            numbering = %self.numbering,
            active_low = self.active_low,
            "gpio relay board ready"
        );
        Ok(())
    }

    fn activate(&self, relay: RelayId) -> std::result::Result<(), DriverError> {
        self.drive(relay, true)?;
        Ok(())
    }

    fn deactivate(&self, relay: RelayId) -> std::result::Result<(), DriverError> {
        self.drive(relay, false)?;
        Ok(())
    }

    fn shutdown(&self) -> std::result::Result<(), DriverError> {
        let mut pins = self
            .pins
            .write()
            .map_err(|_| HwError::Gpio("pin table poisoned".into()))?;
        for (relay, pin) in pins.iter() {
            match pin.lock() {
                Ok(mut pin) => {
                    if self.active_low {
                        pin.set_high();
                    } else {
                        pin.set_low();
                    }
                }
                Err(_) => warn!(relay, "relay lock poisoned during shutdown"),
            }
        }
        // Dropping the pins hands them back to the kernel.
        pins.clear();
        info!("gpio relay board released");
        Ok(())
    }
}
