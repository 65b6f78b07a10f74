//! Test and helper mocks for barbot_core.
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use barbot_traits::{Clock, DriverError, RelayDriver, RelayId};

/// Deterministic clock whose time only moves when someone sleeps on it.
///
/// now() = origin + offset; sleep(d) advances offset by d without blocking.
/// Clones share the same timeline.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Virtual time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }

    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Initialize(Vec<RelayId>),
    Activate(RelayId),
    Deactivate(RelayId),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub at: Instant,
    pub event: RelayEvent,
}

/// Fake relay driver that records every call with a timestamp from `C`.
///
/// Failed calls are recorded too; `is_on` reflects only successful switches.
#[derive(Debug)]
pub struct RecordingRelays<C: Clock> {
    clock: C,
    events: Mutex<Vec<RecordedEvent>>,
    on: Mutex<HashSet<RelayId>>,
    fail_activate: HashSet<RelayId>,
    fail_deactivate: HashSet<RelayId>,
}

impl<C: Clock> RecordingRelays<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            events: Mutex::new(Vec::new()),
            on: Mutex::new(HashSet::new()),
            fail_activate: HashSet::new(),
            fail_deactivate: HashSet::new(),
        }
    }

    /// Make every `activate(relay)` fail.
    pub fn failing_activate(mut self, relay: RelayId) -> Self {
        self.fail_activate.insert(relay);
        self
    }

    /// Make every `deactivate(relay)` fail.
    pub fn failing_deactivate(mut self, relay: RelayId) -> Self {
        self.fail_deactivate.insert(relay);
        self
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of driver calls of any kind.
    pub fn call_count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_on(&self, relay: RelayId) -> bool {
        self.on.lock().map(|on| on.contains(&relay)).unwrap_or(false)
    }

    /// Relays currently on, ascending.
    pub fn energised(&self) -> Vec<RelayId> {
        let mut v: Vec<RelayId> = self
            .on
            .lock()
            .map(|on| on.iter().copied().collect())
            .unwrap_or_default();
        v.sort_unstable();
        v
    }

    /// Relays in the order they were switched on.
    pub fn activation_order(&self) -> Vec<RelayId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e.event {
                RelayEvent::Activate(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Relays in the order they were switched off.
    pub fn deactivation_order(&self) -> Vec<RelayId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e.event {
                RelayEvent::Deactivate(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// First activation of `relay` and the first deactivation after it.
    pub fn interval(&self, relay: RelayId) -> Option<(Instant, Instant)> {
        let events = self.events();
        let on_idx = events
            .iter()
            .position(|e| e.event == RelayEvent::Activate(relay))?;
        let off = events[on_idx..]
            .iter()
            .find(|e| e.event == RelayEvent::Deactivate(relay))?;
        Some((events[on_idx].at, off.at))
    }

    fn record(&self, event: RelayEvent) {
        let at = self.clock.now();
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedEvent { at, event });
        }
    }
}

impl<C: Clock + Send + Sync> RelayDriver for RecordingRelays<C> {
    fn initialize(&self, relays: &[RelayId]) -> Result<(), DriverError> {
        self.record(RelayEvent::Initialize(relays.to_vec()));
        if let Ok(mut on) = self.on.lock() {
            on.clear();
        }
        Ok(())
    }

    fn activate(&self, relay: RelayId) -> Result<(), DriverError> {
        self.record(RelayEvent::Activate(relay));
        if self.fail_activate.contains(&relay) {
            return Err(Box::new(std::io::Error::other(format!(
                "relay {relay} did not respond"
            ))));
        }
        if let Ok(mut on) = self.on.lock() {
            on.insert(relay);
        }
        Ok(())
    }

    fn deactivate(&self, relay: RelayId) -> Result<(), DriverError> {
        self.record(RelayEvent::Deactivate(relay));
        if self.fail_deactivate.contains(&relay) {
            return Err(Box::new(std::io::Error::other(format!(
                "relay {relay} stuck on"
            ))));
        }
        if let Ok(mut on) = self.on.lock() {
            on.remove(&relay);
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<(), DriverError> {
        self.record(RelayEvent::Shutdown);
        Ok(())
    }
}
