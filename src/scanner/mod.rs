//! BLE scan duty-cycle controller for Govee sensors.
//!
//! This module provides a trait-based abstraction over the radio backend
//! plus the controller that cycles scanning on and off and fans decoded
//! readings out to registered observers.

#[cfg(feature = "bluer")]
pub mod bluer;

use crate::advertisement::{RawAdvertisement, process_advertisement};
use crate::mac_address::MacAddress;
use crate::reading::SensorReading;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;

/// Error type for scanner operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Bluetooth/adapter related error
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),
    /// `start_cycle` was called while a scan window was already active
    #[error("scan cycle already started")]
    AlreadyScanning,
    /// `stop_cycle` was called without a matching `start_cycle`
    #[error("scan cycle not started")]
    NotScanning,
    /// Backend not available (not compiled in)
    #[allow(dead_code)]
    #[error("Backend '{0}' not available (not compiled in)")]
    BackendNotAvailable(String),
}

/// Buffer size of the advertisement channel between the radio session task
/// and the fan-out worker.
pub const ADVERTISEMENT_CHANNEL_BUFFER_SIZE: usize = 100;

/// Radio capability abstraction to enable deterministic unit tests without
/// Bluetooth hardware.
///
/// `start` opens a scan session that forwards every observed advertisement
/// into `events` until `stop` tears the session down again. Implementations
/// must fully release the session's resources in `stop` so the pair can be
/// repeated indefinitely.
pub trait Radio: Send {
    fn start(
        &mut self,
        events: mpsc::Sender<RawAdvertisement>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ScanError>> + Send + '_>>;

    fn stop(&mut self) -> Pin<Box<dyn Future<Output = Result<(), ScanError>> + Send + '_>>;
}

/// Handle identifying a registered observer, returned by
/// [`GoveeScanner::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

/// Callback invoked once per successfully filtered reading.
pub type Observer = Box<dyn Fn(&SensorReading) + Send + 'static>;

type ObserverList = Arc<Mutex<Vec<(ObserverId, Observer)>>>;

/// Duty-cycle controller for the BLE scan.
///
/// Owns the radio session lifecycle and a fan-out worker fed through a
/// bounded channel, decoupling radio-driver threading from reading
/// processing. The worker discards addresses outside the allow-list before
/// they reach the filter, then invokes observers synchronously in
/// registration order; the next advertisement is not processed until every
/// observer returned.
pub struct GoveeScanner {
    radio: Box<dyn Radio>,
    events: mpsc::Sender<RawAdvertisement>,
    observers: ObserverList,
    next_observer_id: u64,
    scanning: bool,
}

impl GoveeScanner {
    /// Create a controller listening for the given addresses.
    ///
    /// Spawns the fan-out worker; it exits when the controller is dropped.
    pub fn new(radio: Box<dyn Radio>, addresses: HashSet<MacAddress>) -> Self {
        let (events, receiver) = mpsc::channel(ADVERTISEMENT_CHANNEL_BUFFER_SIZE);
        let observers: ObserverList = Arc::default();

        tokio::spawn(fan_out(receiver, addresses, Arc::clone(&observers)));

        Self {
            radio,
            events,
            observers,
            next_observer_id: 0,
            scanning: false,
        }
    }

    /// Register an observer, invoked once per reading in registration order.
    pub fn register(&mut self, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers
            .lock()
            .expect("observer list poisoned")
            .push((id, observer));
        id
    }

    /// Remove a previously registered observer. Returns `false` if the id
    /// was not (or no longer) registered.
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock().expect("observer list poisoned");
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    /// Begin an active scanning window.
    ///
    /// Calling this while a window is active is a caller-discipline
    /// violation and is rejected with [`ScanError::AlreadyScanning`] rather
    /// than silently opening a second session.
    pub async fn start_cycle(&mut self) -> Result<(), ScanError> {
        if self.scanning {
            return Err(ScanError::AlreadyScanning);
        }
        self.radio.start(self.events.clone()).await?;
        self.scanning = true;
        Ok(())
    }

    /// End the active scanning window, releasing the scan session.
    pub async fn stop_cycle(&mut self) -> Result<(), ScanError> {
        if !self.scanning {
            return Err(ScanError::NotScanning);
        }
        self.radio.stop().await?;
        self.scanning = false;
        Ok(())
    }
}

/// Single consumer of the advertisement channel: allow-list pre-filter,
/// decode, then synchronous fan-out.
async fn fan_out(
    mut events: mpsc::Receiver<RawAdvertisement>,
    addresses: HashSet<MacAddress>,
    observers: ObserverList,
) {
    while let Some(advertisement) = events.recv().await {
        if !addresses.contains(&advertisement.mac) {
            continue;
        }
        if let Some(reading) = process_advertisement(&advertisement) {
            let observers = observers.lock().expect("observer list poisoned");
            for (_, observer) in observers.iter() {
                observer(&reading);
            }
        }
    }
}
