//! Device lifecycle and publication orchestrator.
//!
//! Consumes decoded readings one at a time, makes sure Home Assistant has
//! seen discovery metadata for the device exactly once, and publishes the
//! current state. Runs strictly sequentially; the run loop never hands it
//! two readings at once, so configuration mutation needs no locking.

use crate::config::{ConfigError, ConfigStore, DeviceRecord};
use crate::homeassistant::{self, METRICS, StatePayload};
use crate::mac_address::MacAddress;
use crate::mqtt::{MqttMessage, PublishError, Publisher};
use crate::reading::SensorReading;
use thiserror::Error;

/// Errors surfaced to the run loop while handling one reading.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A reading arrived for an address outside the configured registry.
    /// The scan allow-list is derived from the same set, so this is an
    /// invariant violation, not an expected runtime condition.
    #[error("reading from unconfigured device {0}")]
    UnknownDevice(MacAddress),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Tracks per-device discovery state and drives the publish sink.
pub struct Orchestrator {
    store: ConfigStore,
    publisher: Box<dyn Publisher>,
}

impl Orchestrator {
    pub fn new(store: ConfigStore, publisher: Box<dyn Publisher>) -> Self {
        Self { store, publisher }
    }

    /// Handle one decoded reading.
    ///
    /// When discovery is enabled and the device is not yet configured, the
    /// three discovery configs are published first; the `configured` flag is
    /// only persisted after the whole batch succeeded. A failed discovery
    /// batch returns an error and leaves the flag unset, so the next reading
    /// retries. State publication is best-effort: failures are logged and
    /// the reading is dropped, because a fresh reading arrives with the next
    /// scan window anyway.
    pub async fn handle_reading(&mut self, reading: &SensorReading) -> Result<(), BridgeError> {
        let record = self
            .store
            .device(reading.mac)
            .cloned()
            .ok_or(BridgeError::UnknownDevice(reading.mac))?;

        if self.store.config().homeassistant {
            if record.remove {
                // Experimental: operator asked for the discovery entities to
                // be deleted. Takes precedence over (re-)configuration.
                self.remove_device(reading.mac, &record).await?;
            } else if !record.configured {
                self.configure_device(reading.mac, &record).await?;
            }
        }

        let topic = homeassistant::state_topic(&record.name);
        let payload = serde_json::to_string(&StatePayload::from(reading))?;
        let message = MqttMessage::state(topic.clone(), payload.clone());

        match self.publisher.publish_batch(vec![message]).await {
            Ok(()) => log::info!("{topic}: {payload}"),
            Err(error) => log::warn!("state publish to {topic} failed, dropping reading: {error}"),
        }

        Ok(())
    }

    /// Publish the three retained discovery configs and persist the flag.
    async fn configure_device(
        &mut self,
        mac: MacAddress,
        record: &DeviceRecord,
    ) -> Result<(), BridgeError> {
        log::info!("publishing discovery metadata for {} ({})", record.name, mac);

        let mut messages = Vec::with_capacity(METRICS.len());
        for metric in METRICS {
            let topic = homeassistant::discovery_topic(&record.name, metric);
            let config = homeassistant::discovery_config(mac, &record.name, metric);
            messages.push(MqttMessage::retained(
                topic,
                serde_json::to_string(&config)?,
            ));
        }

        self.publisher.publish_batch(messages).await?;
        self.store.set_configured(mac, true)?;
        Ok(())
    }

    /// Publish empty retained payloads to the discovery topics, logically
    /// deleting the entities, and reset the flag. The device record itself
    /// stays in the configuration; pruning is an operator decision.
    async fn remove_device(
        &mut self,
        mac: MacAddress,
        record: &DeviceRecord,
    ) -> Result<(), BridgeError> {
        log::info!("removing discovery metadata for {} ({})", record.name, mac);

        let messages = METRICS
            .map(|metric| {
                MqttMessage::retained(
                    homeassistant::discovery_topic(&record.name, metric),
                    String::new(),
                )
            })
            .to_vec();

        self.publisher.publish_batch(messages).await?;
        self.store.set_configured(mac, false)?;
        Ok(())
    }
}
