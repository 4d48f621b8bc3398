//! `govee-bridge` library.
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing, logging setup
//! and process exit codes. The core business logic lives in [`crate::app`]
//! where it can be tested deterministically with injected radio + injected
//! publish-sink implementations.

pub mod advertisement;
pub mod app;
pub mod config;
pub mod govee;
pub mod homeassistant;
pub mod mac_address;
pub mod mqtt;
pub mod orchestrator;
pub mod reading;
pub mod scanner;
pub mod throttle;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types at the crate root
pub use advertisement::{RawAdvertisement, process_advertisement};
pub use config::{Config, ConfigError, ConfigStore, DeviceRecord};
pub use govee::{GOVEE_MANUFACTURER_ID, GOVEE_OUI, Measurements, decode_h5075};
pub use mac_address::MacAddress;
pub use mqtt::{MqttMessage, MqttPublisher, PublishError, Publisher, QosLevel};
pub use orchestrator::{BridgeError, Orchestrator};
pub use reading::SensorReading;
pub use scanner::{GoveeScanner, ObserverId, Radio, ScanError};
pub use throttle::{Throttle, parse_duration};
