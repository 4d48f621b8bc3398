//! Topic layout and wire payloads for Home Assistant MQTT discovery.
//!
//! The field layout must stay byte-compatible with what existing Home
//! Assistant installations already have retained on their brokers:
//! discovery configs under `homeassistant/sensor/<name>/<metric>/config`
//! and state under `govee/sensor/<name>/state`.

use crate::mac_address::MacAddress;
use crate::reading::SensorReading;
use serde::Serialize;
use std::fmt;

const MANUFACTURER: &str = "Govee";
const MODEL: &str = "H5075";

/// The three entities published per sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Battery,
    Temperature,
    Humidity,
}

/// All metrics, in the order discovery messages are published.
pub const METRICS: [Metric; 3] = [Metric::Battery, Metric::Temperature, Metric::Humidity];

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Battery => write!(f, "battery"),
            Metric::Temperature => write!(f, "temperature"),
            Metric::Humidity => write!(f, "humidity"),
        }
    }
}

/// Normalize a display name for use in topic segments: lowercase, spaces
/// replaced with underscores.
pub fn normalize_name(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

/// State topic for a device, e.g. `govee/sensor/living_room/state`.
pub fn state_topic(name: &str) -> String {
    format!("govee/sensor/{}/state", normalize_name(name))
}

/// Discovery config topic for one metric of a device,
/// e.g. `homeassistant/sensor/living_room/temperature/config`.
pub fn discovery_topic(name: &str, metric: Metric) -> String {
    format!(
        "homeassistant/sensor/{}/{}/config",
        normalize_name(name),
        metric
    )
}

/// The shared device descriptor nested inside every discovery config.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceDescriptor {
    pub identifiers: Vec<String>,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
}

/// One discovery config payload.
///
/// `state_class` is present for measurements only and `entity_category`
/// for the battery diagnostic only; both are omitted from the JSON
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryConfig {
    pub device_class: String,
    pub name: String,
    pub unit_of_measurement: String,
    pub value_template: String,
    pub state_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,
    pub device: DeviceDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<String>,
    pub unique_id: String,
}

/// State payload published on every reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatePayload {
    pub battery: u8,
    pub humidity: f64,
    pub temperature: f64,
}

impl From<&SensorReading> for StatePayload {
    fn from(reading: &SensorReading) -> Self {
        Self {
            battery: reading.battery,
            humidity: reading.humidity,
            temperature: reading.temperature,
        }
    }
}

/// Build the discovery config for one metric of a device.
///
/// `unique_id` combines the flattened address with the metric so entities
/// stay stable across renames; `identifiers` ties the three entities to a
/// single device in the Home Assistant registry.
pub fn discovery_config(mac: MacAddress, name: &str, metric: Metric) -> DiscoveryConfig {
    let device = DeviceDescriptor {
        identifiers: vec![format!("govee_{}", mac.flat())],
        manufacturer: MANUFACTURER.to_string(),
        model: MODEL.to_string(),
        name: format!("{name} Hygrometer / Thermometer"),
    };

    let (unit, value_template, state_class, entity_category) = match metric {
        Metric::Battery => (
            "%",
            "{{ value_json.battery }}",
            None,
            Some("diagnostic".to_string()),
        ),
        Metric::Temperature => (
            "°F",
            "{{ value_json.temperature | round(1) }}",
            Some("measurement".to_string()),
            None,
        ),
        Metric::Humidity => (
            "%",
            "{{ value_json.humidity }}",
            Some("measurement".to_string()),
            None,
        ),
    };

    DiscoveryConfig {
        device_class: metric.to_string(),
        name: format!("{} {}", name, title(metric)),
        unit_of_measurement: unit.to_string(),
        value_template: value_template.to_string(),
        state_topic: state_topic(name),
        state_class,
        device,
        entity_category,
        unique_id: format!("{}_{}_govee", mac.flat(), metric),
    }
}

fn title(metric: Metric) -> &'static str {
    match metric {
        Metric::Battery => "Battery",
        Metric::Temperature => "Temperature",
        Metric::Humidity => "Humidity",
    }
}
