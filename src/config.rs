//! YAML-backed configuration store.
//!
//! The configuration file mirrors the layout operators already use with
//! Home Assistant add-ons:
//!
//! ```yaml
//! mqtt:
//!   broker: 192.168.1.10
//! homeassistant: true
//! devices:
//!   "A4:C1:38:00:00:01":
//!     name: Living Room
//!     configured: false
//! ```
//!
//! The store owns the file path alongside the parsed document so the
//! orchestrator can flush the `configured` flag of a single device back to
//! disk. Flag updates re-read the file first, so concurrent operator edits
//! are folded in on a last-writer-wins basis.

use crate::mac_address::{MacAddress, ParseMacError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors returned by the configuration store.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid device address '{address}': {source}")]
    InvalidAddress {
        address: String,
        source: ParseMacError,
    },
    #[error("no configured device with address {0}")]
    UnknownDevice(MacAddress),
}

/// MQTT transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttSettings {
    /// Broker address as `host` or `host:port`
    pub broker: String,
}

/// One configured sensor, keyed in the file by its hardware address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Display name, used verbatim (normalized) in topic segments
    pub name: String,
    /// Whether discovery metadata has been published for this device
    #[serde(default)]
    pub configured: bool,
    /// Operator intent to remove the device's discovery entities
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub remove: bool,
}

/// The whole configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mqtt: MqttSettings,
    /// Enables Home Assistant discovery publication
    #[serde(default)]
    pub homeassistant: bool,
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceRecord>,
}

/// Durable configuration storage with an explicit load/flush lifecycle.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    /// Load the configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(Self {
            path: path.to_path_buf(),
            config,
        })
    }

    /// The current in-memory configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The set of hardware addresses this process should listen for,
    /// derived from the configured device keys. Read-only for one run.
    pub fn addresses(&self) -> Result<HashSet<MacAddress>, ConfigError> {
        self.config
            .devices
            .keys()
            .map(|key| {
                key.parse().map_err(|source| ConfigError::InvalidAddress {
                    address: key.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Look up the record for a hardware address.
    ///
    /// Keys are compared as parsed addresses, so the file may use either
    /// hex case. Keys that do not parse never match.
    pub fn device(&self, mac: MacAddress) -> Option<&DeviceRecord> {
        self.config
            .devices
            .iter()
            .find(|(key, _)| key.parse::<MacAddress>() == Ok(mac))
            .map(|(_, record)| record)
    }

    /// Persist the `configured` flag for one device.
    ///
    /// Re-reads the file, updates the single record and writes the document
    /// back, then refreshes the in-memory copy. Concurrent external edits
    /// are not guarded against; the last writer wins.
    pub fn set_configured(&mut self, mac: MacAddress, configured: bool) -> Result<(), ConfigError> {
        let contents = fs::read_to_string(&self.path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        let record = config
            .devices
            .iter_mut()
            .find(|(key, _)| key.parse::<MacAddress>() == Ok(mac))
            .map(|(_, record)| record)
            .ok_or(ConfigError::UnknownDevice(mac))?;
        record.configured = configured;

        self.persist(&config)?;
        self.config = config;
        Ok(())
    }

    /// Write the document to a temporary file in the same directory, then
    /// rename it over the configured path. A crash mid-write leaves the
    /// previous file intact.
    fn persist(&self, config: &Config) -> Result<(), ConfigError> {
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut file = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
        file.write_all(serde_yaml::to_string(config)?.as_bytes())?;
        file.persist(&self.path)
            .map_err(|error| ConfigError::Io(error.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TEST_MAC;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
mqtt:
  broker: localhost
homeassistant: true
devices:
  \"A4:C1:38:DD:EE:FF\":
    name: Living Room
  \"A4:C1:38:11:22:33\":
    name: Bedroom
    configured: true
";

    fn store_from(contents: &str) -> (NamedTempFile, ConfigStore) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let store = ConfigStore::load(file.path()).unwrap();
        (file, store)
    }

    #[test]
    fn test_load_defaults() {
        let (_file, store) = store_from(SAMPLE);
        let config = store.config();

        assert_eq!(config.mqtt.broker, "localhost");
        assert!(config.homeassistant);

        let record = store.device(TEST_MAC).unwrap();
        assert_eq!(record.name, "Living Room");
        assert!(!record.configured); // defaults when omitted
        assert!(!record.remove);
    }

    #[test]
    fn test_addresses_registry() {
        let (_file, store) = store_from(SAMPLE);
        let addresses = store.addresses().unwrap();

        assert_eq!(addresses.len(), 2);
        assert!(addresses.contains(&TEST_MAC));
        assert!(addresses.contains(&MacAddress([0xA4, 0xC1, 0x38, 0x11, 0x22, 0x33])));
    }

    #[test]
    fn test_addresses_rejects_bad_key() {
        let contents = "\
mqtt:
  broker: localhost
devices:
  \"not-a-mac\":
    name: Broken
";
        let (_file, store) = store_from(contents);
        assert!(matches!(
            store.addresses(),
            Err(ConfigError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_device_lookup_ignores_key_case() {
        let contents = "\
mqtt:
  broker: localhost
devices:
  \"a4:c1:38:dd:ee:ff\":
    name: Lowercase
";
        let (_file, store) = store_from(contents);
        assert_eq!(store.device(TEST_MAC).unwrap().name, "Lowercase");
    }

    #[test]
    fn test_set_configured_persists() {
        let (file, mut store) = store_from(SAMPLE);

        store.set_configured(TEST_MAC, true).unwrap();
        assert!(store.device(TEST_MAC).unwrap().configured);

        // a fresh load sees the flag
        let reloaded = ConfigStore::load(file.path()).unwrap();
        assert!(reloaded.device(TEST_MAC).unwrap().configured);
        // the sibling record is untouched
        let other = MacAddress([0xA4, 0xC1, 0x38, 0x11, 0x22, 0x33]);
        assert!(reloaded.device(other).unwrap().configured);
        assert_eq!(reloaded.device(other).unwrap().name, "Bedroom");
    }

    #[test]
    fn test_set_configured_replaces_file_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, SAMPLE).unwrap();
        let mut store = ConfigStore::load(&path).unwrap();

        store.set_configured(TEST_MAC, true).unwrap();

        // the temporary file was renamed away, not left beside the config
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["config.yml"]);

        let reloaded = ConfigStore::load(&path).unwrap();
        assert!(reloaded.device(TEST_MAC).unwrap().configured);
    }

    #[test]
    fn test_set_configured_folds_in_external_edits() {
        let (file, mut store) = store_from(SAMPLE);

        // an operator renames a device behind our back
        let edited = SAMPLE.replace("Bedroom", "Guest Room");
        fs::write(file.path(), edited).unwrap();

        store.set_configured(TEST_MAC, true).unwrap();

        let other = MacAddress([0xA4, 0xC1, 0x38, 0x11, 0x22, 0x33]);
        assert_eq!(store.device(other).unwrap().name, "Guest Room");
    }

    #[test]
    fn test_set_configured_unknown_device() {
        let (_file, mut store) = store_from(SAMPLE);
        let stranger = MacAddress([0xA4, 0xC1, 0x38, 0x99, 0x99, 0x99]);
        assert!(matches!(
            store.set_configured(stranger, true),
            Err(ConfigError::UnknownDevice(_))
        ));
    }
}
