//! Decoded sensor reading produced by the advertisement filter.

use crate::mac_address::MacAddress;

/// One decoded reading from a Govee H5075 sensor.
///
/// A reading only exists if the whole measurement triple decoded; the fields
/// are therefore not optional. Humidity and battery are never negative,
/// temperature may be.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    /// MAC address of the sensor
    pub mac: MacAddress,
    /// Advertised device name, when the radio reported one
    pub name: Option<String>,
    /// Battery charge in percent
    pub battery: u8,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Temperature in degrees Fahrenheit
    pub temperature: f64,
}
