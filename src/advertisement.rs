//! Advertisement filtering for Govee H5075 sensors.
//!
//! Radio backends hand every observed advertisement to
//! [`process_advertisement`], which keeps only frames from Govee hardware
//! that actually carry a decodable H5075 data block. Everything else is a
//! silent `None`; unmatched traffic is normal, not an error.

use crate::govee::{self, GOVEE_MANUFACTURER_ID, GOVEE_OUI};
use crate::mac_address::MacAddress;
use crate::reading::SensorReading;
use std::collections::HashMap;

/// A raw advertisement as observed by a radio backend.
///
/// Lives only for the duration of one detection event; the fan-out worker
/// consumes it immediately.
#[derive(Debug, Clone)]
pub struct RawAdvertisement {
    /// Hardware address of the broadcasting device
    pub mac: MacAddress,
    /// Advertised device name, if any
    pub name: Option<String>,
    /// Manufacturer-specific data blocks keyed by company identifier
    pub manufacturer_data: HashMap<u16, Vec<u8>>,
}

/// Filter one advertisement down to a sensor reading.
///
/// Rejects addresses outside the Govee OUI before touching the payload, then
/// looks up the H5075 data block by manufacturer id. Frames from a matched
/// device without that block (e.g. connection-mode frames) produce no
/// reading, as do payloads that are too short to decode.
pub fn process_advertisement(advertisement: &RawAdvertisement) -> Option<SensorReading> {
    if !advertisement.mac.has_oui(GOVEE_OUI) {
        return None;
    }

    let data = advertisement.manufacturer_data.get(&GOVEE_MANUFACTURER_ID)?;
    let measurements = govee::decode_h5075(data)?;

    Some(SensorReading {
        mac: advertisement.mac,
        name: advertisement.name.clone(),
        battery: measurements.battery,
        humidity: measurements.humidity,
        temperature: measurements.temperature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TEST_MAC, advertisement, encode_h5075};

    #[test]
    fn test_matching_advertisement_produces_reading() {
        let data = encode_h5075(32.8, 54.1, 64);
        let adv = advertisement(TEST_MAC, Some("GVH5075_EEFF"), data);

        let reading = process_advertisement(&adv).unwrap();
        assert_eq!(reading.mac, TEST_MAC);
        assert_eq!(reading.name.as_deref(), Some("GVH5075_EEFF"));
        assert_eq!(reading.battery, 64);
        assert!((reading.humidity - 54.1).abs() < 1e-9);
        assert!((reading.temperature - 91.04).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_oui_is_rejected() {
        // valid payload, but the address is not Govee hardware
        let data = encode_h5075(32.8, 54.1, 64);
        let mac = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        let adv = advertisement(mac, None, data);

        assert_eq!(process_advertisement(&adv), None);
    }

    #[test]
    fn test_missing_manufacturer_id_is_rejected() {
        let mut adv = advertisement(TEST_MAC, None, encode_h5075(20.0, 50.0, 90));
        let data = adv.manufacturer_data.remove(&GOVEE_MANUFACTURER_ID).unwrap();
        // same bytes under a different company id must not decode
        adv.manufacturer_data.insert(0x0499, data);

        assert_eq!(process_advertisement(&adv), None);
    }

    #[test]
    fn test_truncated_payload_is_skipped() {
        let mut adv = advertisement(TEST_MAC, None, vec![0x00, 0x05, 0x03]);
        assert_eq!(process_advertisement(&adv), None);

        // empty block as well
        adv.manufacturer_data.insert(GOVEE_MANUFACTURER_ID, vec![]);
        assert_eq!(process_advertisement(&adv), None);
    }

    #[test]
    fn test_name_is_optional() {
        let adv = advertisement(TEST_MAC, None, encode_h5075(20.0, 50.0, 90));
        let reading = process_advertisement(&adv).unwrap();
        assert_eq!(reading.name, None);
    }
}
