use crate::advertisement::RawAdvertisement;
use crate::govee::GOVEE_MANUFACTURER_ID;
use crate::mac_address::MacAddress;
use std::collections::HashMap;

/// A stable Govee-OUI MAC address for unit tests.
pub const TEST_MAC: MacAddress = MacAddress([0xA4, 0xC1, 0x38, 0xDD, 0xEE, 0xFF]);

/// Build a `RawAdvertisement` carrying the given bytes under the Govee
/// manufacturer id.
pub fn advertisement(mac: MacAddress, name: Option<&str>, data: Vec<u8>) -> RawAdvertisement {
    let mut manufacturer_data = HashMap::new();
    manufacturer_data.insert(GOVEE_MANUFACTURER_ID, data);
    RawAdvertisement {
        mac,
        name: name.map(str::to_string),
        manufacturer_data,
    }
}

/// Encode a measurement triple into an H5075 payload.
///
/// Inverse of `govee::decode_h5075` to one decimal place. Humidity above
/// 99.9 % is not representable by the packing and must not be passed here.
pub fn encode_h5075(temperature_c: f64, humidity_pct: f64, battery: u8) -> Vec<u8> {
    assert!(humidity_pct < 100.0, "humidity {humidity_pct} not representable");

    let negative = temperature_c < 0.0;
    let temp_tenths = (temperature_c.abs() * 10.0).round() as u32;
    let humidity_tenths = (humidity_pct * 10.0).round() as u32;

    let mut value = temp_tenths * 1000 + humidity_tenths;
    if negative {
        value |= 0x80_0000;
    }

    vec![
        0x00,
        (value >> 16) as u8,
        (value >> 8) as u8,
        value as u8,
        battery,
    ]
}
