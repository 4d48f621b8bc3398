//! Decoder for the Govee H5075 manufacturer-data payload.
//!
//! The H5075 packs temperature and humidity into a single big-endian 24-bit
//! integer followed by a battery byte. There is no checksum; a payload that
//! is long enough always decodes to numbers.

/// Govee manufacturer ID used as the key for the H5075 data block
/// in BLE advertisements.
pub const GOVEE_MANUFACTURER_ID: u16 = 0xEC88;

/// OUI prefix of Govee H5075 hardware addresses (`A4:C1:38`).
pub const GOVEE_OUI: [u8; 3] = [0xA4, 0xC1, 0x38];

/// Minimum payload length: length/type byte, three measurement bytes and
/// the battery byte at offset 4.
pub const MIN_PAYLOAD_LEN: usize = 5;

/// Sign bit of the packed 24-bit measurement value. Set for temperatures
/// below zero; cleared before the value is split.
const SIGN_BIT: u32 = 0x80_0000;

/// The measurement triple carried by one H5075 advertisement.
///
/// All three fields decode together or not at all; humidity and battery are
/// never negative, temperature may be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    /// Temperature in degrees Fahrenheit
    pub temperature: f64,
    /// Relative humidity in percent (one decimal place of precision)
    pub humidity: f64,
    /// Battery charge in percent (0-100 by protocol convention)
    pub battery: u8,
}

/// Convert degrees Celsius to degrees Fahrenheit.
#[inline]
pub fn c_to_f(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Decode an H5075 manufacturer-data payload.
///
/// Bytes at offsets 1-3 form a big-endian unsigned 24-bit value. Bit 23 is
/// the temperature sign; the cleared value divides into tenths of degrees
/// Celsius (quotient by 1000) and tenths of a humidity percent (remainder).
/// The byte at offset 4 is the battery percentage.
///
/// # Returns
/// `None` if the payload is shorter than [`MIN_PAYLOAD_LEN`]. Anything
/// longer produces a result; the protocol has no integrity check.
pub fn decode_h5075(data: &[u8]) -> Option<Measurements> {
    if data.len() < MIN_PAYLOAD_LEN {
        return None;
    }

    let raw = u32::from(data[1]) << 16 | u32::from(data[2]) << 8 | u32::from(data[3]);
    let negative = raw & SIGN_BIT != 0;
    let value = raw & !SIGN_BIT;

    let mut temperature_c = f64::from(value / 1000) / 10.0;
    if negative {
        temperature_c = -temperature_c;
    }
    let humidity = f64::from(value % 1000) / 10.0;

    Some(Measurements {
        temperature: c_to_f(temperature_c),
        humidity,
        battery: data[4],
    })
}
