//! Datapoint type (DPT) translation.
//!
//! A typed registry replaces the dynamic main-type/subtype table lookup of
//! classic KNX tooling: subtypes are static records keyed by main number and
//! id string, resolved once when a datapoint is loaded, so unknown codes fail
//! at load time instead of at decode time.
//!
//! ## Supported main types
//!
//! - **1.xxx** - Boolean (switch, enable, up/down, open/close)
//! - **5.xxx** - 8-bit unsigned (scaling %, counter)
//! - **7.xxx** - 16-bit unsigned (pulses, brightness)
//! - **9.xxx** - 2-byte float (temperature, illuminance, humidity, ppm)
//!
//! ## ASDU convention
//!
//! The application data unit as carried in a cEMI frame: byte 0 is the APCI
//! low byte, which for 1-bit types also holds the 6-bit data; longer payloads
//! follow from byte 1.
//!
//! ## Example
//!
//! ```
//! use knx_monitor::dpt::Translator;
//!
//! let t = Translator::resolve(9, "9.001")?;
//! assert_eq!(t.unit(), "°C");
//! let asdu = t.encode("-5")?;
//! assert_eq!(t.decode_to_string(&asdu)?, "-5 °C");
//! # Ok::<(), knx_monitor::MonitorError>(())
//! ```

use crate::error::{MonitorError, Result};
use core::fmt;

/// A decoded datapoint value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DptValue {
    /// DPT 1.xxx - boolean
    Bool(bool),
    /// DPT 5.001 - percentage 0-100 %
    Percent(u8),
    /// DPT 5.xxx - unscaled 8-bit unsigned
    Unsigned8(u8),
    /// DPT 7.xxx - 16-bit unsigned
    Unsigned16(u16),
    /// DPT 9.xxx - 2-byte float
    Float(f32),
}

impl fmt::Display for DptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DptValue::Bool(b) => write!(f, "{b}"),
            DptValue::Percent(p) => write!(f, "{p}"),
            DptValue::Unsigned8(v) => write!(f, "{v}"),
            DptValue::Unsigned16(v) => write!(f, "{v}"),
            DptValue::Float(v) => write!(f, "{v}"),
        }
    }
}

// =============================================================================
// Registry Tables
// =============================================================================

/// One DPT subtype record: id, name, unit and the value range bounds a
/// front-end offers as write presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subtype {
    /// Subtype id, e.g. `"9.001"`
    pub id: &'static str,
    /// Human-readable name, e.g. `"Temperature"`
    pub name: &'static str,
    /// Unit suffix, empty when dimensionless
    pub unit: &'static str,
    /// Lower bound (or the `false` label for booleans)
    pub lower: &'static str,
    /// Upper bound (or the `true` label for booleans)
    pub upper: &'static str,
}

/// A DPT main type with its subtype table.
#[derive(Debug, Clone, Copy)]
pub struct MainType {
    /// Main number, e.g. 9 for 2-byte floats
    pub number: u8,
    /// Family name
    pub name: &'static str,
    /// Known subtypes of this family
    pub subtypes: &'static [Subtype],
}

impl MainType {
    /// Look up a subtype of this family by id.
    pub fn subtype(&self, id: &str) -> Option<&'static Subtype> {
        self.subtypes.iter().find(|s| s.id == id)
    }
}

/// The static registry, one entry per supported main number.
pub const MAIN_TYPES: &[MainType] = &[
    MainType {
        number: 1,
        name: "Boolean",
        subtypes: &[
            Subtype { id: "1.001", name: "Switch", unit: "", lower: "off", upper: "on" },
            Subtype { id: "1.002", name: "Bool", unit: "", lower: "false", upper: "true" },
            Subtype { id: "1.003", name: "Enable", unit: "", lower: "disable", upper: "enable" },
            Subtype { id: "1.008", name: "UpDown", unit: "", lower: "up", upper: "down" },
            Subtype { id: "1.009", name: "OpenClose", unit: "", lower: "open", upper: "close" },
            Subtype { id: "1.010", name: "Start", unit: "", lower: "stop", upper: "start" },
        ],
    },
    MainType {
        number: 5,
        name: "8-bit unsigned",
        subtypes: &[
            Subtype { id: "5.001", name: "Scaling", unit: "%", lower: "0", upper: "100" },
            Subtype { id: "5.010", name: "Counter", unit: "counter pulses", lower: "0", upper: "255" },
        ],
    },
    MainType {
        number: 7,
        name: "16-bit unsigned",
        subtypes: &[
            Subtype { id: "7.001", name: "Pulses", unit: "pulses", lower: "0", upper: "65535" },
            Subtype { id: "7.013", name: "Brightness", unit: "lx", lower: "0", upper: "65535" },
        ],
    },
    MainType {
        number: 9,
        name: "2-byte float",
        subtypes: &[
            Subtype { id: "9.001", name: "Temperature", unit: "°C", lower: "-273", upper: "670760" },
            Subtype { id: "9.004", name: "Illuminance", unit: "lx", lower: "0", upper: "670760" },
            Subtype { id: "9.007", name: "Humidity", unit: "%", lower: "0", upper: "670760" },
            Subtype { id: "9.008", name: "AirQuality", unit: "ppm", lower: "0", upper: "670760" },
        ],
    },
];

/// Look up a main type by number.
pub fn main_type(number: u8) -> Option<&'static MainType> {
    MAIN_TYPES.iter().find(|m| m.number == number)
}

// =============================================================================
// Translator
// =============================================================================

/// A translator bound to one subtype, resolved against the registry.
///
/// Resolution happens once, at datapoint load time; decode and encode
/// afterwards cannot hit an unknown code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translator {
    main: u8,
    subtype: &'static Subtype,
}

impl Translator {
    /// Resolve a translator for `main` / `dpt_id`.
    ///
    /// # Errors
    ///
    /// Fails fast on a main number or subtype id the registry does not know.
    pub fn resolve(main: u8, dpt_id: &str) -> Result<Self> {
        let family = main_type(main).ok_or_else(MonitorError::unknown_main_type)?;
        let subtype = family
            .subtype(dpt_id)
            .ok_or_else(MonitorError::unknown_subtype)?;
        Ok(Self { main, subtype })
    }

    /// Main number this translator belongs to.
    pub const fn main_number(&self) -> u8 {
        self.main
    }

    /// Subtype id, e.g. `"1.001"`.
    pub const fn dpt_id(&self) -> &'static str {
        self.subtype.id
    }

    /// Unit suffix, empty when dimensionless.
    pub const fn unit(&self) -> &'static str {
        self.subtype.unit
    }

    /// Lower bound (or `false` label).
    pub const fn lower_value(&self) -> &'static str {
        self.subtype.lower
    }

    /// Upper bound (or `true` label).
    pub const fn upper_value(&self) -> &'static str {
        self.subtype.upper
    }

    /// Decode an ASDU into a typed value.
    ///
    /// # Errors
    ///
    /// Returns an invalid-data error when the payload length does not match
    /// the subtype.
    pub fn decode(&self, asdu: &[u8]) -> Result<DptValue> {
        match self.main {
            1 => {
                // 6-bit data in the APCI byte, LSB is the value
                let byte = *asdu.first().ok_or_else(MonitorError::invalid_dpt_data)?;
                Ok(DptValue::Bool(byte & 0x01 != 0))
            }
            5 => {
                if asdu.len() < 2 {
                    return Err(MonitorError::invalid_dpt_data());
                }
                let raw = asdu[1];
                if self.subtype.id == "5.001" {
                    // 0-255 raw maps to 0-100 %, rounded to nearest
                    Ok(DptValue::Percent(
                        ((u16::from(raw) * 100 + 127) / 255) as u8,
                    ))
                } else {
                    Ok(DptValue::Unsigned8(raw))
                }
            }
            7 => {
                if asdu.len() < 3 {
                    return Err(MonitorError::invalid_dpt_data());
                }
                Ok(DptValue::Unsigned16(u16::from_be_bytes([asdu[1], asdu[2]])))
            }
            9 => {
                if asdu.len() < 3 {
                    return Err(MonitorError::invalid_dpt_data());
                }
                let raw = u16::from_be_bytes([asdu[1], asdu[2]]);
                Ok(DptValue::Float(decode_float16(raw)))
            }
            _ => Err(MonitorError::unknown_main_type()),
        }
    }

    /// Format a decoded value with this subtype's labels and unit.
    pub fn format(&self, value: DptValue) -> String {
        match value {
            DptValue::Bool(b) => {
                if b { self.subtype.upper } else { self.subtype.lower }.to_owned()
            }
            other => {
                if self.subtype.unit.is_empty() {
                    other.to_string()
                } else {
                    format!("{other} {}", self.subtype.unit)
                }
            }
        }
    }

    /// Decode an ASDU straight to its display string.
    pub fn decode_to_string(&self, asdu: &[u8]) -> Result<String> {
        Ok(self.format(self.decode(asdu)?))
    }

    /// Encode a textual value into an ASDU.
    ///
    /// Booleans accept `0`/`1`, `true`/`false`, `on`/`off` and this
    /// subtype's own labels; numeric types parse decimal text.
    ///
    /// # Errors
    ///
    /// Returns an invalid-value error for unparseable text, or an
    /// out-of-range error when the value does not fit the subtype.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let text = text.trim();
        match self.main {
            1 => {
                let value = self.parse_bool(text)?;
                Ok(vec![if value { 0x01 } else { 0x00 }])
            }
            5 => {
                let parsed: u16 = text
                    .parse()
                    .map_err(|_| MonitorError::invalid_dpt_value())?;
                let raw = if self.subtype.id == "5.001" {
                    if parsed > 100 {
                        return Err(MonitorError::dpt_value_out_of_range());
                    }
                    ((parsed * 255) / 100) as u8
                } else {
                    u8::try_from(parsed).map_err(|_| MonitorError::dpt_value_out_of_range())?
                };
                Ok(vec![0x00, raw])
            }
            7 => {
                let value: u16 = text
                    .parse()
                    .map_err(|_| MonitorError::invalid_dpt_value())?;
                let bytes = value.to_be_bytes();
                Ok(vec![0x00, bytes[0], bytes[1]])
            }
            9 => {
                let value: f32 = text
                    .parse()
                    .map_err(|_| MonitorError::invalid_dpt_value())?;
                let raw = encode_float16(value)?;
                let bytes = raw.to_be_bytes();
                Ok(vec![0x00, bytes[0], bytes[1]])
            }
            _ => Err(MonitorError::unknown_main_type()),
        }
    }

    fn parse_bool(&self, text: &str) -> Result<bool> {
        let lowered = text.to_ascii_lowercase();
        if lowered == self.subtype.upper {
            return Ok(true);
        }
        if lowered == self.subtype.lower {
            return Ok(false);
        }
        match lowered.as_str() {
            "1" | "true" | "on" => Ok(true),
            "0" | "false" | "off" => Ok(false),
            _ => Err(MonitorError::invalid_dpt_value()),
        }
    }
}

// =============================================================================
// DPT 9 Float Codec
// =============================================================================

/// Encode an f32 into the KNX 2-byte float format `SEEE EMMM MMMM MMMM`
/// (sign, 4-bit exponent, 11-bit mantissa; value = 0.01 * m * 2^e).
/// Negative mantissas are stored in 11-bit two's complement.
fn encode_float16(value: f32) -> Result<u16> {
    if value == 0.0 {
        return Ok(0);
    }

    let mut exponent = 0u16;
    let mut mantissa = value * 100.0;
    while !(-1024.0..=1023.0).contains(&mantissa) && exponent < 15 {
        exponent += 1;
        mantissa = value * 100.0 / (1u32 << exponent) as f32;
    }
    if !(-1024.0..=1023.0).contains(&mantissa) {
        return Err(MonitorError::dpt_value_out_of_range());
    }
    let mantissa = mantissa.round() as i16;

    let (sign, mantissa_bits) = if mantissa < 0 {
        (1u16 << 15, ((mantissa + 2048) as u16) & 0x07FF)
    } else {
        (0, (mantissa as u16) & 0x07FF)
    };
    Ok(sign | (exponent << 11) | mantissa_bits)
}

/// Decode the KNX 2-byte float format.
fn decode_float16(raw: u16) -> f32 {
    let exponent = ((raw >> 11) & 0x0F) as u32;
    let mantissa_raw = raw & 0x07FF;
    // sign bit set means the 11 mantissa bits are two's complement
    let mantissa = if raw & 0x8000 != 0 {
        (mantissa_raw as i16) - 2048
    } else {
        mantissa_raw as i16
    };
    (0.01 * f32::from(mantissa)) * (1u32 << exponent) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_codes() {
        let t = Translator::resolve(1, "1.001").unwrap();
        assert_eq!(t.dpt_id(), "1.001");
        assert_eq!(t.lower_value(), "off");
        assert_eq!(t.upper_value(), "on");
        assert_eq!(t.unit(), "");

        let t = Translator::resolve(9, "9.001").unwrap();
        assert_eq!(t.unit(), "°C");
    }

    #[test]
    fn resolve_fails_fast_on_unknown_codes() {
        assert!(Translator::resolve(2, "2.001").is_err());
        assert!(Translator::resolve(1, "1.999").is_err());
        assert!(Translator::resolve(9, "5.001").is_err());
    }

    #[test]
    fn bool_decode_and_labels() {
        let t = Translator::resolve(1, "1.001").unwrap();
        assert_eq!(t.decode(&[0x81]).unwrap(), DptValue::Bool(true));
        assert_eq!(t.decode(&[0x80]).unwrap(), DptValue::Bool(false));
        assert_eq!(t.decode_to_string(&[0x81]).unwrap(), "on");
        assert_eq!(t.decode_to_string(&[0x80]).unwrap(), "off");
        assert!(t.decode(&[]).is_err());
    }

    #[test]
    fn bool_encode_accepts_labels_and_literals() {
        let t = Translator::resolve(1, "1.008").unwrap();
        assert_eq!(t.encode("down").unwrap(), vec![0x01]);
        assert_eq!(t.encode("up").unwrap(), vec![0x00]);
        assert_eq!(t.encode("1").unwrap(), vec![0x01]);
        assert_eq!(t.encode("off").unwrap(), vec![0x00]);
        assert!(t.encode("sideways").is_err());
    }

    #[test]
    fn percent_scaling_roundtrip() {
        let t = Translator::resolve(5, "5.001").unwrap();
        let asdu = t.encode("50").unwrap();
        assert_eq!(asdu, vec![0x00, 127]);
        assert_eq!(t.decode(&asdu).unwrap(), DptValue::Percent(50));
        assert_eq!(t.decode_to_string(&asdu).unwrap(), "50 %");
        assert!(t.encode("101").is_err());
    }

    #[test]
    fn counter_is_unscaled() {
        let t = Translator::resolve(5, "5.010").unwrap();
        assert_eq!(t.encode("200").unwrap(), vec![0x00, 200]);
        assert_eq!(t.decode(&[0x80, 200]).unwrap(), DptValue::Unsigned8(200));
        assert!(t.encode("256").is_err());
    }

    #[test]
    fn unsigned16_roundtrip() {
        let t = Translator::resolve(7, "7.001").unwrap();
        let asdu = t.encode("5000").unwrap();
        assert_eq!(asdu, vec![0x00, 0x13, 0x88]);
        assert_eq!(t.decode(&asdu).unwrap(), DptValue::Unsigned16(5000));
    }

    #[test]
    fn float16_temperature_roundtrip() {
        let t = Translator::resolve(9, "9.001").unwrap();
        // 21.5 needs exponent 2, so resolution drops to 0.04
        let asdu = t.encode("21.5").unwrap();
        match t.decode(&asdu).unwrap() {
            DptValue::Float(v) => assert!((v - 21.5).abs() < 0.05),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn float16_wire_vectors() {
        let t = Translator::resolve(9, "9.001").unwrap();
        // 21.6 °C as seen on a live bus: exponent 1, mantissa 1080
        match t.decode(&[0x80, 0x0C, 0x38]).unwrap() {
            DptValue::Float(v) => assert!((v - 21.6).abs() < 0.01),
            other => panic!("expected float, got {other:?}"),
        }
        // published KNX example: 0x0AF0 = 15.04
        match t.decode(&[0x80, 0x0A, 0xF0]).unwrap() {
            DptValue::Float(v) => assert!((v - 15.04).abs() < 0.01),
            other => panic!("expected float, got {other:?}"),
        }
        assert_eq!(t.encode("0").unwrap(), vec![0x00, 0x00, 0x00]);
    }

    #[test]
    fn float16_negative_is_twos_complement() {
        let t = Translator::resolve(9, "9.001").unwrap();
        // -0.01: mantissa -1 stored as 0x7FF with the sign bit set
        assert_eq!(t.encode("-0.01").unwrap(), vec![0x00, 0x87, 0xFF]);
        match t.decode(&[0x80, 0x87, 0xFF]).unwrap() {
            DptValue::Float(v) => assert!((v + 0.01).abs() < 0.001),
            other => panic!("expected float, got {other:?}"),
        }
        // -5.0: mantissa -500 stored as 0x60C
        assert_eq!(t.encode("-5").unwrap(), vec![0x00, 0x86, 0x0C]);
        assert_eq!(t.decode_to_string(&[0x80, 0x86, 0x0C]).unwrap(), "-5 °C");
    }

    #[test]
    fn float16_negative_and_range() {
        let t = Translator::resolve(9, "9.001").unwrap();
        let asdu = t.encode("-10.24").unwrap();
        assert_eq!(asdu, vec![0x00, 0x84, 0x00]);
        match t.decode(&asdu).unwrap() {
            DptValue::Float(v) => assert!((v + 10.24).abs() < 0.02),
            other => panic!("expected float, got {other:?}"),
        }
        assert!(t.encode("700000").is_err());
        assert!(t.encode("not-a-number").is_err());
    }

    #[test]
    fn short_payloads_are_invalid() {
        let t = Translator::resolve(9, "9.001").unwrap();
        assert!(t.decode(&[0x80]).is_err());
        assert!(t.decode(&[0x80, 0x0C]).is_err());
        let t = Translator::resolve(5, "5.001").unwrap();
        assert!(t.decode(&[0x80]).is_err());
    }
}
