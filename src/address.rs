//! KNX addressing.
//!
//! Group addresses identify shared datapoints on the bus and come in 3-level
//! (`main/middle/sub`) and 2-level (`main/sub`) notation. Individual
//! addresses identify physical devices (`area.line.device`). Both are 16-bit
//! values on the wire.

use crate::error::{MonitorError, Result};
use core::fmt;

/// KNX group address.
///
/// Internally a 16-bit value: main 5 bits, middle 3 bits, sub 8 bits
/// (or sub 11 bits in 2-level notation).
///
/// # Examples
///
/// ```
/// use knx_monitor::GroupAddress;
///
/// let addr = GroupAddress::new(1, 2, 3)?;
/// assert_eq!(addr.to_string(), "1/2/3");
///
/// // Parsing auto-detects the notation.
/// let addr: GroupAddress = "1/234".parse()?;
/// assert_eq!(addr.main(), 1);
/// assert_eq!(addr.sub_2level(), 234);
/// # Ok::<(), knx_monitor::MonitorError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupAddress {
    raw: u16,
}

impl GroupAddress {
    /// Maximum main group value (5 bits)
    pub const MAX_MAIN: u8 = 31;
    /// Maximum middle group value (3 bits)
    pub const MAX_MIDDLE: u8 = 7;
    /// Maximum sub value in 2-level notation (11 bits)
    pub const MAX_SUB_2LEVEL: u16 = 2047;

    /// Create a 3-level group address.
    ///
    /// # Errors
    ///
    /// Returns an out-of-range error if `main > 31` or `middle > 7`.
    pub fn new(main: u8, middle: u8, sub: u8) -> Result<Self> {
        if main > Self::MAX_MAIN || middle > Self::MAX_MIDDLE {
            return Err(MonitorError::address_out_of_range());
        }
        let raw = (u16::from(main) << 11) | (u16::from(middle) << 8) | u16::from(sub);
        Ok(Self { raw })
    }

    /// Create a 2-level group address (`main/sub`).
    ///
    /// # Errors
    ///
    /// Returns an out-of-range error if `main > 31` or `sub > 2047`.
    pub fn new_2level(main: u8, sub: u16) -> Result<Self> {
        if main > Self::MAX_MAIN || sub > Self::MAX_SUB_2LEVEL {
            return Err(MonitorError::address_out_of_range());
        }
        let raw = (u16::from(main) << 11) | sub;
        Ok(Self { raw })
    }

    /// Raw 16-bit representation.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Main group (0-31).
    #[inline]
    pub const fn main(self) -> u8 {
        ((self.raw >> 11) & 0x1F) as u8
    }

    /// Middle group in 3-level notation (0-7).
    #[inline]
    pub const fn middle(self) -> u8 {
        ((self.raw >> 8) & 0x07) as u8
    }

    /// Sub group in 3-level notation (0-255).
    #[inline]
    pub const fn sub(self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Sub group in 2-level notation (0-2047).
    #[inline]
    pub const fn sub_2level(self) -> u16 {
        self.raw & 0x07FF
    }
}

impl From<u16> for GroupAddress {
    #[inline]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<GroupAddress> for u16 {
    #[inline]
    fn from(addr: GroupAddress) -> u16 {
        addr.raw
    }
}

impl fmt::Display for GroupAddress {
    /// 3-level notation by default.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

impl core::str::FromStr for GroupAddress {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('/');

        let main = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(MonitorError::invalid_group_address)?;
        let second = parts
            .next()
            .and_then(|p| p.parse::<u16>().ok())
            .ok_or_else(MonitorError::invalid_group_address)?;

        match parts.next() {
            Some(sub_str) => {
                // 3-level: main/middle/sub
                let sub = sub_str
                    .parse::<u8>()
                    .map_err(|_| MonitorError::invalid_group_address())?;
                if parts.next().is_some() || second > u16::from(u8::MAX) {
                    return Err(MonitorError::invalid_group_address());
                }
                Self::new(main, second as u8, sub)
            }
            // 2-level: main/sub
            None => Self::new_2level(main, second),
        }
    }
}

/// KNX individual (physical) address, `area.line.device`.
///
/// Internally 16 bits: area 4 bits, line 4 bits, device 8 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndividualAddress {
    raw: u16,
}

impl IndividualAddress {
    /// Maximum area value (4 bits)
    pub const MAX_AREA: u8 = 15;
    /// Maximum line value (4 bits)
    pub const MAX_LINE: u8 = 15;

    /// Create an individual address.
    ///
    /// # Errors
    ///
    /// Returns an out-of-range error if `area > 15` or `line > 15`.
    pub fn new(area: u8, line: u8, device: u8) -> Result<Self> {
        if area > Self::MAX_AREA || line > Self::MAX_LINE {
            return Err(MonitorError::address_out_of_range());
        }
        let raw = (u16::from(area) << 12) | (u16::from(line) << 8) | u16::from(device);
        Ok(Self { raw })
    }

    /// Raw 16-bit representation.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Area (0-15).
    #[inline]
    pub const fn area(self) -> u8 {
        ((self.raw >> 12) & 0x0F) as u8
    }

    /// Line (0-15).
    #[inline]
    pub const fn line(self) -> u8 {
        ((self.raw >> 8) & 0x0F) as u8
    }

    /// Device (0-255).
    #[inline]
    pub const fn device(self) -> u8 {
        (self.raw & 0xFF) as u8
    }
}

impl From<u16> for IndividualAddress {
    #[inline]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<IndividualAddress> for u16 {
    #[inline]
    fn from(addr: IndividualAddress) -> u16 {
        addr.raw
    }
}

impl fmt::Display for IndividualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.area(), self.line(), self.device())
    }
}

impl core::str::FromStr for IndividualAddress {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('.');
        let area = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(MonitorError::invalid_individual_address)?;
        let line = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(MonitorError::invalid_individual_address)?;
        let device = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(MonitorError::invalid_individual_address)?;
        if parts.next().is_some() {
            return Err(MonitorError::invalid_individual_address());
        }
        Self::new(area, line, device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_3level_roundtrip() {
        let addr = GroupAddress::new(1, 2, 3).unwrap();
        assert_eq!(addr.main(), 1);
        assert_eq!(addr.middle(), 2);
        assert_eq!(addr.sub(), 3);
        assert_eq!(addr.raw(), 0x0A03);
        assert_eq!(addr.to_string(), "1/2/3");
        assert_eq!("1/2/3".parse::<GroupAddress>().unwrap(), addr);
    }

    #[test]
    fn group_2level_roundtrip() {
        let addr = GroupAddress::new_2level(1, 234).unwrap();
        assert_eq!(addr.main(), 1);
        assert_eq!(addr.sub_2level(), 234);
        assert_eq!("1/234".parse::<GroupAddress>().unwrap(), addr);
    }

    #[test]
    fn group_out_of_range() {
        assert!(GroupAddress::new(32, 0, 0).is_err());
        assert!(GroupAddress::new(0, 8, 0).is_err());
        assert!(GroupAddress::new_2level(0, 2048).is_err());
    }

    #[test]
    fn group_parse_invalid() {
        for bad in ["", "1", "a/b/c", "1/2/3/4", "32/0/0", "1/2048", "1/300/0"] {
            assert!(bad.parse::<GroupAddress>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn individual_roundtrip() {
        let addr = IndividualAddress::new(1, 1, 250).unwrap();
        assert_eq!(addr.to_string(), "1.1.250");
        assert_eq!("1.1.250".parse::<IndividualAddress>().unwrap(), addr);
        assert_eq!(addr.area(), 1);
        assert_eq!(addr.line(), 1);
        assert_eq!(addr.device(), 250);
    }

    #[test]
    fn individual_parse_invalid() {
        for bad in ["", "1.1", "16.0.0", "0.16.0", "1.1.1.1", "x.y.z"] {
            assert!(bad.parse::<IndividualAddress>().is_err(), "accepted {bad:?}");
        }
    }
}
