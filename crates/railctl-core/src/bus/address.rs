//! 7-bit bus addresses

use core::fmt;
use core::str::FromStr;
use serde::Serialize;

/// A 7-bit I2C device address
///
/// Addresses are discovered by scanning the bus, never assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct DeviceAddress(u8);

impl DeviceAddress {
    /// Highest valid 7-bit address
    pub const MAX: u8 = 0x7F;

    /// Create an address, rejecting values outside the 7-bit range
    pub const fn new(raw: u8) -> Option<Self> {
        if raw <= Self::MAX {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Raw address value
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Parse a bare two-digit hex token as printed by `i2cdetect` (e.g. `"1a"`)
    pub fn from_hex_token(token: &str) -> Option<Self> {
        if token.len() != 2 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u8::from_str_radix(token, 16).ok().and_then(Self::new)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl FromStr for DeviceAddress {
    type Err = String;

    /// Accepts `0x1a`, `0X1A` or decimal `26`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let raw = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u8::from_str_radix(hex, 16).map_err(|e| format!("invalid hex address: {}", e))?
        } else {
            s.parse::<u8>()
                .map_err(|e| format!("invalid address: {}", e))?
        };
        Self::new(raw).ok_or_else(|| format!("address 0x{:02x} is outside the 7-bit range", raw))
    }
}

impl TryFrom<u8> for DeviceAddress {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| format!("address 0x{:02x} is outside the 7-bit range", raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!("0x08".parse::<DeviceAddress>().unwrap().get(), 8);
        assert_eq!("0X1A".parse::<DeviceAddress>().unwrap().get(), 0x1a);
        assert_eq!("26".parse::<DeviceAddress>().unwrap().get(), 26);
        assert!("0x80".parse::<DeviceAddress>().is_err());
        assert!("zz".parse::<DeviceAddress>().is_err());
    }

    #[test]
    fn test_hex_token() {
        assert_eq!(DeviceAddress::from_hex_token("1a").map(|a| a.get()), Some(0x1a));
        assert_eq!(DeviceAddress::from_hex_token("--"), None);
        assert_eq!(DeviceAddress::from_hex_token("UU"), None);
        assert_eq!(DeviceAddress::from_hex_token("100"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(DeviceAddress::new(0x09).unwrap().to_string(), "0x09");
    }
}
