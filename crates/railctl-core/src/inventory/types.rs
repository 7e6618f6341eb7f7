//! Inventory record types

use crate::bus::DeviceAddress;
use crate::registers::board_type;
use core::fmt;
use serde::{Serialize, Serializer};

/// Board type as reported by the board type register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoardType {
    /// Not read, or the device was skipped
    #[default]
    Unknown,
    /// Locomotive throttle board
    Throttle,
    /// Lighting board
    Lights,
    /// Track switch board
    Switches,
    /// A code this host does not know
    Other(u8),
}

impl BoardType {
    /// Map a raw board type code
    pub fn from_code(code: u8) -> Self {
        match code {
            board_type::THROTTLE => Self::Throttle,
            board_type::LIGHTS => Self::Lights,
            board_type::SWITCHES => Self::Switches,
            other => Self::Other(other),
        }
    }

    /// Parse a board type name as used on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "throttle" => Some(Self::Throttle),
            "lights" => Some(Self::Lights),
            "switches" | "turnouts" => Some(Self::Switches),
            _ => None,
        }
    }
}

impl fmt::Display for BoardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Throttle => write!(f, "throttle"),
            Self::Lights => write!(f, "lights"),
            Self::Switches => write!(f, "switches"),
            Self::Other(code) => write!(f, "type {}", code),
        }
    }
}

impl Serialize for BoardType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Identification data for one board
///
/// Every field has a neutral default. A field whose register could not be
/// read keeps its default; a device with an unrecognised inventory version
/// is left entirely at defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardInfo {
    /// Inventory structure version
    pub inventory_version: u8,
    /// Bus address as configured in firmware
    pub bus_address: u8,
    /// Board type
    pub board_type: BoardType,
    /// Free-text description
    pub description: String,
    /// Hardware version
    pub board_version: u8,
    /// Communication-layer firmware version
    pub comm_version: String,
    /// Inventory-layer firmware version
    pub inventory_sw_version: String,
    /// Application firmware version
    pub app_version: String,
}

impl BoardInfo {
    /// Whether this is the all-default record of a skipped device
    pub fn is_unknown(&self) -> bool {
        *self == Self::default()
    }
}

/// A discovered address paired with what it reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    /// Address the device answered on during the scan
    pub address: DeviceAddress,
    /// Identification record
    pub info: BoardInfo,
}

/// Result of one discovery cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    boards: Vec<InventoryEntry>,
}

impl Inventory {
    /// Build an inventory from entries in scan order
    pub fn new(boards: Vec<InventoryEntry>) -> Self {
        Self { boards }
    }

    /// Entries in scan order
    pub fn iter(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.boards.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// Whether nothing was discovered
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// First entry of the given board type
    pub fn first_of(&self, kind: BoardType) -> Option<&InventoryEntry> {
        self.boards.iter().find(|e| e.info.board_type == kind)
    }

    /// Addresses of every board of the given type
    pub fn addresses_of(&self, kind: BoardType) -> Vec<DeviceAddress> {
        self.boards
            .iter()
            .filter(|e| e.info.board_type == kind)
            .map(|e| e.address)
            .collect()
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a InventoryEntry;
    type IntoIter = std::slice::Iter<'a, InventoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.boards.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_type_codes() {
        assert_eq!(BoardType::from_code(1), BoardType::Throttle);
        assert_eq!(BoardType::from_code(2), BoardType::Lights);
        assert_eq!(BoardType::from_code(3), BoardType::Switches);
        assert_eq!(BoardType::from_code(9), BoardType::Other(9));
        assert_eq!(BoardType::Other(9).to_string(), "type 9");
    }

    #[test]
    fn test_first_of() {
        let entry = |raw, kind| InventoryEntry {
            address: DeviceAddress::new(raw).unwrap(),
            info: BoardInfo {
                board_type: kind,
                ..Default::default()
            },
        };
        let inventory = Inventory::new(vec![
            entry(0x08, BoardType::Throttle),
            entry(0x09, BoardType::Lights),
            entry(0x0b, BoardType::Lights),
        ]);
        assert_eq!(inventory.first_of(BoardType::Lights).unwrap().address.get(), 0x09);
        assert_eq!(inventory.addresses_of(BoardType::Lights).len(), 2);
        assert!(inventory.first_of(BoardType::Switches).is_none());
    }

    #[test]
    fn test_serializes_to_toml() {
        let inventory = Inventory::new(vec![InventoryEntry {
            address: DeviceAddress::new(0x09).unwrap(),
            info: BoardInfo {
                inventory_version: 1,
                board_type: BoardType::Lights,
                description: "Lights".into(),
                ..Default::default()
            },
        }]);
        let text = toml::to_string(&inventory).unwrap();
        assert!(text.contains("[[boards]]"));
        assert!(text.contains("address = 9"));
        assert!(text.contains("board_type = \"lights\""));
    }
}
