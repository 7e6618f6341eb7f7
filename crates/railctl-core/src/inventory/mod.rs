//! Inventory collection
//!
//! Walks the identification registers of each discovered device and builds
//! one [`BoardInfo`] per address. A record is a snapshot: a re-scan builds a
//! fresh [`Inventory`] rather than updating the old one.

mod collector;
mod types;

pub use collector::{collect_board_info, collect_inventory, decode_text, SUPPORTED_INVENTORY_VERSION};
pub use types::{BoardInfo, BoardType, Inventory, InventoryEntry};
