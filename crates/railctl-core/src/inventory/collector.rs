//! Inventory collector

use super::types::{BoardInfo, BoardType, Inventory, InventoryEntry};
use crate::access::RegisterAccess;
use crate::bus::DeviceAddress;
use crate::registers;

/// The only inventory structure version this host understands
pub const SUPPORTED_INVENTORY_VERSION: u8 = 1;

/// Decode a fixed-length text field
///
/// Keeps printable ASCII (32..=126) and drops everything else, which takes
/// care of NUL padding. Surrounding blanks are trimmed.
pub fn decode_text(bytes: &[u8]) -> String {
    let text: String = bytes
        .iter()
        .filter(|b| (32..=126).contains(*b))
        .map(|&b| b as char)
        .collect();
    text.trim().to_string()
}

fn read_u8<A: RegisterAccess + ?Sized>(
    access: &mut A,
    address: DeviceAddress,
    register: u8,
    len: usize,
) -> Option<u8> {
    match access.read_register(address, register, len) {
        Ok(frame) => frame.first(),
        Err(e) => {
            log::warn!("inventory: {}", e);
            None
        }
    }
}

fn read_text<A: RegisterAccess + ?Sized>(
    access: &mut A,
    address: DeviceAddress,
    register: u8,
    len: usize,
) -> Option<String> {
    match access.read_register(address, register, len) {
        Ok(frame) => Some(decode_text(&frame.payload)),
        Err(e) => {
            log::warn!("inventory: {}", e);
            None
        }
    }
}

/// Read the identification registers of one device
///
/// The inventory version is read first. If it cannot be read, or is not
/// [`SUPPORTED_INVENTORY_VERSION`], nothing else is read and the default
/// record is returned. Otherwise every field is read in register order; a
/// field that cannot be read keeps its default.
pub fn collect_board_info<A: RegisterAccess + ?Sized>(access: &mut A, address: DeviceAddress) -> BoardInfo {
    let mut info = BoardInfo::default();

    match read_u8(access, address, registers::INVENTORY_VERSION, registers::INVENTORY_VERSION_LEN) {
        Some(SUPPORTED_INVENTORY_VERSION) => info.inventory_version = SUPPORTED_INVENTORY_VERSION,
        Some(version) => {
            log::info!("{}: inventory version {} not supported, skipping", address, version);
            return info;
        }
        None => {
            log::info!("{}: no inventory version, skipping", address);
            return info;
        }
    }

    if let Some(v) = read_u8(access, address, registers::BUS_ADDRESS, registers::BUS_ADDRESS_LEN) {
        info.bus_address = v;
    }
    if let Some(v) = read_u8(access, address, registers::BOARD_TYPE, registers::BOARD_TYPE_LEN) {
        info.board_type = BoardType::from_code(v);
    }
    if let Some(v) = read_text(
        access,
        address,
        registers::BOARD_DESCRIPTION,
        registers::BOARD_DESCRIPTION_LEN,
    ) {
        info.description = v;
    }
    if let Some(v) = read_u8(access, address, registers::BOARD_VERSION, registers::BOARD_VERSION_LEN) {
        info.board_version = v;
    }
    if let Some(v) = read_text(
        access,
        address,
        registers::COMM_SW_VERSION,
        registers::COMM_SW_VERSION_LEN,
    ) {
        info.comm_version = v;
    }
    if let Some(v) = read_text(
        access,
        address,
        registers::INVENTORY_SW_VERSION,
        registers::INVENTORY_SW_VERSION_LEN,
    ) {
        info.inventory_sw_version = v;
    }
    if let Some(v) = read_text(
        access,
        address,
        registers::APP_SW_VERSION,
        registers::APP_SW_VERSION_LEN,
    ) {
        info.app_version = v;
    }

    log::debug!("{}: {:?}", address, info);
    info
}

/// Collect a record for every address, in the order given
pub fn collect_inventory<A: RegisterAccess + ?Sized>(access: &mut A, addresses: &[DeviceAddress]) -> Inventory {
    let boards = addresses
        .iter()
        .map(|&address| InventoryEntry {
            address,
            info: collect_board_info(access, address),
        })
        .collect();
    Inventory::new(boards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;
    use crate::protocol::transport::tests::{addr, Reply, ScriptedBus};
    use crate::session::BusSession;

    fn padded(text: &str, len: usize) -> Vec<u8> {
        let mut bytes = text.as_bytes().to_vec();
        bytes.resize(len, 0);
        bytes
    }

    fn full_record() -> ScriptedBus {
        ScriptedBus::default()
            .frame(registers::INVENTORY_VERSION, &[1])
            .frame(registers::BUS_ADDRESS, &[0x09])
            .frame(registers::BOARD_TYPE, &[2])
            .frame(registers::BOARD_DESCRIPTION, &padded("Lights", 16))
            .frame(registers::BOARD_VERSION, &[3])
            .frame(registers::COMM_SW_VERSION, &padded("1.2.0", 9))
            .frame(registers::INVENTORY_SW_VERSION, &padded("1.0.1", 9))
            .frame(registers::APP_SW_VERSION, &padded("2.4.7", 9))
    }

    #[test]
    fn test_full_record() {
        let mut session = BusSession::new(full_record());
        let info = collect_board_info(&mut session, addr(0x09));

        assert_eq!(
            info,
            BoardInfo {
                inventory_version: 1,
                bus_address: 0x09,
                board_type: BoardType::Lights,
                description: "Lights".into(),
                board_version: 3,
                comm_version: "1.2.0".into(),
                inventory_sw_version: "1.0.1".into(),
                app_version: "2.4.7".into(),
            }
        );

        let registers_read: Vec<u8> = session
            .transport()
            .bus()
            .read_log
            .iter()
            .map(|&(_, reg, _)| reg)
            .collect();
        assert_eq!(registers_read, vec![0, 1, 2, 3, 4, 10, 11, 20]);

        let lengths: Vec<usize> = session
            .transport()
            .bus()
            .read_log
            .iter()
            .map(|&(_, _, len)| len)
            .collect();
        assert_eq!(
            lengths,
            vec![
                frame::read_frame_len(registers::INVENTORY_VERSION_LEN),
                frame::read_frame_len(registers::BUS_ADDRESS_LEN),
                frame::read_frame_len(registers::BOARD_TYPE_LEN),
                frame::read_frame_len(registers::BOARD_DESCRIPTION_LEN),
                frame::read_frame_len(registers::BOARD_VERSION_LEN),
                frame::read_frame_len(registers::COMM_SW_VERSION_LEN),
                frame::read_frame_len(registers::INVENTORY_SW_VERSION_LEN),
                frame::read_frame_len(registers::APP_SW_VERSION_LEN),
            ]
        );
    }

    #[test]
    fn test_unsupported_version_reads_nothing_else() {
        let bus = ScriptedBus::default().frame(registers::INVENTORY_VERSION, &[2]);
        let mut session = BusSession::new(bus);

        let info = collect_board_info(&mut session, addr(0x50));
        assert_eq!(info, BoardInfo::default());
        assert!(info.is_unknown());
        assert_eq!(session.transport().bus().read_log.len(), 1);
    }

    #[test]
    fn test_missing_version_reads_nothing_else() {
        let mut session = BusSession::new(ScriptedBus::default());
        let info = collect_board_info(&mut session, addr(0x50));
        assert!(info.is_unknown());
        // Only the version register, with its full retry budget
        assert_eq!(session.transport().bus().read_log.len(), 4);
    }

    #[test]
    fn test_failed_field_keeps_default() {
        let bus = ScriptedBus::default()
            .frame(registers::INVENTORY_VERSION, &[1])
            .frame(registers::BUS_ADDRESS, &[0x08])
            .frame(registers::BOARD_TYPE, &[1])
            .reply(Reply::Io)
            .reply(Reply::Io)
            .reply(Reply::Io)
            .reply(Reply::Io)
            .frame(registers::BOARD_VERSION, &[1])
            .frame(registers::COMM_SW_VERSION, &padded("1.0.0", 9))
            .frame(registers::INVENTORY_SW_VERSION, &padded("1.0.0", 9))
            .frame(registers::APP_SW_VERSION, &padded("0.9.0", 9));
        let mut session = BusSession::new(bus);

        let info = collect_board_info(&mut session, addr(0x08));
        assert_eq!(info.board_type, BoardType::Throttle);
        assert_eq!(info.description, "");
        assert_eq!(info.board_version, 1);
        assert_eq!(info.app_version, "0.9.0");
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(b"Throttle\0\0\0\0"), "Throttle");
        assert_eq!(decode_text(&[b'A', 127, 128, 200, b'B', 31]), "AB");
        assert_eq!(decode_text(b"  v1.0   "), "v1.0");
        assert_eq!(decode_text(&[]), "");
    }

    #[test]
    fn test_collect_inventory_keeps_scan_order() {
        let bus = ScriptedBus::default().frame(registers::INVENTORY_VERSION, &[2]);
        let mut session = BusSession::new(bus);
        // Second device never answers at all
        let inventory = collect_inventory(&mut session, &[addr(0x50), addr(0x51)]);
        let addresses: Vec<u8> = inventory.iter().map(|e| e.address.get()).collect();
        assert_eq!(addresses, vec![0x50, 0x51]);
        assert!(inventory.iter().all(|e| e.info.is_unknown()));
    }
}
