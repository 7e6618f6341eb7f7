//! Emulated layout board
//!
//! Implements the device side of the register protocol: framed reads with
//! register echo and checksum, sequence-numbered writes acknowledged through
//! the write sequence register, and the identification registers.

use railctl_core::frame;
use railctl_core::registers::{self, board_type};
use std::collections::BTreeMap;

/// Identity an emulated board reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardProfile {
    /// Bus address
    pub address: u8,
    /// Inventory structure version
    pub inventory_version: u8,
    /// Board type code
    pub board_type: u8,
    /// Description, at most 16 bytes
    pub description: String,
    /// Hardware version
    pub board_version: u8,
    /// Communication firmware version
    pub comm_version: String,
    /// Inventory firmware version
    pub inventory_sw_version: String,
    /// Application firmware version
    pub app_version: String,
}

impl BoardProfile {
    fn new(address: u8, kind: u8, description: &str, app_version: &str) -> Self {
        Self {
            address,
            inventory_version: 1,
            board_type: kind,
            description: description.to_string(),
            board_version: 2,
            comm_version: "1.3.0".to_string(),
            inventory_sw_version: "1.0.2".to_string(),
            app_version: app_version.to_string(),
        }
    }

    /// Throttle board at 0x08
    pub fn throttle() -> Self {
        Self::new(0x08, board_type::THROTTLE, "Throttle Board", "2.1.0")
    }

    /// Lights board at 0x09
    pub fn lights() -> Self {
        Self::new(0x09, board_type::LIGHTS, "Lights Board", "1.4.3")
    }

    /// Track switch board at 0x0a
    pub fn switches() -> Self {
        Self::new(0x0a, board_type::SWITCHES, "Turnout Board", "1.0.0")
    }

    /// Board with a newer inventory layout this host does not read, at 0x50
    pub fn legacy() -> Self {
        Self {
            inventory_version: 2,
            ..Self::new(0x50, 0, "Future Board", "9.0.0")
        }
    }
}

/// Text register contents, NUL padded to `len`
fn text_field(text: &str, len: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = text.bytes().take(len).collect();
    bytes.resize(len, 0);
    bytes
}

/// One emulated board
#[derive(Debug, Clone)]
pub struct DummyBoard {
    profile: BoardProfile,
    last_sequence: u8,
    lights: BTreeMap<u8, u8>,
    turnouts: BTreeMap<u8, u8>,
    power: [u8; 2],
    direction: [u8; 2],
    momentum: [bool; 2],
    speed: [u8; 2],
    diag_block: [u8; registers::DIAG_BLOCK_LEN],
    writes_applied: u32,
}

/// How much the speed moves per speed read when momentum is on
const MOMENTUM_STEP: u8 = 10;

impl DummyBoard {
    /// Create a board in its power-on state
    pub fn new(profile: BoardProfile) -> Self {
        Self {
            profile,
            last_sequence: 0,
            lights: BTreeMap::new(),
            turnouts: BTreeMap::new(),
            power: [0; 2],
            direction: [0; 2],
            momentum: [false; 2],
            speed: [0; 2],
            diag_block: [0; registers::DIAG_BLOCK_LEN],
            writes_applied: 0,
        }
    }

    /// Identity
    pub fn profile(&self) -> &BoardProfile {
        &self.profile
    }

    /// Sequence number of the last applied write
    pub fn last_sequence(&self) -> u8 {
        self.last_sequence
    }

    /// Number of writes applied
    pub fn writes_applied(&self) -> u32 {
        self.writes_applied
    }

    /// Level last written to a light pin
    pub fn light_level(&self, pin: u8) -> Option<u8> {
        self.lights.get(&pin).copied()
    }

    /// Position last written to a turnout
    pub fn turnout(&self, id: u8) -> Option<u8> {
        self.turnouts.get(&id).copied()
    }

    /// Power setting of a throttle channel
    pub fn power(&self, channel: usize) -> Option<u8> {
        self.power.get(channel).copied()
    }

    /// Direction of a throttle channel (0 forward, 1 reverse)
    pub fn direction(&self, channel: usize) -> Option<u8> {
        self.direction.get(channel).copied()
    }

    /// Contents of the diagnostic block register
    pub fn diag_block(&self) -> &[u8] {
        &self.diag_block
    }

    fn register_data(&mut self, register: u8) -> Option<Vec<u8>> {
        if register == registers::THROTTLE_SPEED && self.profile.board_type == board_type::THROTTLE {
            self.advance_speed();
            return Some(self.speed.to_vec());
        }

        let p = &self.profile;
        let data = match register {
            registers::INVENTORY_VERSION => vec![p.inventory_version],
            registers::BUS_ADDRESS => vec![p.address],
            registers::BOARD_TYPE => vec![p.board_type],
            registers::BOARD_DESCRIPTION => text_field(&p.description, registers::BOARD_DESCRIPTION_LEN),
            registers::BOARD_VERSION => vec![p.board_version],
            registers::COMM_SW_VERSION => text_field(&p.comm_version, registers::COMM_SW_VERSION_LEN),
            registers::INVENTORY_SW_VERSION => {
                text_field(&p.inventory_sw_version, registers::INVENTORY_SW_VERSION_LEN)
            }
            registers::APP_SW_VERSION => text_field(&p.app_version, registers::APP_SW_VERSION_LEN),
            registers::WRITE_SEQUENCE => vec![self.last_sequence],
            registers::DIAG_BLOCK => self.diag_block.to_vec(),
            _ => return None,
        };
        Some(data)
    }

    fn advance_speed(&mut self) {
        for ch in 0..2 {
            let target = self.power[ch];
            self.speed[ch] = if self.momentum[ch] {
                if self.speed[ch] < target {
                    self.speed[ch].saturating_add(MOMENTUM_STEP).min(target)
                } else {
                    self.speed[ch].saturating_sub(MOMENTUM_STEP).max(target)
                }
            } else {
                target
            };
        }
    }

    /// Answer a block read of `len` bytes
    ///
    /// Returns `None` (no acknowledge) for registers the board does not
    /// implement. The master clocks exactly `len` bytes, so a short frame is
    /// padded with idle-bus `0xFF` and a long one is cut off.
    pub fn read(&mut self, register: u8, len: usize) -> Option<Vec<u8>> {
        let mut bytes = if register == registers::LOOPBACK {
            vec![self.last_sequence, 0]
        } else {
            let data = self.register_data(register)?;
            frame::encode_read_response(register, &data)
        };
        bytes.resize(len, 0xFF);
        Some(bytes)
    }

    /// Accept a block write
    ///
    /// Blocks with a bad checksum, and writes to read-only registers, are
    /// acknowledged on the bus but not applied.
    pub fn write(&mut self, register: u8, block: &[u8]) {
        if block.len() < 2 || !frame::validate_write(register, block) {
            log::debug!(
                "dummy: 0x{:02x} dropped write to register {} (bad frame)",
                self.profile.address,
                register
            );
            return;
        }
        let sequence = block[0];
        let data = &block[1..block.len() - 1];

        let applied = match (register, data) {
            (registers::LIGHT_POWER_LEVEL, &[pin, level]) => {
                self.lights.insert(pin, level);
                true
            }
            (registers::TURNOUT_POSITION, &[id, position]) => {
                self.turnouts.insert(id, position);
                true
            }
            (registers::THROTTLE_POWER, &[ch, value]) if ch < 2 => {
                self.power[usize::from(ch)] = value;
                true
            }
            (registers::THROTTLE_DIRECTION, &[ch, value]) if ch < 2 => {
                self.direction[usize::from(ch)] = value;
                true
            }
            (registers::THROTTLE_MOMENTUM, &[ch, value]) if ch < 2 => {
                self.momentum[usize::from(ch)] = value != 0;
                true
            }
            (registers::DIAG_BLOCK, data) if data.len() <= registers::DIAG_BLOCK_LEN => {
                self.diag_block = [0; registers::DIAG_BLOCK_LEN];
                self.diag_block[..data.len()].copy_from_slice(data);
                true
            }
            _ => false,
        };

        if applied {
            self.last_sequence = sequence;
            self.writes_applied += 1;
        } else {
            log::debug!(
                "dummy: 0x{:02x} ignored write to register {}",
                self.profile.address,
                register
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railctl_core::checksum;

    #[test]
    fn test_read_is_framed() {
        let mut board = DummyBoard::new(BoardProfile::lights());
        let bytes = board.read(registers::BOARD_TYPE, 3).unwrap();
        assert_eq!(&bytes[..2], &[registers::BOARD_TYPE, board_type::LIGHTS]);
        assert!(checksum::validate(&bytes));
    }

    #[test]
    fn test_unknown_register_not_acknowledged() {
        let mut board = DummyBoard::new(BoardProfile::lights());
        assert!(board.read(77, 3).is_none());
        assert!(board.read(registers::THROTTLE_SPEED, 4).is_none());
    }

    #[test]
    fn test_sequenced_write_updates_confirmation() {
        let mut board = DummyBoard::new(BoardProfile::lights());
        let block = frame::encode_write(registers::LIGHT_POWER_LEVEL, 42, &[3, 80]).unwrap();
        board.write(registers::LIGHT_POWER_LEVEL, &block);
        assert_eq!(board.light_level(3), Some(80));
        assert_eq!(board.last_sequence(), 42);
    }

    #[test]
    fn test_bad_checksum_not_applied() {
        let mut board = DummyBoard::new(BoardProfile::lights());
        let mut block = frame::encode_write(registers::LIGHT_POWER_LEVEL, 7, &[3, 80]).unwrap();
        block[2] = 81;
        board.write(registers::LIGHT_POWER_LEVEL, &block);
        assert_eq!(board.light_level(3), None);
        assert_eq!(board.last_sequence(), 0);
    }

    #[test]
    fn test_momentum_ramps_speed() {
        let mut board = DummyBoard::new(BoardProfile::throttle());
        let write = |board: &mut DummyBoard, reg, seq, data: &[u8]| {
            let block = frame::encode_write(reg, seq, data).unwrap();
            board.write(reg, &block);
        };
        write(&mut board, registers::THROTTLE_MOMENTUM, 1, &[0, 1]);
        write(&mut board, registers::THROTTLE_POWER, 2, &[0, 25]);

        let speeds: Vec<u8> = (0..4)
            .map(|_| board.read(registers::THROTTLE_SPEED, 4).unwrap()[1])
            .collect();
        assert_eq!(speeds, vec![10, 20, 25, 25]);
    }
}
