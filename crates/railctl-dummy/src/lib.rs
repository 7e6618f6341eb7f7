//! railctl-dummy - Simulated layout bus for testing
//!
//! This crate provides a bus backend populated with emulated boards that
//! speak the device side of the register protocol. It is useful for testing
//! and for trying the CLI without hardware.
//!
//! Faults can be injected deterministically: with `fault_every = n`, every
//! n-th bus transaction goes wrong, cycling through the fault kinds a noisy
//! bus produces.

pub mod board;

pub use board::{BoardProfile, DummyBoard};

use railctl_core::bus::{BusFeatures, DeviceAddress, RegisterBus};
use railctl_core::checksum;
use railctl_core::error::{Error, Result};
use std::collections::BTreeMap;
use std::io;

/// First address `i2cdetect` probes by default
const DETECT_FIRST: u8 = 0x03;
/// Last address `i2cdetect` probes by default
const DETECT_LAST: u8 = 0x77;

/// Configuration for the dummy bus
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Boards on the bus
    pub boards: Vec<BoardProfile>,
    /// Inject a fault every n-th transaction (0 disables faults)
    pub fault_every: u32,
    /// Make the bus scan fail
    pub detect_fails: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            boards: vec![
                BoardProfile::throttle(),
                BoardProfile::lights(),
                BoardProfile::switches(),
                BoardProfile::legacy(),
            ],
            fault_every: 0,
            detect_fails: false,
        }
    }
}

/// Read-side fault kinds, injected in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadFault {
    Nack,
    Corrupt,
    Truncate,
    WrongEcho,
}

const READ_FAULTS: [ReadFault; 4] = [
    ReadFault::Nack,
    ReadFault::Corrupt,
    ReadFault::Truncate,
    ReadFault::WrongEcho,
];

/// Deterministic fault schedule
#[derive(Debug, Clone, Default)]
struct FaultPlan {
    every: u32,
    transactions: u64,
    injected: u64,
}

impl FaultPlan {
    /// Count one transaction; returns the fault ordinal if it must fail
    fn tick(&mut self) -> Option<u64> {
        self.transactions += 1;
        if self.every == 0 || self.transactions % u64::from(self.every) != 0 {
            return None;
        }
        let n = self.injected;
        self.injected += 1;
        Some(n)
    }
}

/// Simulated layout bus
pub struct DummyBus {
    boards: BTreeMap<u8, DummyBoard>,
    faults: FaultPlan,
    detect_fails: bool,
    elapsed_us: u64,
}

impl DummyBus {
    /// Create a bus with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let boards = config
            .boards
            .into_iter()
            .map(|p| (p.address, DummyBoard::new(p)))
            .collect();
        Self {
            boards,
            faults: FaultPlan {
                every: config.fault_every,
                ..Default::default()
            },
            detect_fails: config.detect_fails,
            elapsed_us: 0,
        }
    }

    /// Create a bus with the default layout and no faults
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Emulated board at `address`
    pub fn board(&self, address: u8) -> Option<&DummyBoard> {
        self.boards.get(&address)
    }

    /// Number of transactions seen
    pub fn transactions(&self) -> u64 {
        self.faults.transactions
    }

    /// Number of faults injected
    pub fn faults_injected(&self) -> u64 {
        self.faults.injected
    }

    /// Total time spent in delays, in microseconds
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    fn nack(address: DeviceAddress, what: &str) -> Error {
        Error::BusIo {
            address,
            source: io::Error::new(io::ErrorKind::Other, what.to_string()),
        }
    }
}

impl RegisterBus for DummyBus {
    fn features(&self) -> BusFeatures {
        BusFeatures::FULL
    }

    fn read_block(&mut self, address: DeviceAddress, register: u8, len: usize) -> Result<Vec<u8>> {
        let fault = self.faults.tick();
        let board = self
            .boards
            .get_mut(&address.get())
            .ok_or_else(|| Self::nack(address, "no device"))?;
        let mut bytes = board
            .read(register, len)
            .ok_or_else(|| Self::nack(address, "register not acknowledged"))?;

        if let Some(n) = fault {
            let kind = READ_FAULTS[(n % READ_FAULTS.len() as u64) as usize];
            log::debug!("dummy: injecting {:?} on {} register {}", kind, address, register);
            match kind {
                ReadFault::Nack => return Err(Self::nack(address, "injected NACK")),
                ReadFault::Corrupt => {
                    if let Some(last) = bytes.last_mut() {
                        *last ^= 0x5A;
                    }
                }
                ReadFault::Truncate => {
                    bytes.pop();
                }
                ReadFault::WrongEcho => {
                    if !bytes.is_empty() {
                        bytes[0] = bytes[0].wrapping_add(1);
                        let end = bytes.len() - 1;
                        bytes[end] = 0;
                        bytes[end] = checksum::sum(&bytes).wrapping_neg();
                    }
                }
            }
        }
        Ok(bytes)
    }

    fn write_block(&mut self, address: DeviceAddress, register: u8, data: &[u8]) -> Result<()> {
        let fault = self.faults.tick();
        let board = self
            .boards
            .get_mut(&address.get())
            .ok_or_else(|| Self::nack(address, "no device"))?;

        match fault {
            // Alternate between a NACK and a write lost after the ACK
            Some(n) if n % 2 == 0 => Err(Self::nack(address, "injected NACK")),
            Some(_) => {
                log::debug!("dummy: dropping write to {} register {}", address, register);
                Ok(())
            }
            None => {
                board.write(register, data);
                Ok(())
            }
        }
    }

    fn detect(&mut self) -> Result<String> {
        if self.detect_fails {
            return Err(Error::ProbeFailed("dummy: scan disabled".into()));
        }
        Ok(render_detect_grid(self.boards.keys().copied()))
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += u64::from(us);
    }
}

/// Render addresses as `i2cdetect -y` would print them
pub fn render_detect_grid(present: impl IntoIterator<Item = u8>) -> String {
    let present: Vec<u8> = present.into_iter().collect();
    let mut out = String::from("   ");
    for col in 0..16 {
        out.push_str(&format!("  {:x}", col));
    }
    out.push('\n');

    for row in (0u8..0x80).step_by(16) {
        out.push_str(&format!("{:02x}:", row));
        for col in 0..16u8 {
            let address = row + col;
            if !(DETECT_FIRST..=DETECT_LAST).contains(&address) {
                out.push_str("   ");
            } else if present.contains(&address) {
                out.push_str(&format!(" {:02x}", address));
            } else {
                out.push_str(" --");
            }
        }
        out.push('\n');
    }
    out
}

/// Parse bus options from a list of key-value pairs
///
/// - `faults=<n>` - inject a fault every n-th transaction
/// - `boards=<kind>+<kind>...` - boards to attach: `throttle`, `lights`,
///   `switches`, `legacy`
/// - `scan=fail` - make the bus scan fail
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "faults" => {
                config.fault_every = value
                    .parse()
                    .map_err(|_| format!("Invalid faults value: {}", value))?;
            }
            "boards" => {
                let mut boards: Vec<BoardProfile> = Vec::new();
                for kind in value.split('+').map(str::trim).filter(|k| !k.is_empty()) {
                    let profile = match kind {
                        "throttle" => BoardProfile::throttle(),
                        "lights" => BoardProfile::lights(),
                        "switches" => BoardProfile::switches(),
                        "legacy" => BoardProfile::legacy(),
                        other => return Err(format!("Unknown board kind: {}", other)),
                    };
                    if boards.iter().any(|b| b.address == profile.address) {
                        return Err(format!("Board kind listed twice: {}", kind));
                    }
                    boards.push(profile);
                }
                config.boards = boards;
            }
            "scan" => {
                config.detect_fails = *value == "fail";
            }
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

/// Open a dummy bus and return a boxed RegisterBus
pub fn open_dummy(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn RegisterBus + Send>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    log::info!(
        "dummy: {} board(s), fault every {} transaction(s)",
        config.boards.len(),
        config.fault_every
    );
    Ok(Box::new(DummyBus::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use railctl_core::access::RegisterAccess;
    use railctl_core::diag::{self, RunControl};
    use railctl_core::inventory::{self, BoardType};
    use railctl_core::lights::{Levels, LightsConfig, LightsPanel, SwitchKind, SwitchSpec};
    use railctl_core::registers;
    use railctl_core::scan;
    use railctl_core::session::BusSession;
    use railctl_core::throttle::{Channel, Throttle};

    fn addr(raw: u8) -> DeviceAddress {
        DeviceAddress::new(raw).unwrap()
    }

    fn faulty(every: u32) -> BusSession<DummyBus> {
        BusSession::new(DummyBus::new(DummyConfig {
            fault_every: every,
            ..Default::default()
        }))
    }

    #[test]
    fn test_grid_round_trips_through_parser() {
        let grid = render_detect_grid([0x08, 0x09, 0x0a, 0x50, 0x77]);
        let found: Vec<u8> = scan::parse_detect_grid(&grid).iter().map(|a| a.get()).collect();
        assert_eq!(found, vec![0x08, 0x09, 0x0a, 0x50, 0x77]);
        assert!(grid.starts_with("     0  1  2"));
        assert!(grid.contains("00:          -- -- -- -- -- 08 09 0a"));
    }

    #[test]
    fn test_inventory_of_default_layout() {
        let mut session = BusSession::new(DummyBus::new_default());
        let found = session.enumerate();
        assert!(found.is_ok());

        let inventory = inventory::collect_inventory(&mut session, &found.addresses);
        assert_eq!(inventory.len(), 4);

        let lights = inventory.first_of(BoardType::Lights).unwrap();
        assert_eq!(lights.address.get(), 0x09);
        assert_eq!(lights.info.description, "Lights Board");
        assert_eq!(lights.info.bus_address, 0x09);
        assert_eq!(lights.info.comm_version, "1.3.0");
        assert_eq!(lights.info.app_version, "1.4.3");

        let legacy = inventory.iter().find(|e| e.address.get() == 0x50).unwrap();
        assert!(legacy.info.is_unknown());
    }

    #[test]
    fn test_inventory_survives_faults() {
        let mut clean = BusSession::new(DummyBus::new_default());
        let mut noisy = faulty(3);
        let addresses = [addr(0x08), addr(0x09), addr(0x0a)];

        let expected = inventory::collect_inventory(&mut clean, &addresses);
        let actual = inventory::collect_inventory(&mut noisy, &addresses);
        assert_eq!(actual, expected);
        assert!(noisy.transport().bus().faults_injected() > 0);
    }

    #[test]
    fn test_write_verify_applies_and_confirms() {
        let mut session = BusSession::new(DummyBus::new_default());
        let report = session
            .write_register_verify(addr(0x09), registers::LIGHT_POWER_LEVEL, &[6, 40])
            .unwrap();
        assert_eq!(report.confirmed, Some(1));

        let board = session.transport().bus().board(0x09).unwrap();
        assert_eq!(board.light_level(6), Some(40));
        assert_eq!(board.last_sequence(), 1);
    }

    #[test]
    fn test_write_verify_recovers_from_faults() {
        let mut session = faulty(3);
        let throttle = Throttle::new(addr(0x08));
        for power in [10, 20, 30, 40, 50] {
            throttle.set_power(&mut session, Channel::A, power).unwrap();
        }
        let board = session.transport().bus().board(0x08).unwrap();
        assert_eq!(board.power(0), Some(50));
    }

    #[test]
    fn test_unknown_device_exhausts_budget() {
        let mut session = BusSession::new(DummyBus::new_default());
        let report = session
            .write_register_verify(addr(0x20), registers::TURNOUT_POSITION, &[1, 1])
            .unwrap();
        assert!(!report.is_confirmed());
        assert_eq!(report.write_exceptions, 4);
    }

    #[test]
    fn test_diagnostics_against_faulty_bus() {
        let mut session = faulty(5);
        let control = RunControl::default();

        let reads = diag::block_read_test(&mut session, addr(0x08), registers::DIAG_BLOCK, 100, &control, |_| {})
            .unwrap();
        assert_eq!(reads.attempted, 100);
        assert_eq!(reads.failures(), 20);
        assert_eq!(reads.io_errors, 5);
        assert_eq!(reads.checksum_mismatches, 5);
        assert_eq!(reads.length_mismatches, 5);
        assert_eq!(reads.echo_mismatches, 5);

        let writes = diag::block_write_test(&mut session, addr(0x08), registers::DIAG_BLOCK, 50, &control, |_| {})
            .unwrap();
        assert_eq!(writes.uncorrectable, 0);
        assert!(writes.messages > 50);

        let board = session.transport().bus().board(0x08).unwrap();
        let expected: Vec<u8> = (49u8..65).collect();
        assert_eq!(board.diag_block(), &expected[..]);
    }

    #[test]
    fn test_loopback_counts_nacks() {
        let mut session = faulty(4);
        let tally = diag::loopback_test(&mut session, addr(0x09), 256, &RunControl::default(), |_| {}).unwrap();
        assert_eq!(tally.sent, 256);
        // 64 faults, a quarter of them NACKs
        assert_eq!(tally.errors, 16);
        assert_eq!(session.transport().bus().elapsed_us(), 255 * 1_000);
    }

    #[test]
    fn test_lights_panel_on_dummy() {
        let levels = Levels {
            off: 0,
            low: 25,
            medium: 60,
            full: 100,
        };
        let config = LightsConfig {
            switches: vec![SwitchSpec {
                text: "Platform".into(),
                kind: SwitchKind::FourWay,
                pins: vec![1, 2],
                levels,
            }],
        };
        let mut session = BusSession::new(DummyBus::new_default());
        let mut panel = LightsPanel::new(addr(0x09), config);
        panel.switch_on(&mut session, 0).unwrap();
        panel.switch_on(&mut session, 0).unwrap();

        let board = session.transport().bus().board(0x09).unwrap();
        assert_eq!(board.light_level(1), Some(60));
        assert_eq!(board.light_level(2), Some(60));
    }

    #[test]
    fn test_scan_failure() {
        let mut bus = DummyBus::new(DummyConfig {
            detect_fails: true,
            ..Default::default()
        });
        let found = scan::enumerate(&mut bus);
        assert!(found.addresses.is_empty());
        assert!(found.probe_error.is_some());
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("faults", "7"), ("boards", "lights+throttle")]).unwrap();
        assert_eq!(config.fault_every, 7);
        assert_eq!(config.boards.len(), 2);
        assert!(parse_options(&[("boards", "lights+lights")]).is_err());
        assert!(parse_options(&[("boards", "crane")]).is_err());
        assert!(parse_options(&[("faults", "x")]).is_err());
    }
}
