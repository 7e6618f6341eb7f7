//! Lights board control panel

use super::config::LightsConfig;
use super::switch::{LightSwitch, Setting};
use crate::access::RegisterAccess;
use crate::bus::DeviceAddress;
use crate::error::{Error, Result};
use crate::inventory::{BoardType, Inventory};
use crate::protocol::WriteReport;
use crate::registers;

/// Pause between switches during "all on"/"all off"
pub const ALL_SWITCH_PAUSE_US: u32 = 4_000;

/// All configured switches of one lights board
#[derive(Debug, Clone)]
pub struct LightsPanel {
    address: DeviceAddress,
    switches: Vec<LightSwitch>,
}

impl LightsPanel {
    /// Build a panel for the board at `address`
    pub fn new(address: DeviceAddress, config: LightsConfig) -> Self {
        Self {
            address,
            switches: config.switches.into_iter().map(LightSwitch::new).collect(),
        }
    }

    /// Address of the first lights board in `inventory`
    pub fn locate(inventory: &Inventory) -> Option<DeviceAddress> {
        inventory.first_of(BoardType::Lights).map(|e| e.address)
    }

    /// Board address
    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    /// Switches in configuration order
    pub fn switches(&self) -> &[LightSwitch] {
        &self.switches
    }

    /// Find a switch by label, ignoring case
    pub fn position(&self, text: &str) -> Option<usize> {
        self.switches
            .iter()
            .position(|s| s.spec().text.eq_ignore_ascii_case(text))
    }

    fn switch_mut(&mut self, index: usize) -> Result<&mut LightSwitch> {
        let count = self.switches.len();
        self.switches
            .get_mut(index)
            .ok_or_else(|| Error::InvalidArgument(format!("switch {} out of range ({} configured)", index, count)))
    }

    /// Send `level` to every pin of switch `index`
    fn apply<A: RegisterAccess + ?Sized>(
        &self,
        access: &mut A,
        index: usize,
        level: u8,
    ) -> Result<Vec<WriteReport>> {
        let sw = &self.switches[index];
        let mut reports = Vec::with_capacity(sw.spec().pins.len());
        for &pin in &sw.spec().pins {
            log::info!("{}: pin {} to level {}", sw.spec().text, pin, level);
            let report =
                access.write_register_verify(self.address, registers::LIGHT_POWER_LEVEL, &[pin, level])?;
            if !report.is_confirmed() {
                log::warn!("{}: pin {} not confirmed", sw.spec().text, pin);
            }
            reports.push(report);
        }
        Ok(reports)
    }

    /// Press "on" on one switch
    pub fn switch_on<A: RegisterAccess + ?Sized>(&mut self, access: &mut A, index: usize) -> Result<Vec<WriteReport>> {
        match self.switch_mut(index)?.press_on() {
            Some(level) => self.apply(access, index, level),
            None => Ok(Vec::new()),
        }
    }

    /// Press "off" on one switch
    pub fn switch_off<A: RegisterAccess + ?Sized>(&mut self, access: &mut A, index: usize) -> Result<Vec<WriteReport>> {
        match self.switch_mut(index)?.press_off() {
            Some(level) => self.apply(access, index, level),
            None => Ok(Vec::new()),
        }
    }

    /// Jump one switch to a named setting
    pub fn select<A: RegisterAccess + ?Sized>(
        &mut self,
        access: &mut A,
        index: usize,
        setting: Setting,
    ) -> Result<Vec<WriteReport>> {
        let level = self.switch_mut(index)?.select(setting);
        self.apply(access, index, level)
    }

    /// Set one switch to a raw level
    pub fn set_level<A: RegisterAccess + ?Sized>(
        &mut self,
        access: &mut A,
        index: usize,
        level: u8,
    ) -> Result<Vec<WriteReport>> {
        let level = self.switch_mut(index)?.set_level(level);
        self.apply(access, index, level)
    }

    /// Press "on" on every switch
    pub fn all_on<A: RegisterAccess + ?Sized>(&mut self, access: &mut A) -> Result<Vec<WriteReport>> {
        self.for_all(access, LightSwitch::press_on)
    }

    /// Press "off" on every switch
    pub fn all_off<A: RegisterAccess + ?Sized>(&mut self, access: &mut A) -> Result<Vec<WriteReport>> {
        self.for_all(access, LightSwitch::press_off)
    }

    fn for_all<A, F>(&mut self, access: &mut A, press: F) -> Result<Vec<WriteReport>>
    where
        A: RegisterAccess + ?Sized,
        F: Fn(&mut LightSwitch) -> Option<u8>,
    {
        let mut reports = Vec::new();
        for index in 0..self.switches.len() {
            if index > 0 {
                access.pause_us(ALL_SWITCH_PAUSE_US);
            }
            if let Some(level) = press(&mut self.switches[index]) {
                reports.extend(self.apply(access, index, level)?);
            }
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{BoardInfo, InventoryEntry};
    use crate::lights::{Levels, SwitchKind, SwitchSpec};
    use crate::protocol::transport::tests::{addr, ScriptedBus};
    use crate::session::BusSession;

    fn config() -> LightsConfig {
        let levels = Levels {
            off: 0,
            low: 20,
            medium: 50,
            full: 100,
        };
        LightsConfig {
            switches: vec![
                SwitchSpec {
                    text: "Platform".into(),
                    kind: SwitchKind::FourWay,
                    pins: vec![4, 5],
                    levels,
                },
                SwitchSpec {
                    text: "Shed".into(),
                    kind: SwitchKind::Simple,
                    pins: vec![7],
                    levels,
                },
            ],
        }
    }

    fn confirming(n: u8) -> ScriptedBus {
        (1..=n).fold(ScriptedBus::default(), |bus, s| {
            bus.frame(registers::WRITE_SEQUENCE, &[s])
        })
    }

    fn sent(session: &BusSession<ScriptedBus>) -> Vec<(u8, u8)> {
        session
            .transport()
            .bus()
            .write_log
            .iter()
            .map(|(_, _, block)| (block[1], block[2]))
            .collect()
    }

    #[test]
    fn test_switch_writes_each_pin() {
        let mut session = BusSession::new(confirming(2));
        let mut panel = LightsPanel::new(addr(0x09), config());

        let reports = panel.switch_on(&mut session, 0).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.is_confirmed()));
        assert_eq!(sent(&session), vec![(4, 20), (5, 20)]);
        assert!(session
            .transport()
            .bus()
            .write_log
            .iter()
            .all(|(a, reg, _)| *a == 0x09 && *reg == registers::LIGHT_POWER_LEVEL));
    }

    #[test]
    fn test_all_on_pauses_between_switches() {
        let mut session = BusSession::new(confirming(3));
        let mut panel = LightsPanel::new(addr(0x09), config());

        let reports = panel.all_on(&mut session).unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(sent(&session), vec![(4, 20), (5, 20), (7, 100)]);
        assert_eq!(session.transport().bus().delays, vec![ALL_SWITCH_PAUSE_US]);
    }

    #[test]
    fn test_off_when_already_off_sends_nothing() {
        let mut session = BusSession::new(ScriptedBus::default());
        let mut panel = LightsPanel::new(addr(0x09), config());
        assert!(panel.all_off(&mut session).unwrap().is_empty());
        assert!(session.transport().bus().write_log.is_empty());
    }

    #[test]
    fn test_unknown_switch_index() {
        let mut session = BusSession::new(ScriptedBus::default());
        let mut panel = LightsPanel::new(addr(0x09), config());
        assert!(matches!(
            panel.switch_on(&mut session, 5),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(panel.position("shed"), Some(1));
    }

    #[test]
    fn test_locate_lights_board() {
        let entry = |raw, board_type| InventoryEntry {
            address: addr(raw),
            info: BoardInfo {
                board_type,
                ..Default::default()
            },
        };
        let inventory = Inventory::new(vec![entry(0x08, BoardType::Throttle), entry(0x09, BoardType::Lights)]);
        assert_eq!(LightsPanel::locate(&inventory), Some(addr(0x09)));
        assert_eq!(LightsPanel::locate(&Inventory::default()), None);
    }
}
