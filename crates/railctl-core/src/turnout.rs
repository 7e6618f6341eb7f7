//! Track switch (turnout) board

use crate::access::RegisterAccess;
use crate::bus::DeviceAddress;
use crate::error::Result;
use crate::protocol::WriteReport;
use crate::registers;
use core::str::FromStr;

/// Turnout position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Straight through
    Normal,
    /// Diverging route
    Reverse,
}

impl Position {
    fn code(self) -> u8 {
        match self {
            Position::Normal => 0,
            Position::Reverse => 1,
        }
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" | "straight" => Ok(Position::Normal),
            "reverse" | "diverge" => Ok(Position::Reverse),
            other => Err(format!("unknown turnout position '{}'", other)),
        }
    }
}

/// A track switch board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnoutBoard {
    address: DeviceAddress,
}

impl TurnoutBoard {
    /// Switch board at `address`
    pub fn new(address: DeviceAddress) -> Self {
        Self { address }
    }

    /// Board address
    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    /// Throw turnout `id`
    pub fn set<A: RegisterAccess + ?Sized>(
        &self,
        access: &mut A,
        id: u8,
        position: Position,
    ) -> Result<WriteReport> {
        access
            .write_register_verify(self.address, registers::TURNOUT_POSITION, &[id, position.code()])?
            .into_result(self.address, registers::TURNOUT_POSITION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::transport::tests::{addr, ScriptedBus};
    use crate::session::BusSession;

    #[test]
    fn test_throw_turnout() {
        let bus = ScriptedBus::default().frame(registers::WRITE_SEQUENCE, &[1]);
        let mut session = BusSession::new(bus);
        let board = TurnoutBoard::new(addr(0x0a));

        let report = board.set(&mut session, 6, Position::Reverse).unwrap();
        assert_eq!(report.confirmed, Some(1));
        let (_, reg, block) = &session.transport().bus().write_log[0];
        assert_eq!(*reg, registers::TURNOUT_POSITION);
        assert_eq!(&block[..3], &[1, 6, 1]);
    }

    #[test]
    fn test_parse_position() {
        assert_eq!("Straight".parse::<Position>().unwrap(), Position::Normal);
        assert!("left".parse::<Position>().is_err());
    }
}
