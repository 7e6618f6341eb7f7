//! Throttle board
//!
//! A throttle board drives two locomotive channels. Settings are verified
//! writes of `[channel, value]`; the measured speed of both channels is
//! read back from one register.

use crate::access::RegisterAccess;
use crate::bus::DeviceAddress;
use crate::error::{Error, Result};
use crate::protocol::WriteReport;
use crate::registers;
use core::fmt;
use core::str::FromStr;

/// Highest power setting
pub const MAX_POWER: u8 = 100;

/// Locomotive channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Locomotive A
    A,
    /// Locomotive B
    B,
}

impl Channel {
    /// Both channels in register order
    pub const ALL: [Channel; 2] = [Channel::A, Channel::B];

    /// Index used on the wire
    pub fn index(self) -> u8 {
        match self {
            Channel::A => 0,
            Channel::B => 1,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::A => write!(f, "A"),
            Channel::B => write!(f, "B"),
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "0" => Ok(Channel::A),
            "b" | "1" => Ok(Channel::B),
            other => Err(format!("unknown channel '{}', expected A or B", other)),
        }
    }
}

/// Direction of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Forward
    #[default]
    Forward,
    /// Reverse
    Reverse,
}

impl Direction {
    fn code(self) -> u8 {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" | "fwd" => Ok(Direction::Forward),
            "reverse" | "rev" => Ok(Direction::Reverse),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

/// One throttle board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    address: DeviceAddress,
}

impl Throttle {
    /// Throttle board at `address`
    pub fn new(address: DeviceAddress) -> Self {
        Self { address }
    }

    /// Board address
    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    fn write<A: RegisterAccess + ?Sized>(
        &self,
        access: &mut A,
        register: u8,
        channel: Channel,
        value: u8,
    ) -> Result<WriteReport> {
        access
            .write_register_verify(self.address, register, &[channel.index(), value])?
            .into_result(self.address, register)
    }

    /// Set the power level of a channel, 0 to 100
    pub fn set_power<A: RegisterAccess + ?Sized>(
        &self,
        access: &mut A,
        channel: Channel,
        percent: u8,
    ) -> Result<WriteReport> {
        if percent > MAX_POWER {
            return Err(Error::InvalidArgument(format!(
                "power {} above {}",
                percent, MAX_POWER
            )));
        }
        self.write(access, registers::THROTTLE_POWER, channel, percent)
    }

    /// Set the direction of travel
    pub fn set_direction<A: RegisterAccess + ?Sized>(
        &self,
        access: &mut A,
        channel: Channel,
        direction: Direction,
    ) -> Result<WriteReport> {
        self.write(access, registers::THROTTLE_DIRECTION, channel, direction.code())
    }

    /// Enable or disable simulated momentum
    pub fn set_momentum<A: RegisterAccess + ?Sized>(
        &self,
        access: &mut A,
        channel: Channel,
        enabled: bool,
    ) -> Result<WriteReport> {
        self.write(access, registers::THROTTLE_MOMENTUM, channel, u8::from(enabled))
    }

    /// Read the measured speed of both channels
    pub fn read_speed<A: RegisterAccess + ?Sized>(&self, access: &mut A) -> Result<[u8; 2]> {
        let frame = access.read_register(
            self.address,
            registers::THROTTLE_SPEED,
            registers::THROTTLE_SPEED_LEN,
        )?;
        match frame.payload[..] {
            [a, b] => Ok([a, b]),
            _ => Err(Error::InvalidArgument(format!(
                "speed register returned {} bytes",
                frame.payload.len()
            ))),
        }
    }

    /// Read the measured speed of one channel
    pub fn read_channel_speed<A: RegisterAccess + ?Sized>(&self, access: &mut A, channel: Channel) -> Result<u8> {
        let speeds = self.read_speed(access)?;
        Ok(speeds[usize::from(channel.index())])
    }
}
