//! Linux I2C device implementation
//!
//! This module provides the `LinuxI2c` struct that implements the
//! `RegisterBus` trait using the kernel's i2c-dev SMBus interface.

use crate::detect;
use crate::error::{LinuxI2cError, Result};

use bitflags::bitflags;
use railctl_core::bus::{BusFeatures, DeviceAddress, RegisterBus, MAX_BLOCK_LEN};
use railctl_core::error::{Error as CoreError, Result as CoreResult};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

/// Command used to produce the presence grid
pub const DEFAULT_DETECT_COMMAND: &str = "i2cdetect";

/// Linux i2c-dev ioctl constants
mod ioctl {
    use nix::{ioctl_read_bad, ioctl_write_int_bad, ioctl_write_ptr_bad};

    /// Select the target device address
    pub const I2C_SLAVE: u16 = 0x0703;
    /// Query adapter functionality
    pub const I2C_FUNCS: u16 = 0x0705;
    /// Perform an SMBus transfer
    pub const I2C_SMBUS: u16 = 0x0720;

    pub const I2C_SMBUS_WRITE: u8 = 0;
    pub const I2C_SMBUS_READ: u8 = 1;

    /// Block transfer with the length in the first data byte
    pub const I2C_SMBUS_I2C_BLOCK_DATA: u32 = 8;

    /// Length byte plus 32 data bytes plus one spare, as in the kernel union
    pub const I2C_SMBUS_DATA_LEN: usize = super::MAX_BLOCK_LEN + 2;

    /// Must match the kernel's `union i2c_smbus_data` in size
    #[repr(C)]
    pub struct SmbusData {
        pub block: [u8; I2C_SMBUS_DATA_LEN],
    }

    /// Must match the kernel's `struct i2c_smbus_ioctl_data`
    #[repr(C)]
    pub struct SmbusIoctlData {
        pub read_write: u8,
        pub command: u8,
        pub size: u32,
        pub data: *mut SmbusData,
    }

    ioctl_write_int_bad!(i2c_set_slave, I2C_SLAVE);
    ioctl_read_bad!(i2c_get_funcs, I2C_FUNCS, libc::c_ulong);
    ioctl_write_ptr_bad!(i2c_smbus, I2C_SMBUS, SmbusIoctlData);
}

bitflags! {
    /// Adapter functionality bits reported by `I2C_FUNCS`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct I2cFunctionality: u64 {
        /// Plain I2C transfers
        const I2C                  = 0x0000_0001;
        /// SMBus quick command (used by i2cdetect)
        const SMBUS_QUICK          = 0x0001_0000;
        /// SMBus receive byte (used by i2cdetect)
        const SMBUS_READ_BYTE      = 0x0002_0000;
        /// SMBus "read I2C block data"
        const SMBUS_READ_I2C_BLOCK = 0x0400_0000;
        /// SMBus "write I2C block data"
        const SMBUS_WRITE_I2C_BLOCK = 0x0800_0000;
    }
}

/// Configuration for opening a Linux I2C bus
#[derive(Debug, Clone, Default)]
pub struct LinuxI2cConfig {
    /// Device path (e.g., "/dev/i2c-1")
    pub device: String,
    /// Bus number passed to the detect command
    pub bus: Option<u32>,
    /// Detect command (default: `i2cdetect`)
    pub detect_command: Option<String>,
    /// Pause after opening so the bus can settle, in milliseconds
    pub settle_ms: u32,
}

impl LinuxI2cConfig {
    /// Configuration for bus number `bus`
    pub fn for_bus(bus: u32) -> Self {
        Self {
            device: format!("/dev/i2c-{}", bus),
            bus: Some(bus),
            ..Default::default()
        }
    }

    /// Configuration for a device path; the bus number is taken from the name
    pub fn new(device: impl Into<String>) -> Self {
        let device = device.into();
        let bus = bus_number_from_path(&device);
        Self {
            device,
            bus,
            ..Default::default()
        }
    }

    /// Set the detect command
    pub fn with_detect_command(mut self, command: impl Into<String>) -> Self {
        self.detect_command = Some(command.into());
        self
    }

    /// Set the settle delay
    pub fn with_settle_ms(mut self, settle_ms: u32) -> Self {
        self.settle_ms = settle_ms;
        self
    }
}

fn bus_number_from_path(path: &str) -> Option<u32> {
    path.rsplit_once("i2c-").and_then(|(_, n)| n.parse().ok())
}

/// Linux I2C bus using the i2c-dev interface
///
/// Each transfer selects the target address first, so one handle can talk
/// to every board on the bus.
pub struct LinuxI2c {
    file: File,
    path: String,
    bus: Option<u32>,
    detect_command: String,
    funcs: I2cFunctionality,
    current: Option<u8>,
}

impl LinuxI2c {
    /// Open a Linux I2C bus with the given configuration
    pub fn open(config: &LinuxI2cConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxI2cError::NoDevice);
        }

        log::debug!("linux_i2c: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxI2cError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let mut raw: libc::c_ulong = 0;
        unsafe {
            ioctl::i2c_get_funcs(file.as_raw_fd(), &mut raw).map_err(|e| {
                LinuxI2cError::FuncsFailed(std::io::Error::from_raw_os_error(e as i32))
            })?;
        }
        let funcs = I2cFunctionality::from_bits_truncate(raw as u64);
        log::debug!("linux_i2c: Adapter functionality {:?}", funcs);

        for (flag, what) in [
            (I2cFunctionality::SMBUS_READ_I2C_BLOCK, "I2C block reads"),
            (I2cFunctionality::SMBUS_WRITE_I2C_BLOCK, "I2C block writes"),
        ] {
            if !funcs.contains(flag) {
                return Err(LinuxI2cError::MissingFunctionality {
                    path: config.device.clone(),
                    what,
                });
            }
        }

        if config.settle_ms > 0 {
            std::thread::sleep(Duration::from_millis(config.settle_ms as u64));
        }

        log::info!("linux_i2c: Opened {}", config.device);

        Ok(Self {
            file,
            path: config.device.clone(),
            bus: config.bus,
            detect_command: config
                .detect_command
                .clone()
                .unwrap_or_else(|| DEFAULT_DETECT_COMMAND.to_string()),
            funcs,
            current: None,
        })
    }

    /// Open a bus by number with default settings
    pub fn open_bus(bus: u32) -> Result<Self> {
        Self::open(&LinuxI2cConfig::for_bus(bus))
    }

    /// Device path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Adapter functionality
    pub fn functionality(&self) -> I2cFunctionality {
        self.funcs
    }

    fn select(&mut self, address: u8) -> Result<()> {
        if self.current == Some(address) {
            return Ok(());
        }
        unsafe {
            ioctl::i2c_set_slave(self.file.as_raw_fd(), address as libc::c_int).map_err(|e| {
                LinuxI2cError::SetAddressFailed {
                    address,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }
        self.current = Some(address);
        Ok(())
    }

    fn smbus_transfer(&mut self, read_write: u8, command: u8, data: &mut ioctl::SmbusData) -> Result<()> {
        let args = ioctl::SmbusIoctlData {
            read_write,
            command,
            size: ioctl::I2C_SMBUS_I2C_BLOCK_DATA,
            data: data as *mut ioctl::SmbusData,
        };
        unsafe {
            ioctl::i2c_smbus(self.file.as_raw_fd(), &args).map_err(|e| {
                LinuxI2cError::TransferFailed(std::io::Error::from_raw_os_error(e as i32))
            })?;
        }
        Ok(())
    }

    /// SMBus "read I2C block data"
    pub fn read_i2c_block(&mut self, address: u8, command: u8, len: usize) -> Result<Vec<u8>> {
        if len == 0 || len > MAX_BLOCK_LEN {
            return Err(LinuxI2cError::InvalidParameter(format!(
                "block length {} (must be 1-{})",
                len, MAX_BLOCK_LEN
            )));
        }
        self.select(address)?;

        let mut data = ioctl::SmbusData {
            block: [0; ioctl::I2C_SMBUS_DATA_LEN],
        };
        data.block[0] = len as u8;
        self.smbus_transfer(ioctl::I2C_SMBUS_READ, command, &mut data)?;

        let count = usize::from(data.block[0]).min(MAX_BLOCK_LEN);
        Ok(data.block[1..=count].to_vec())
    }

    /// SMBus "write I2C block data"
    pub fn write_i2c_block(&mut self, address: u8, command: u8, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_BLOCK_LEN {
            return Err(LinuxI2cError::InvalidParameter(format!(
                "block length {} (max {})",
                bytes.len(),
                MAX_BLOCK_LEN
            )));
        }
        self.select(address)?;

        let mut data = ioctl::SmbusData {
            block: [0; ioctl::I2C_SMBUS_DATA_LEN],
        };
        data.block[0] = bytes.len() as u8;
        data.block[1..=bytes.len()].copy_from_slice(bytes);
        self.smbus_transfer(ioctl::I2C_SMBUS_WRITE, command, &mut data)
    }
}

fn bus_io(address: DeviceAddress, err: LinuxI2cError) -> CoreError {
    let source = match err {
        LinuxI2cError::TransferFailed(e) => e,
        LinuxI2cError::SetAddressFailed { source, .. } => source,
        other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
    };
    CoreError::BusIo { address, source }
}

impl RegisterBus for LinuxI2c {
    fn features(&self) -> BusFeatures {
        let mut features = BusFeatures::DETECT;
        if self.funcs.contains(I2cFunctionality::SMBUS_READ_I2C_BLOCK) {
            features |= BusFeatures::BLOCK_READ;
        }
        if self.funcs.contains(I2cFunctionality::SMBUS_WRITE_I2C_BLOCK) {
            features |= BusFeatures::BLOCK_WRITE;
        }
        features
    }

    fn read_block(&mut self, address: DeviceAddress, register: u8, len: usize) -> CoreResult<Vec<u8>> {
        match self.read_i2c_block(address.get(), register, len) {
            Ok(bytes) => Ok(bytes),
            Err(LinuxI2cError::InvalidParameter(msg)) => Err(CoreError::InvalidArgument(msg)),
            Err(e) => Err(bus_io(address, e)),
        }
    }

    fn write_block(&mut self, address: DeviceAddress, register: u8, data: &[u8]) -> CoreResult<()> {
        match self.write_i2c_block(address.get(), register, data) {
            Ok(()) => Ok(()),
            Err(LinuxI2cError::InvalidParameter(msg)) => Err(CoreError::InvalidArgument(msg)),
            Err(e) => Err(bus_io(address, e)),
        }
    }

    fn detect(&mut self) -> CoreResult<String> {
        let bus = self.bus.ok_or_else(|| {
            CoreError::ProbeFailed(format!("cannot tell the bus number of {}", self.path))
        })?;
        detect::run_detect(&self.detect_command, bus).map_err(|e| CoreError::ProbeFailed(e.to_string()))
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }
}

/// Parse bus options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxI2cConfig, String> {
    let mut config = LinuxI2cConfig::default();

    let has = |name: &str| options.iter().any(|(key, _)| *key == name);
    if has("bus") && has("dev") {
        return Err("Options bus and dev are mutually exclusive".to_string());
    }

    for (key, value) in options {
        match *key {
            "bus" => {
                let bus: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid bus number: {}", value))?;
                let settle_ms = config.settle_ms;
                let detect_command = config.detect_command.take();
                config = LinuxI2cConfig {
                    detect_command,
                    settle_ms,
                    ..LinuxI2cConfig::for_bus(bus)
                };
            }
            "dev" => {
                config.device = value.to_string();
                if config.bus.is_none() {
                    config.bus = bus_number_from_path(value);
                }
            }
            "i2cdetect" => {
                config.detect_command = Some(value.to_string());
            }
            "settle" => {
                config.settle_ms = value
                    .parse()
                    .map_err(|_| format!("Invalid settle time: {}", value))?;
            }
            _ => {
                log::warn!("linux_i2c: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err("No bus specified. Use bus=N or dev=/dev/i2c-N".to_string());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bus_option() {
        let config = parse_options(&[("bus", "1")]).unwrap();
        assert_eq!(config.device, "/dev/i2c-1");
        assert_eq!(config.bus, Some(1));
    }

    #[test]
    fn test_parse_dev_option() {
        let config = parse_options(&[("dev", "/dev/i2c-3"), ("settle", "1000")]).unwrap();
        assert_eq!(config.bus, Some(3));
        assert_eq!(config.settle_ms, 1000);

        let config = parse_options(&[("dev", "/dev/my-bus")]).unwrap();
        assert_eq!(config.bus, None);
    }

    #[test]
    fn test_parse_requires_bus() {
        assert!(parse_options(&[]).is_err());
        assert!(parse_options(&[("bus", "x")]).is_err());
    }

    #[test]
    fn test_parse_rejects_bus_and_dev() {
        let err = parse_options(&[("dev", "/dev/i2c-3"), ("bus", "1")]).unwrap_err();
        assert!(err.contains("mutually exclusive"));
        assert!(parse_options(&[("bus", "1"), ("dev", "/dev/i2c-3")]).is_err());
    }

    #[test]
    fn test_detect_command_survives_bus_option() {
        let config = parse_options(&[("i2cdetect", "/usr/sbin/i2cdetect"), ("bus", "0")]).unwrap();
        assert_eq!(config.detect_command.as_deref(), Some("/usr/sbin/i2cdetect"));
        assert_eq!(config.device, "/dev/i2c-0");
    }

    #[test]
    fn test_smbus_struct_layout() {
        assert_eq!(std::mem::size_of::<ioctl::SmbusData>(), 34);
    }
}
