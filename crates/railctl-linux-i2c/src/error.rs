//! Error types for Linux I2C operations

use thiserror::Error;

/// Linux I2C specific errors
#[derive(Debug, Error)]
pub enum LinuxI2cError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to query adapter functionality
    #[error("Failed to query adapter functionality: {0}")]
    FuncsFailed(#[source] std::io::Error),

    /// Adapter lacks a transfer type the protocol needs
    #[error("Adapter {path} does not support {what}")]
    MissingFunctionality { path: String, what: &'static str },

    /// Failed to select the target device
    #[error("Failed to select device 0x{address:02x}: {source}")]
    SetAddressFailed {
        address: u8,
        #[source]
        source: std::io::Error,
    },

    /// SMBus transfer failed
    #[error("SMBus transfer failed: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Bus not specified
    #[error("No bus specified. Use bus=N or dev=/dev/i2c-N")]
    NoDevice,

    /// The i2cdetect probe could not be run
    #[error("{command}: {reason}")]
    ProbeFailed { command: String, reason: String },
}

/// Result type for Linux I2C operations
pub type Result<T> = std::result::Result<T, LinuxI2cError>;
