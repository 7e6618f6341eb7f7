//! Error types for railctl-core

use crate::bus::DeviceAddress;
use crate::frame::FrameFault;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Bus-level I/O failure (no device, NACK, line fault)
    #[error("bus I/O failed for device {address}: {source}")]
    BusIo {
        /// Device the transaction was addressed to
        address: DeviceAddress,
        /// Underlying I/O error reported by the backend
        #[source]
        source: std::io::Error,
    },

    /// Payload does not fit into one bus block
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLong {
        /// Requested payload length
        len: usize,
        /// Maximum payload length
        max: usize,
    },

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// All read attempts failed
    #[error("register {register} on {address}: no valid frame after {attempts} attempts (last: {last})")]
    RetriesExhausted {
        /// Device address
        address: DeviceAddress,
        /// Register number
        register: u8,
        /// Attempts made
        attempts: u8,
        /// Fault seen on the final attempt
        last: FrameFault,
    },

    /// A verified write was never confirmed by the device
    #[error("register {register} on {address}: write not confirmed after {attempts} attempts")]
    Unconfirmed {
        /// Device address
        address: DeviceAddress,
        /// Register number
        register: u8,
        /// Attempts made
        attempts: u8,
    },

    /// The bus backend does not support the operation
    #[error("operation not supported by bus: {0}")]
    Unsupported(&'static str),

    /// The external bus-scan probe failed
    #[error("bus scan probe failed: {0}")]
    ProbeFailed(String),

    /// Configuration file error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;
