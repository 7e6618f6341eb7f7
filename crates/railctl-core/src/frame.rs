//! Register frames
//!
//! Read frame, as returned by the device:
//!
//! ```text
//! [register id echo] [data 0] ... [data n-1] [checksum]
//! ```
//!
//! Write frame, as sent in the data block of a write-verify transfer (the
//! register id goes out as the SMBus command byte):
//!
//! ```text
//! [sequence] [data 0] ... [data n-1] [checksum over register + sequence + data]
//! ```

use crate::bus::MAX_BLOCK_LEN;
use crate::checksum;
use crate::error::{Error, Result};
use core::fmt;

/// Largest data section that still fits a framed block
///
/// Both frame types add two bytes (id or sequence, and checksum).
pub const MAX_DATA_LEN: usize = MAX_BLOCK_LEN - 2;

/// Register payload, bounded by the bus block size
pub type Payload = heapless::Vec<u8, MAX_BLOCK_LEN>;

/// Number of bytes to request when reading `data_len` data bytes
pub const fn read_frame_len(data_len: usize) -> usize {
    1 + data_len + 1
}

/// Whether a read must echo the requested register id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoCheck {
    /// Reject frames whose first byte is not the requested register
    #[default]
    Enforce,
    /// Accept any register id as long as length and checksum are good
    Ignore,
}

/// Why a single read attempt did not produce a usable frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFault {
    /// Bus transfer failed outright
    Io,
    /// Wrong number of bytes returned
    Length {
        /// Bytes requested
        expected: usize,
        /// Bytes received
        actual: usize,
    },
    /// Bytes did not sum to zero
    Checksum,
    /// Echoed register id differs from the requested one
    Echo {
        /// Register requested
        expected: u8,
        /// Register id echoed
        actual: u8,
    },
}

impl fmt::Display for FrameFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "bus I/O error"),
            Self::Length { expected, actual } => {
                write!(f, "length mismatch: expected {} bytes, got {}", expected, actual)
            }
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::Echo { expected, actual } => {
                write!(f, "register echo mismatch: expected {}, got {}", expected, actual)
            }
        }
    }
}

/// A validated register read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFrame {
    /// Register id echoed by the device
    pub register: u8,
    /// Data bytes with id and checksum stripped
    pub payload: Payload,
}

impl RegisterFrame {
    /// Validate raw bytes received for a read of `data_len` bytes from `register`
    ///
    /// Checks run in wire order: length, checksum, then (if enforced) the
    /// echoed register id.
    pub fn decode(
        register: u8,
        data_len: usize,
        bytes: &[u8],
        echo: EchoCheck,
    ) -> core::result::Result<Self, FrameFault> {
        let expected = read_frame_len(data_len);
        if bytes.len() != expected {
            return Err(FrameFault::Length {
                expected,
                actual: bytes.len(),
            });
        }

        if !checksum::validate(bytes) {
            return Err(FrameFault::Checksum);
        }

        let echoed = bytes[0];
        if echo == EchoCheck::Enforce && echoed != register {
            return Err(FrameFault::Echo {
                expected: register,
                actual: echoed,
            });
        }

        let payload =
            Payload::from_slice(&bytes[1..expected - 1]).map_err(|_| FrameFault::Length {
                expected,
                actual: bytes.len(),
            })?;

        Ok(Self {
            register: echoed,
            payload,
        })
    }

    /// First data byte, if any
    pub fn first(&self) -> Option<u8> {
        self.payload.first().copied()
    }
}

fn check_data_len(len: usize) -> Result<()> {
    if len > MAX_DATA_LEN {
        return Err(Error::PayloadTooLong {
            len,
            max: MAX_DATA_LEN,
        });
    }
    Ok(())
}

/// Build the data block for a sequence-numbered write to `register`
pub fn encode_write(register: u8, sequence: u8, data: &[u8]) -> Result<Payload> {
    check_data_len(data.len())?;

    let mut frame = Payload::new();
    // Capacity is checked above, pushes cannot fail
    let _ = frame.push(sequence);
    let _ = frame.extend_from_slice(data);
    let cksum = checksum::generate(register, &frame);
    let _ = frame.push(cksum);
    Ok(frame)
}

/// Build the data block for an unsequenced raw write to `register`
pub fn encode_raw(register: u8, data: &[u8]) -> Result<Payload> {
    check_data_len(data.len())?;

    let mut frame = Payload::new();
    let _ = frame.extend_from_slice(data);
    let _ = frame.push(checksum::generate(register, data));
    Ok(frame)
}

/// Check a received data block from the device's point of view
///
/// Used by device emulators: the register id is folded back into the sum.
pub fn validate_write(register: u8, block: &[u8]) -> bool {
    register.wrapping_add(checksum::sum(block)) == 0
}

/// Build a read frame as a device would send it
pub fn encode_read_response(register: u8, data: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(read_frame_len(data.len()));
    frame.push(register);
    frame.extend_from_slice(data);
    frame.push(checksum::generate(register, data));
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_frame() {
        let bytes = encode_read_response(3, b"Lights");
        let frame = RegisterFrame::decode(3, 6, &bytes, EchoCheck::Enforce).unwrap();
        assert_eq!(frame.register, 3);
        assert_eq!(&frame.payload[..], b"Lights");
    }

    #[test]
    fn test_decode_wrong_length() {
        let bytes = encode_read_response(3, b"Lights");
        let err = RegisterFrame::decode(3, 16, &bytes, EchoCheck::Enforce).unwrap_err();
        assert_eq!(
            err,
            FrameFault::Length {
                expected: 18,
                actual: 8
            }
        );
    }

    #[test]
    fn test_decode_bad_checksum() {
        let mut bytes = encode_read_response(0, &[1]);
        bytes[1] = 2;
        assert_eq!(
            RegisterFrame::decode(0, 1, &bytes, EchoCheck::Enforce),
            Err(FrameFault::Checksum)
        );
    }

    #[test]
    fn test_echo_policy() {
        let bytes = encode_read_response(4, &[7]);
        assert_eq!(
            RegisterFrame::decode(2, 1, &bytes, EchoCheck::Enforce),
            Err(FrameFault::Echo {
                expected: 2,
                actual: 4
            })
        );
        let frame = RegisterFrame::decode(2, 1, &bytes, EchoCheck::Ignore).unwrap();
        assert_eq!(frame.register, 4);
        assert_eq!(frame.first(), Some(7));
    }

    #[test]
    fn test_encode_write_checksum() {
        let block = encode_write(30, 0x41, &[5, 80]).unwrap();
        assert_eq!(&block[..3], &[0x41, 5, 80]);
        assert_eq!(block.len(), 4);
        assert!(validate_write(30, &block));
        assert!(!validate_write(31, &block));
    }

    #[test]
    fn test_encode_raw_checksum() {
        let block = encode_raw(100, &[]).unwrap();
        assert_eq!(&block[..], &[100u8.wrapping_neg()]);
        assert!(validate_write(100, &block));
    }

    #[test]
    fn test_payload_limit() {
        assert!(encode_write(1, 0, &[0; MAX_DATA_LEN]).is_ok());
        assert!(matches!(
            encode_write(1, 0, &[0; MAX_DATA_LEN + 1]),
            Err(Error::PayloadTooLong { len: 31, max: 30 })
        ));
    }
}
