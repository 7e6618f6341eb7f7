//! Single-byte additive checksum
//!
//! Every frame carries a trailing byte chosen so that the sum of all bytes,
//! modulo 256, is zero. On reads the device includes the echoed register id
//! in the sum. On writes the register id travels as the SMBus command byte
//! and is not part of the data block, so the host folds it into the sum
//! explicitly when generating the checksum.

/// Sum of all bytes modulo 256
pub fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Check a received frame
///
/// Returns true iff all bytes, checksum included, sum to zero modulo 256.
pub fn validate(bytes: &[u8]) -> bool {
    sum(bytes) == 0
}

/// Generate the checksum byte for `payload` written to `register`
///
/// The result `v` satisfies `(register + sum(payload) + v) mod 256 == 0`.
pub fn generate(register: u8, payload: &[u8]) -> u8 {
    register.wrapping_add(sum(payload)).wrapping_neg()
}
