// src/gps/checksum.rs
//! NMEA XOR checksum

use std::fmt;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// The two characters following `*` on the wire, as the sender declared them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumSuffix(pub [u8; 2]);

impl ChecksumSuffix {
    /// Suffix a well-behaved sender would transmit for `body`.
    pub fn for_body(body: &[u8]) -> Self {
        let value = checksum(body);
        Self([
            HEX_DIGITS[(value >> 4) as usize],
            HEX_DIGITS[(value & 0x0f) as usize],
        ])
    }
}

impl fmt::Display for ChecksumSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

/// XOR-fold of every byte strictly between `$` and `*`.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Checksum of `body` rendered as two uppercase hex digits.
pub fn compute(body: &[u8]) -> String {
    format!("{:02X}", checksum(body))
}

/// Compare the computed checksum against the declared suffix.
///
/// The comparison is byte-for-byte, so lowercase hex digits do not match.
pub fn verify(body: &[u8], suffix: &ChecksumSuffix) -> bool {
    ChecksumSuffix::for_body(body) == *suffix
}
