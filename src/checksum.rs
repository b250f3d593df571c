//! Header checksum used to reject corrupted packet headers.
//!
//! The checksum byte is chosen so that `length ^ type ^ checksum` equals
//! [`CHECKSUM_SENTINEL`]. Only the header is protected; payload bytes are
//! still folded into the receive accumulator but never checked.

use crate::consts::CHECKSUM_SENTINEL;

/// Computes the header checksum for an outgoing packet.
pub const fn header_checksum(length: u8, packet_type: u8) -> u8 {
    length ^ packet_type ^ CHECKSUM_SENTINEL
}

/// Returns `true` if the three header bytes form a valid header.
pub const fn header_valid(length: u8, packet_type: u8, checksum: u8) -> bool {
    length ^ packet_type ^ checksum == CHECKSUM_SENTINEL
}

/// Receive-side running XOR over the header bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct HeaderCheck(u8);

impl HeaderCheck {
    /// Starts a new accumulator from the length byte.
    pub(crate) const fn seed(length: u8) -> Self {
        Self(length)
    }

    pub(crate) fn feed(&mut self, byte: u8) {
        self.0 ^= byte;
    }

    /// Only meaningful once the checksum byte has been fed.
    pub(crate) const fn is_valid(&self) -> bool {
        self.0 == CHECKSUM_SENTINEL
    }
}
