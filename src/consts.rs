//! Constants used across the RFM12 packet protocol.
//!
//! This module defines the on-air framing of a packet and the buffer
//! sizes derived from it.
//!
//! ## Wire layout
//!
//! ```text
//! | preamble | sync      | length | type | checksum | payload ... | trailer |
//! | AA AA    | 2D D4     | 1      | 1    | 1        | length      | AA      |
//! ```
//!
//! - **Preamble**: written by the scheduler before the transmitter is enabled,
//!   lets the receiver's AFC lock onto the carrier.
//! - **Sync**: matched by the transceiver hardware; the receive FIFO only
//!   starts filling after it has been seen, so it never reaches the driver.
//! - **Header**: `length`, `type` and a checksum making the XOR of all three
//!   equal [`CHECKSUM_SENTINEL`].
//! - **Trailer**: a dummy byte whose reception terminates the packet on the
//!   receive side and flushes the transmitter on the sending side.
//!
//! The overhead and trailer lengths are protocol-version constants, not
//! properties of the state machine; the driver only refers to them by name.

/// Number of preamble bytes written ahead of the sync pattern.
pub const PREAMBLE_LEN: u8 = 2;

/// The preamble byte (alternating bits).
pub const PREAMBLE: u8 = 0xAA;

/// Length (in bytes) of the synchronization pattern.
pub const SYNC_LEN: u8 = 2;

/// Most significant sync byte. Must match the chip's sync pattern setting.
pub const SYNC_MSB: u8 = 0x2D;

/// Least significant sync byte. Must match the chip's sync pattern setting.
pub const SYNC_LSB: u8 = 0xD4;

/// Length (in bytes) of the packet header: `length`, `type`, `checksum`.
pub const HEADER_LEN: u8 = 3;

/// Number of dummy bytes transmitted after the payload.
pub const TRAILER_LEN: u8 = 1;

/// The value of each trailer byte.
pub const TRAILER: u8 = 0xAA;

/// Dummy byte written after switching back to receive mode, to clear the
/// transmit register's interrupt status.
pub const FLUSH_BYTE: u8 = 0xAA;

/// XOR of `length`, `type` and `checksum` in a valid header.
pub const CHECKSUM_SENTINEL: u8 = 0xFF;

/// Maximum payload size of the transmit buffer and each receive slot.
pub const MAX_PAYLOAD_LEN: u8 = 30;

/// See [`MAX_PAYLOAD_LEN`](crate::consts::MAX_PAYLOAD_LEN)
pub const MAX_PAYLOAD_LEN_USIZE: usize = MAX_PAYLOAD_LEN as usize;

/// Bytes the transmitter shifts out on top of the payload once the preamble is loaded.
pub const TX_OVERHEAD: u16 = (SYNC_LEN + HEADER_LEN + TRAILER_LEN) as u16;

/// Bytes the receiver expects on top of the payload, counted from the length byte.
///
/// The read at `byte_count == length + RX_OVERHEAD` consumes the trailer.
pub const RX_OVERHEAD: u16 = HEADER_LEN as u16;

/// Default number of consecutive carrier-free ticks before the channel is
/// considered free.
pub const CHANNEL_FREE_TIME: u8 = 16;

/// Number of receive slots.
pub const RX_SLOTS: usize = 2;
