//! Packet buffers shared between mainline code and the interrupt handler.
//!
//! There is one [`TxBuffer`] and two [`RxSlot`]s. Ownership of each buffer
//! moves between the two parties through a status tag rather than a lock:
//!
//! - The transmit buffer belongs to mainline code while
//!   [`TxState::Free`](crate::state::TxState::Free) and to the interrupt
//!   handler while `Occupied`.
//! - A receive slot belongs to the handler while it is the fill target and
//!   `Free`, and to mainline code once it is `Complete`, until
//!   [`rx_clear`](crate::driver::Rfm12::rx_clear) hands it back.

use heapless::Vec;

use crate::checksum::{header_checksum, header_valid};
use crate::consts::{MAX_PAYLOAD_LEN_USIZE, SYNC_LEN, SYNC_LSB, SYNC_MSB, TRAILER};

/// Status tag of a receive slot.
///
/// The "being filled" condition is implied by the slot being the handler's
/// fill target and is not stored.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum BufferStatus {
    /// Available to the interrupt handler.
    #[default]
    Free,
    /// Holds a fully received packet that mainline code has not released yet.
    Complete,
}

/// The single outgoing packet, laid out in wire order.
#[derive(Debug, Clone)]
pub struct TxBuffer {
    sync: [u8; SYNC_LEN as usize],
    len: u8,
    packet_type: u8,
    checksum: u8,
    data: [u8; MAX_PAYLOAD_LEN_USIZE],
}

impl Default for TxBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TxBuffer {
    const HEADER_START: u16 = SYNC_LEN as u16;
    const PAYLOAD_START: u16 = Self::HEADER_START + 3;

    /// Creates an empty buffer with the sync pattern already in place.
    pub const fn new() -> Self {
        Self {
            sync: [SYNC_MSB, SYNC_LSB],
            len: 0,
            packet_type: 0,
            checksum: 0,
            data: [0; MAX_PAYLOAD_LEN_USIZE],
        }
    }

    /// Writes the header for a payload of `len` bytes already in the data area.
    pub(crate) fn set_header(&mut self, packet_type: u8, len: u8) {
        self.len = len;
        self.packet_type = packet_type;
        self.checksum = header_checksum(len, packet_type);
    }

    /// Payload storage.
    pub(crate) fn data_mut(&mut self) -> &mut [u8; MAX_PAYLOAD_LEN_USIZE] {
        &mut self.data
    }

    /// Payload length of the queued packet.
    pub fn len(&self) -> u8 {
        self.len
    }

    /// `true` when the queued payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Type byte of the queued packet.
    pub fn packet_type(&self) -> u8 {
        self.packet_type
    }

    /// Checksum byte of the queued packet.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// The queued payload.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// Returns the byte transmitted at position `index`, counted from the
    /// first sync byte.
    ///
    /// Positions past the payload yield the trailer byte.
    pub fn byte_at(&self, index: u16) -> u8 {
        match index {
            0 | 1 => self.sync[index as usize],
            2 => self.len,
            3 => self.packet_type,
            4 => self.checksum,
            i => {
                let offset = (i - Self::PAYLOAD_START) as usize;
                if offset < self.len as usize {
                    self.data[offset]
                } else {
                    TRAILER
                }
            }
        }
    }
}

/// One half of the receive double buffer.
#[derive(Debug, Clone, Default)]
pub struct RxSlot {
    pub(crate) status: BufferStatus,
    len: u8,
    packet_type: u8,
    checksum: u8,
    payload: Vec<u8, MAX_PAYLOAD_LEN_USIZE>,
}

impl RxSlot {
    /// Claims the slot for a new packet whose length byte has just arrived.
    pub(crate) fn begin(&mut self, len: u8) {
        self.len = len;
        self.packet_type = 0;
        self.checksum = 0;
        self.payload.clear();
    }

    /// Stores the byte at position `offset`, counted from the length byte.
    ///
    /// Payload bytes beyond the slot capacity are discarded.
    pub(crate) fn store(&mut self, offset: u16, byte: u8) {
        match offset {
            0 => self.len = byte,
            1 => self.packet_type = byte,
            2 => self.checksum = byte,
            _ => {
                let _ = self.payload.push(byte);
            }
        }
    }

    /// Current status tag.
    pub fn status(&self) -> BufferStatus {
        self.status
    }

    /// Payload length announced by the sender.
    pub fn len(&self) -> u8 {
        self.len
    }

    /// `true` when the announced payload length is zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packet type byte.
    pub fn packet_type(&self) -> u8 {
        self.packet_type
    }

    /// Header checksum byte as received.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Whether the received header passes the checksum.
    ///
    /// Always `true` for packets accepted with checksum verification on.
    pub fn header_valid(&self) -> bool {
        header_valid(self.len, self.packet_type, self.checksum)
    }

    /// Stored payload, at most [`MAX_PAYLOAD_LEN`](crate::consts::MAX_PAYLOAD_LEN) bytes.
    pub fn data(&self) -> &[u8] {
        &self.payload
    }
}
