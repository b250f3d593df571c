//! Error type returned by the driver's mainline API.
//!
//! Packet loss on the air (corrupt headers, both receive slots full) is not
//! an error: those packets are dropped silently and only counted in
//! [`Stats`](crate::state::Stats).

use embedded_hal::spi::ErrorKind;
use thiserror::Error;

/// Errors reported synchronously to the caller.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// A packet is already queued or in flight. Retry once it has been sent.
    #[error("a packet is already queued for transmission")]
    Busy,
    /// The payload does not fit into the transmit buffer.
    #[error("payload of {len} bytes exceeds the {max} byte transmit buffer")]
    TooLarge {
        /// Requested payload length
        len: usize,
        /// Transmit buffer capacity
        max: usize,
    },
    /// `rx_clear` was called while the exposed receive slot held no complete packet.
    #[error("no complete packet in the current receive buffer")]
    NotComplete,
    /// The bus transfer to the transceiver failed.
    #[error("bus transfer failed: {0}")]
    Bus(ErrorKind),
}

impl Error {
    /// Builds a [`Error::Bus`] from any `embedded-hal` SPI error.
    pub fn bus<E: embedded_hal::spi::Error>(err: E) -> Self {
        Error::Bus(err.kind())
    }
}
