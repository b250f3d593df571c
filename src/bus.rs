//! Command interface to the transceiver.
//!
//! The RFM12 speaks in 16-bit command words: every transfer clocks one word
//! out and one 16-bit response in. Register writes ignore the response,
//! status and FIFO reads use it. [`Rfm12Bus`] is the only way the driver
//! touches the chip, so a board can substitute its own transport (bit-banged
//! SPI, a shared bus, a simulator) for [`SpiInterface`].

use embedded_hal::spi::SpiDevice;

/// A synchronous, non-reentrant command transfer.
pub trait Rfm12Bus {
    /// Transport error.
    type Error: embedded_hal::spi::Error;

    /// Sends `command` MSB first and returns the word clocked back.
    fn transfer(&mut self, command: u16) -> Result<u16, Self::Error>;
}

impl<T: Rfm12Bus + ?Sized> Rfm12Bus for &mut T {
    type Error = T::Error;

    fn transfer(&mut self, command: u16) -> Result<u16, Self::Error> {
        T::transfer(self, command)
    }
}

/// [`Rfm12Bus`] over an `embedded-hal` [`SpiDevice`].
///
/// Each command is one SPI transaction, so chip select is released between
/// words as the RFM12 requires.
#[derive(Debug)]
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> SpiInterface<SPI> {
    /// Wraps an SPI device (mode 0, at most 2.5 MHz for FIFO reads).
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Returns the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> Rfm12Bus for SpiInterface<SPI> {
    type Error = SPI::Error;

    fn transfer(&mut self, command: u16) -> Result<u16, Self::Error> {
        let mut word = command.to_be_bytes();
        self.spi.transfer_in_place(&mut word)?;
        Ok(u16::from_be_bytes(word))
    }
}
