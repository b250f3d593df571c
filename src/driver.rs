//! Packet driver for RFM12 FSK transceivers.
//!
//! This module provides the [`Rfm12`] struct, which owns the bus, the
//! interrupt line, the packet buffers and the protocol state. It exposes the
//! mainline API:
//!
//! - [`enqueue()`](Rfm12::enqueue) / [`start_tx()`](Rfm12::start_tx) to queue one packet
//! - [`rx_status()`](Rfm12::rx_status), [`rx_len()`](Rfm12::rx_len),
//!   [`rx_type()`](Rfm12::rx_type), [`rx_data()`](Rfm12::rx_data) and
//!   [`rx_clear()`](Rfm12::rx_clear) to consume received packets
//!
//! and the two entry points that drive the link:
//!
//! - [`handle_interrupt()`](Rfm12::handle_interrupt), called from the ISR of
//!   the chip's nIRQ line (or [`poll()`](Rfm12::poll) in polling builds)
//! - [`tick()`](Rfm12::tick), called periodically from mainline code to
//!   sense the channel and start queued transmissions
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
//! # use embedded_hal_mock::eh1::digital::Mock as Pin;
//! use rfm12::{Config, NoIrq, Rfm12, SpiInterface};
//!
//! # let spi: SpiMock<u8> = SpiMock::new(&[]);
//! let mut radio: Rfm12<_, _, Pin> =
//!     Rfm12::new(SpiInterface::new(spi), NoIrq, None, Config::default());
//! assert!(radio.enqueue(0x01, b"hello").is_ok());
//! assert!(radio.enqueue(0x01, b"again").is_err());
//! # radio.release().0.release().done();
//! ```
//!
//! ## Design Notes
//!
//! Every bus transaction that may run concurrently with the handler happens
//! while the interrupt source is masked. The mask is held by a scoped guard
//! that unmasks on drop, so early returns through `?` cannot leave the line
//! disabled.

use core::convert::Infallible;
use core::ops::{Deref, DerefMut};

use embedded_hal::digital::OutputPin;

use crate::buffer::{BufferStatus, RxSlot, TxBuffer};
use crate::bus::Rfm12Bus;
use crate::config::Config;
use crate::consts::{MAX_PAYLOAD_LEN_USIZE, RX_SLOTS};
use crate::error::Error;
use crate::irq::IrqLine;
use crate::state::{ControlState, ProtocolState, Register, ShadowRegisters, Stats, TxState};

/// An interrupt-driven packet driver for one RFM12 transceiver.
///
/// ## Type Parameters
///
/// - `BUS`: the command transport, usually [`SpiInterface`](crate::bus::SpiInterface)
/// - `IRQ`: masks the chip's interrupt line, [`NoIrq`](crate::irq::NoIrq) when polling
/// - `PTT`: optional output switching an external amplifier or antenna relay
///   into transmit (RFM12BP style boards)
///
/// ## Notes
///
/// - Only one `Rfm12` instance should exist per transceiver.
/// - Nothing is sent unless [`tick()`](Rfm12::tick) is called regularly.
#[derive(Debug)]
pub struct Rfm12<BUS, IRQ, PTT>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    /// Command transport
    pub bus: BUS,
    /// Interrupt line control
    pub irq: IRQ,
    /// Push To Talk (PTT) pin
    pub ptt: Option<PTT>,
    pub(crate) config: Config,
    pub(crate) state: ControlState,
    pub(crate) shadow: ShadowRegisters,
    pub(crate) tx_buffer: TxBuffer,
    pub(crate) rx_buffers: [RxSlot; RX_SLOTS],
    pub(crate) stats: Stats,
}

/// Keeps the interrupt source masked for as long as it is alive.
pub(crate) struct Masked<'a, BUS, IRQ, PTT>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    radio: &'a mut Rfm12<BUS, IRQ, PTT>,
}

impl<'a, BUS, IRQ, PTT> Masked<'a, BUS, IRQ, PTT>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    fn new(radio: &'a mut Rfm12<BUS, IRQ, PTT>) -> Self {
        radio.irq.mask();
        Self { radio }
    }
}

impl<BUS, IRQ, PTT> Drop for Masked<'_, BUS, IRQ, PTT>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    fn drop(&mut self) {
        self.radio.irq.unmask();
    }
}

impl<BUS, IRQ, PTT> Deref for Masked<'_, BUS, IRQ, PTT>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    type Target = Rfm12<BUS, IRQ, PTT>;

    fn deref(&self) -> &Self::Target {
        &*self.radio
    }
}

impl<BUS, IRQ, PTT> DerefMut for Masked<'_, BUS, IRQ, PTT>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.radio
    }
}

impl<BUS, IRQ, PTT> Rfm12<BUS, IRQ, PTT>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    /// Creates a driver without touching the hardware.
    ///
    /// Call [`init()`](Rfm12::init) before enabling the interrupt.
    pub fn new(bus: BUS, irq: IRQ, ptt: Option<PTT>, config: Config) -> Self {
        Self {
            bus,
            irq,
            ptt,
            state: ControlState::new(config.channel_free_time),
            shadow: ShadowRegisters::from_init_sequence(config.init_sequence),
            config,
            tx_buffer: TxBuffer::new(),
            rx_buffers: Default::default(),
            stats: Stats::default(),
        }
    }

    /// Resets the driver state, applies the init sequence and starts receiving.
    ///
    /// # Behavior
    /// - Masks the interrupt line for the duration of the call
    /// - Writes every word of [`Config::init_sequence`] in order
    /// - Switches the power management register to [`Config::receive_mode`]
    /// - Clears pending interrupt flags and arms the FIFO (unless transmit-only)
    /// - Unmasks the interrupt line on return, including on error
    pub fn init(&mut self) -> Result<(), Error> {
        let mut radio = self.masked();
        radio.write_ptt(false);
        radio.state = ControlState::new(radio.config.channel_free_time);
        radio.tx_buffer = TxBuffer::new();
        radio.rx_buffers = Default::default();

        let sequence = radio.config.init_sequence;
        for &word in sequence {
            radio.write(word)?;
        }
        radio.shadow = ShadowRegisters::from_init_sequence(sequence);
        let mode = radio.config.receive_mode();
        radio.write_register(Register::PowerManagement, mode)?;

        let commands = radio.config.commands;
        let _ = radio.command(commands.status)?;
        if !radio.config.transmit_only {
            radio.write(commands.fifo_clear)?;
            radio.write(commands.fifo_accept)?;
        }
        info!("rfm12: initialised with {} init words", sequence.len());
        Ok(())
    }

    /// Consumes the driver and returns its hardware.
    pub fn release(self) -> (BUS, IRQ, Option<PTT>) {
        (self.bus, self.irq, self.ptt)
    }

    pub(crate) fn masked(&mut self) -> Masked<'_, BUS, IRQ, PTT> {
        Masked::new(self)
    }

    pub(crate) fn command(&mut self, command: u16) -> Result<u16, Error> {
        self.bus.transfer(command).map_err(Error::bus)
    }

    pub(crate) fn write(&mut self, command: u16) -> Result<(), Error> {
        self.command(command).map(|_| ())
    }

    /// Writes a full register word and records it in the shadow copy.
    pub(crate) fn write_register(&mut self, register: Register, word: u16) -> Result<(), Error> {
        self.write(word)?;
        self.shadow.record(register, word);
        Ok(())
    }

    pub(crate) fn write_ptt(&mut self, transmit: bool) {
        let level = transmit != self.config.ptt_inverted;
        if let Some(ref mut ptt) = self.ptt {
            if level {
                let _ = ptt.set_high();
            } else {
                let _ = ptt.set_low();
            }
        }
    }

    /// Changes bits of a configuration register without rebuilding the word.
    ///
    /// The new value is `(shadow & !clear) | set`; the register's command
    /// bits are always preserved. The write happens with the interrupt masked.
    ///
    /// # Example
    /// ```rust
    /// # use embedded_hal_mock::eh1::spi::Mock as SpiMock;
    /// # use embedded_hal_mock::eh1::digital::Mock as Pin;
    /// # use embedded_hal_mock::eh1::spi::Transaction as T;
    /// use rfm12::{Config, NoIrq, Rfm12, SpiInterface, state::Register};
    ///
    /// # let spi: SpiMock<u8> = SpiMock::new(&[T::transaction_start(), T::transfer_in_place(vec![0x98, 0x57], vec![0, 0]), T::transaction_end()]);
    /// let mut radio: Rfm12<_, _, Pin> =
    ///     Rfm12::new(SpiInterface::new(spi), NoIrq, None, Config::default());
    /// // Lowest output power
    /// radio.modify_register(Register::TxConfig, 0x0007, 0x0007).unwrap();
    /// assert_eq!(radio.shadow_registers().txconf, 0x9857);
    /// # radio.release().0.release().done();
    /// ```
    pub fn modify_register(&mut self, register: Register, clear: u16, set: u16) -> Result<(), Error> {
        let command_bits = register.command_mask();
        let current = self.shadow.get(register);
        let word = (((current & !clear) | set) & !command_bits) | register.command();
        let mut radio = self.masked();
        radio.write_register(register, word)
    }

    /// Copies `payload` into the transmit buffer and queues it.
    ///
    /// Does not start the transmission; [`tick()`](Rfm12::tick) does once the
    /// channel is free.
    ///
    /// # Errors
    /// - [`Error::TooLarge`] if the payload exceeds
    ///   [`MAX_PAYLOAD_LEN`](crate::consts::MAX_PAYLOAD_LEN)
    /// - [`Error::Busy`] if a packet is already queued
    ///
    /// The transmit buffer is left untouched on error.
    pub fn enqueue(&mut self, packet_type: u8, payload: &[u8]) -> Result<(), Error> {
        if payload.len() > MAX_PAYLOAD_LEN_USIZE {
            return Err(Error::TooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN_USIZE,
            });
        }
        let data = self.tx_buffer_mut().ok_or(Error::Busy)?;
        data[..payload.len()].copy_from_slice(payload);
        // Fits: checked against MAX_PAYLOAD_LEN above.
        self.start_tx(packet_type, payload.len() as u8)
    }

    /// Direct access to the transmit payload storage, for building a packet
    /// in place before [`start_tx()`](Rfm12::start_tx).
    ///
    /// Returns `None` while a packet is queued or being sent.
    pub fn tx_buffer_mut(&mut self) -> Option<&mut [u8; MAX_PAYLOAD_LEN_USIZE]> {
        match self.state.tx_request {
            TxState::Free => Some(self.tx_buffer.data_mut()),
            TxState::Occupied => None,
        }
    }

    /// Queues the first `len` bytes already in the transmit buffer.
    ///
    /// # Errors
    /// Same as [`enqueue()`](Rfm12::enqueue).
    pub fn start_tx(&mut self, packet_type: u8, len: u8) -> Result<(), Error> {
        if usize::from(len) > MAX_PAYLOAD_LEN_USIZE {
            return Err(Error::TooLarge {
                len: usize::from(len),
                max: MAX_PAYLOAD_LEN_USIZE,
            });
        }
        if self.state.tx_request != TxState::Free {
            return Err(Error::Busy);
        }
        self.tx_buffer.set_header(packet_type, len);
        self.state.tx_request = TxState::Occupied;
        trace!("rfm12: queued {} byte packet of type {}", len, packet_type);
        Ok(())
    }

    /// Non-blocking check for completion of the queued packet.
    ///
    /// Returns `WouldBlock` until the transmit buffer is free again, so it can
    /// be used with `nb::block!` from code that does not hold the driver
    /// across the interrupt.
    pub fn tx_done(&self) -> nb::Result<(), Infallible> {
        match self.state.tx_request {
            TxState::Free => Ok(()),
            TxState::Occupied => Err(nb::Error::WouldBlock),
        }
    }

    /// Ownership state of the transmit buffer.
    pub fn tx_state(&self) -> TxState {
        self.state.tx_request
    }

    /// The packet currently in the transmit buffer.
    pub fn tx_buffer(&self) -> &TxBuffer {
        &self.tx_buffer
    }

    fn rx_slot(&self) -> &RxSlot {
        &self.rx_buffers[self.state.buffer_out]
    }

    fn rx_complete(&self) -> Option<&RxSlot> {
        let slot = self.rx_slot();
        match slot.status {
            BufferStatus::Complete => Some(slot),
            BufferStatus::Free => None,
        }
    }

    /// Status of the receive slot exposed to the application.
    pub fn rx_status(&self) -> BufferStatus {
        self.rx_slot().status
    }

    /// Announced payload length of the received packet, if one is complete.
    ///
    /// May exceed the length of [`rx_data()`](Rfm12::rx_data) when the
    /// sender's packet was larger than a receive slot.
    pub fn rx_len(&self) -> Option<u8> {
        self.rx_complete().map(RxSlot::len)
    }

    /// Type byte of the received packet, if one is complete.
    pub fn rx_type(&self) -> Option<u8> {
        self.rx_complete().map(RxSlot::packet_type)
    }

    /// Payload of the received packet, if one is complete.
    pub fn rx_data(&self) -> Option<&[u8]> {
        self.rx_complete().map(RxSlot::data)
    }

    /// The complete receive slot, if any.
    pub fn rx_packet(&self) -> Option<&RxSlot> {
        self.rx_complete()
    }

    /// Releases the current receive slot and exposes the other one.
    ///
    /// # Errors
    /// [`Error::NotComplete`] if the current slot holds no complete packet.
    /// Nothing changes in that case, so a slot still being filled is never
    /// skipped over or exposed.
    pub fn rx_clear(&mut self) -> Result<(), Error> {
        let index = self.state.buffer_out;
        let slot = &mut self.rx_buffers[index];
        if slot.status != BufferStatus::Complete {
            return Err(Error::NotComplete);
        }
        slot.status = BufferStatus::Free;
        self.state.buffer_out ^= 1;
        Ok(())
    }

    /// Current state of the protocol machine.
    pub fn protocol_state(&self) -> ProtocolState {
        self.state.protocol
    }

    /// Link statistics.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Last written value of each configuration register.
    pub fn shadow_registers(&self) -> &ShadowRegisters {
        &self.shadow
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
