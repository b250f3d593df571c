//! A simulated RFM12 for unit tests.
//!
//! Models just enough of the chip for the protocol machine: a receive FIFO
//! (emptied by the FIFO clear command), the TX register ready flag, the
//! carrier (RSSI) status bit and the transmitter enable bit. Every command
//! word other than status and FIFO reads is logged, along with whether the
//! interrupt line was masked.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::spi::ErrorKind;

use crate::bus::Rfm12Bus;
use crate::config::Config;
use crate::driver::Rfm12;
use crate::irq::IrqLine;
use crate::state::ProtocolState;

#[derive(Debug, Default)]
pub(crate) struct ChipState {
    /// Bytes waiting in the receive FIFO.
    pub(crate) rx_fifo: VecDeque<u8>,
    /// Carrier detected.
    pub(crate) carrier: bool,
    /// TX register empty and waiting for the next byte.
    pub(crate) tx_ready: bool,
    /// Transmitter enable bit of the last power management write.
    pub(crate) transmitting: bool,
    /// Every byte written to the TX register.
    pub(crate) on_air: Vec<u8>,
    /// Every command word other than status and FIFO reads.
    pub(crate) writes: Vec<u16>,
    /// Writes issued while the interrupt line was not masked.
    pub(crate) unmasked_writes: Vec<u16>,
    /// FIFO clear commands seen.
    pub(crate) fifo_resets: usize,
    pub(crate) masked: bool,
    pub(crate) mask_count: usize,
    pub(crate) unmask_count: usize,
    /// Transfers left before the bus starts failing.
    pub(crate) fail_after: Option<usize>,
    /// Only the transfer at `fail_after` fails; later ones succeed again.
    pub(crate) fail_once: bool,
}

pub(crate) type Chip = Arc<Mutex<ChipState>>;

#[derive(Debug)]
pub(crate) struct SimError;

impl embedded_hal::spi::Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug)]
pub(crate) struct SimBus(Chip);

impl Rfm12Bus for SimBus {
    type Error = SimError;

    fn transfer(&mut self, command: u16) -> Result<u16, SimError> {
        let mut chip = self.0.lock().unwrap();
        match chip.fail_after {
            Some(0) => {
                if chip.fail_once {
                    chip.fail_after = None;
                }
                return Err(SimError);
            }
            Some(remaining) => chip.fail_after = Some(remaining - 1),
            None => {}
        }

        match command {
            0x0000 => {
                let ready = if chip.transmitting {
                    chip.tx_ready
                } else {
                    !chip.rx_fifo.is_empty()
                };
                let mut status = 0;
                if ready {
                    status |= 0x8000;
                }
                if chip.carrier {
                    status |= 0x0100;
                }
                return Ok(status);
            }
            0xB000 => return Ok(u16::from(chip.rx_fifo.pop_front().unwrap_or(0))),
            _ => {}
        }

        match command & 0xFF00 {
            0xB800 => {
                chip.on_air.push(command.to_be_bytes()[1]);
                chip.tx_ready = false;
            }
            0x8200 => chip.transmitting = command & 0x0020 != 0,
            _ if command == 0xCA81 => {
                chip.rx_fifo.clear();
                chip.fifo_resets += 1;
            }
            _ => {}
        }
        chip.writes.push(command);
        if !chip.masked {
            chip.unmasked_writes.push(command);
        }
        Ok(0)
    }
}

#[derive(Debug)]
pub(crate) struct SimIrq(Chip);

impl IrqLine for SimIrq {
    fn mask(&mut self) {
        let mut chip = self.0.lock().unwrap();
        assert!(!chip.masked, "interrupt masked twice");
        chip.masked = true;
        chip.mask_count += 1;
    }

    fn unmask(&mut self) {
        let mut chip = self.0.lock().unwrap();
        assert!(chip.masked, "interrupt unmasked while not masked");
        chip.masked = false;
        chip.unmask_count += 1;
    }
}

/// A PTT pin that is not connected.
#[derive(Debug, Default)]
pub(crate) struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

pub(crate) type SimRadio = Rfm12<SimBus, SimIrq, NoPin>;

pub(crate) fn hardware() -> (SimBus, SimIrq, Chip) {
    let chip = Chip::default();
    (SimBus(Arc::clone(&chip)), SimIrq(Arc::clone(&chip)), chip)
}

/// An initialised driver on a simulated chip.
pub(crate) fn radio(config: Config) -> (SimRadio, Chip) {
    let (bus, irq, chip) = hardware();
    let mut radio = Rfm12::new(bus, irq, None, config);
    radio.init().unwrap();
    (radio, chip)
}

/// Delivers `bytes` to the receive FIFO one interrupt at a time.
pub(crate) fn receive(radio: &mut SimRadio, chip: &Chip, bytes: &[u8]) {
    for &byte in bytes {
        chip.lock().unwrap().rx_fifo.push_back(byte);
        radio.handle_interrupt().unwrap();
    }
}

/// Clocks the TX register until the driver leaves `Transmitting`.
///
/// Returns the number of interrupts it took.
pub(crate) fn transmit(radio: &mut SimRadio, chip: &Chip) -> usize {
    let mut interrupts = 0;
    while radio.protocol_state() == ProtocolState::Transmitting {
        assert!(interrupts < 1_000, "transmission never finished");
        chip.lock().unwrap().tx_ready = true;
        radio.handle_interrupt().unwrap();
        interrupts += 1;
    }
    interrupts
}

/// Runs `tick()` until the driver starts transmitting.
///
/// Returns the number of ticks, or `None` if it did not start within `limit`.
pub(crate) fn tick_until_transmitting(radio: &mut SimRadio, limit: usize) -> Option<usize> {
    for ticks in 1..=limit {
        radio.tick().unwrap();
        if radio.protocol_state() == ProtocolState::Transmitting {
            return Some(ticks);
        }
    }
    None
}
