//! Control state shared by the interrupt handler and mainline code.
//!
//! Everything in `ControlState` is mutated either by the interrupt handler
//! or by the scheduler's transmit-arming step, which runs with the interrupt
//! source masked. Mainline accessors only read it.

use crate::checksum::HeaderCheck;

/// State of the interrupt-driven protocol machine.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ProtocolState {
    /// Waiting for the length byte of the next packet. The only state in
    /// which mainline code may start a transmission.
    #[default]
    ReceiveIdle,
    /// Shifting in the header and payload of a packet.
    ReceiveActive,
    /// Shifting out the queued packet.
    Transmitting,
}

/// Ownership tag of the transmit buffer.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TxState {
    /// Owned by mainline code; a new packet may be enqueued.
    #[default]
    Free,
    /// Owned by the driver until the packet has been sent.
    Occupied,
}

/// Outcome of one state machine transition.
///
/// `Completed` sends the handler down the reset path (FIFO re-armed, state
/// back to [`ProtocolState::ReceiveIdle`]); `AwaitingMore` leaves the chip as
/// is because more bytes of the current packet are expected.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Step {
    /// The current packet is finished or was dropped.
    Completed,
    /// More bytes of the current packet are expected.
    AwaitingMore,
}

/// Persistent protocol state.
#[derive(Debug, Clone)]
pub(crate) struct ControlState {
    /// Current protocol state.
    pub(crate) protocol: ProtocolState,
    /// Bytes of the current packet already shifted in or out.
    pub(crate) byte_count: u16,
    /// Bytes the current packet occupies on the wire.
    pub(crate) total_bytes: u16,
    /// Receive slot currently being filled.
    pub(crate) buffer_in: usize,
    /// Receive slot currently exposed to mainline code.
    pub(crate) buffer_out: usize,
    /// Transmit buffer ownership.
    pub(crate) tx_request: TxState,
    /// Running header checksum of the packet being received.
    pub(crate) checksum: HeaderCheck,
    /// Clear ticks still required before the channel counts as free.
    pub(crate) channel_free_count: u8,
}

impl ControlState {
    /// Fresh state: idle, both indices on slot 0, nothing queued.
    pub(crate) const fn new(channel_free_time: u8) -> Self {
        Self {
            protocol: ProtocolState::ReceiveIdle,
            byte_count: 0,
            total_bytes: 0,
            buffer_in: 0,
            buffer_out: 0,
            tx_request: TxState::Free,
            checksum: HeaderCheck::seed(0),
            channel_free_count: channel_free_time,
        }
    }
}

/// Link statistics. All counters wrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Stats {
    /// Packets transmitted in full.
    pub tx_good: u16,
    /// Packets received into a slot and marked complete.
    pub rx_good: u16,
    /// Packets dropped because the header checksum did not match.
    pub rx_bad_checksum: u16,
    /// Packets dropped because the fill target slot was still occupied.
    pub rx_dropped_full: u16,
}

/// Configuration registers that can be modified bit-wise after init.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Register {
    /// Power management (`0x82xx`).
    PowerManagement,
    /// Configuration setting: band, crystal load, FIFO enables (`0x80xx`).
    Configuration,
    /// Receiver control: bandwidth, LNA gain, RSSI threshold (`0x9xxx`).
    ReceiverControl,
    /// Automatic frequency control (`0xC4xx`).
    Afc,
    /// TX configuration: deviation and output power (`0x98xx`).
    TxConfig,
}

impl Register {
    /// All registers with a shadow copy.
    pub const ALL: [Register; 5] = [
        Register::PowerManagement,
        Register::Configuration,
        Register::ReceiverControl,
        Register::Afc,
        Register::TxConfig,
    ];

    /// Mask selecting the command bits of this register.
    pub const fn command_mask(self) -> u16 {
        match self {
            Register::PowerManagement | Register::Configuration | Register::Afc => 0xFF00,
            Register::ReceiverControl => 0xF800,
            Register::TxConfig => 0xFE00,
        }
    }

    /// Command bits identifying this register.
    pub const fn command(self) -> u16 {
        match self {
            Register::PowerManagement => 0x8200,
            Register::Configuration => 0x8000,
            Register::ReceiverControl => 0x9000,
            Register::Afc => 0xC400,
            Register::TxConfig => 0x9800,
        }
    }

    /// Returns `true` if `word` is a write to this register.
    pub const fn matches(self, word: u16) -> bool {
        word & self.command_mask() == self.command()
    }
}

/// Last written value of each configuration register.
///
/// Lets a single bit be changed without rebuilding the whole command word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowRegisters {
    /// Power management.
    pub pwrmgt: u16,
    /// Configuration setting.
    pub cfg: u16,
    /// Receiver control.
    pub rxctrl: u16,
    /// Automatic frequency control.
    pub afc: u16,
    /// TX configuration.
    pub txconf: u16,
}

impl ShadowRegisters {
    /// Shadows holding only the command bits of each register.
    pub const fn new() -> Self {
        Self {
            pwrmgt: Register::PowerManagement.command(),
            cfg: Register::Configuration.command(),
            rxctrl: Register::ReceiverControl.command(),
            afc: Register::Afc.command(),
            txconf: Register::TxConfig.command(),
        }
    }

    /// Seeds the shadows from an init sequence; the last write to each register wins.
    pub fn from_init_sequence(sequence: &[u16]) -> Self {
        let mut shadows = Self::new();
        for &word in sequence {
            if let Some(register) = Register::ALL.into_iter().find(|r| r.matches(word)) {
                shadows.record(register, word);
            }
        }
        shadows
    }

    /// Value last written to `register`.
    pub fn get(&self, register: Register) -> u16 {
        match register {
            Register::PowerManagement => self.pwrmgt,
            Register::Configuration => self.cfg,
            Register::ReceiverControl => self.rxctrl,
            Register::Afc => self.afc,
            Register::TxConfig => self.txconf,
        }
    }

    pub(crate) fn record(&mut self, register: Register, word: u16) {
        let slot = match register {
            Register::PowerManagement => &mut self.pwrmgt,
            Register::Configuration => &mut self.cfg,
            Register::ReceiverControl => &mut self.rxctrl,
            Register::Afc => &mut self.afc,
            Register::TxConfig => &mut self.txconf,
        };
        *slot = word;
    }
}

impl Default for ShadowRegisters {
    fn default() -> Self {
        Self::new()
    }
}
