//! Driver configuration.
//!
//! The driver does not pick frequency, data rate, power or filter settings.
//! Those arrive as an init sequence of raw command words, applied once by
//! [`Rfm12::init`](crate::driver::Rfm12::init). The numeric encodings of the
//! few commands and status bits the state machine itself needs live in
//! [`Commands`].
//!
//! Build-time switches of classic RFM12 libraries (collision detection,
//! transmit-only, checksum verification) are plain fields of [`Config`].

use crate::consts::CHANNEL_FREE_TIME;

/// Command words and status bits the driver issues or interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Commands {
    /// Status read. Reading clears the interrupt flags.
    pub status: u16,
    /// Status bit set when the FIFO holds a byte (RX) or the TX register is ready.
    pub status_ready: u16,
    /// Status bit set while the received signal strength is above threshold.
    pub status_carrier: u16,
    /// Receiver FIFO read; the byte arrives in the low half of the response.
    pub fifo_read: u16,
    /// Transmitter register write; OR the byte into the low half.
    pub tx_write: u16,
    /// FIFO and reset mode with FIFO fill disabled (clears the FIFO).
    pub fifo_clear: u16,
    /// FIFO and reset mode with fill-on-sync enabled.
    pub fifo_accept: u16,
    /// Power management word with the receiver chain on.
    pub pwrmgt_receive: u16,
    /// Power management word with the receiver chain off (transmit-only builds).
    pub pwrmgt_idle: u16,
    /// Transmitter enable bit of the power management register.
    pub pwrmgt_transmit: u16,
}

impl Commands {
    /// Encodings of the RFM12 / RFM12B.
    pub const RFM12: Commands = Commands {
        status: 0x0000,
        status_ready: 0x8000,
        status_carrier: 0x0100,
        fifo_read: 0xB000,
        tx_write: 0xB800,
        fifo_clear: 0xCA81,
        fifo_accept: 0xCA83,
        pwrmgt_receive: 0x82D9,
        pwrmgt_idle: 0x8201,
        pwrmgt_transmit: 0x0020,
    };
}

impl Default for Commands {
    fn default() -> Self {
        Self::RFM12
    }
}

/// 868.3 MHz, 9600 baud, 90 kHz deviation, 134 kHz receiver bandwidth.
///
/// The power management register is written in its idle form here; the
/// driver switches on the receiver once the sequence has been applied.
pub const DEFAULT_INIT_SEQUENCE: &[u16] = &[
    // Data register and FIFO enabled, 868 MHz band, 12 pF crystal load
    0x80E7,
    // Clock output off
    0x8201,
    // 868.300 MHz
    0xA67C,
    // 9579 baud
    0xC623,
    // VDI output, fast VDI, 134 kHz, 0 dB LNA, -97 dBm RSSI threshold
    0x94A2,
    // Auto clock recovery lock, digital filter, DQD 3
    0xC2AB,
    // FIFO interrupt at 8 bits, fill on 2-byte sync, sensitive reset off
    0xCA81,
    // AFC: keep offset while VDI high, +3/-4 limit, fine mode, enabled
    0xC4F7,
    // 90 kHz deviation, 0 dBm
    0x9850,
    // Low duty cycle mode off
    0xC800,
    // Wake-up timer off
    0xE000,
];

/// Runtime configuration of [`Rfm12`](crate::driver::Rfm12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Config {
    /// Sense the carrier before transmitting. Disable on a private channel.
    pub collision_avoidance: bool,
    /// Consecutive carrier-free ticks required before a transmission starts.
    pub channel_free_time: u8,
    /// Never enable the receiver; FIFO events outside a transmission are ignored.
    pub transmit_only: bool,
    /// Drop packets whose header checksum does not match.
    pub verify_checksum: bool,
    /// Drive the PTT pin low while transmitting.
    pub ptt_inverted: bool,
    /// Chip command encodings.
    pub commands: Commands,
    /// Register writes applied by `init`.
    pub init_sequence: &'static [u16],
}

impl Config {
    /// Default configuration, usable in `const` context.
    pub const fn new() -> Self {
        Self {
            collision_avoidance: true,
            channel_free_time: CHANNEL_FREE_TIME,
            transmit_only: false,
            verify_checksum: true,
            ptt_inverted: false,
            commands: Commands::RFM12,
            init_sequence: DEFAULT_INIT_SEQUENCE,
        }
    }

    /// Power management word the chip returns to between transmissions.
    pub const fn receive_mode(&self) -> u16 {
        if self.transmit_only {
            self.commands.pwrmgt_idle
        } else {
            self.commands.pwrmgt_receive
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
