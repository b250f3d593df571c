//! Collision-avoidance transmit scheduler.
//!
//! [`Rfm12::tick`] is the only place a transmission starts. With collision
//! avoidance enabled it samples the chip's carrier (RSSI) status bit once per
//! call and only arms the transmitter after the channel has been quiet for
//! [`Config::channel_free_time`](crate::config::Config::channel_free_time)
//! consecutive ticks.

use embedded_hal::digital::OutputPin;

use crate::bus::Rfm12Bus;
use crate::consts::{PREAMBLE, PREAMBLE_LEN, TX_OVERHEAD};
use crate::driver::Rfm12;
use crate::error::Error;
use crate::irq::IrqLine;
use crate::state::{ProtocolState, Register, TxState};

impl<BUS, IRQ, PTT> Rfm12<BUS, IRQ, PTT>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    /// Senses the channel and starts the queued transmission once it is free.
    ///
    /// Call periodically from mainline code. The cadence sets how long the
    /// channel has to be quiet before sending: with the default
    /// [`CHANNEL_FREE_TIME`](crate::consts::CHANNEL_FREE_TIME) of 16 and a
    /// 1 ms tick, 16 ms. Skipped calls only delay the transmission.
    ///
    /// # Behavior
    /// - Returns at once unless the machine is in [`ProtocolState::ReceiveIdle`]
    /// - A detected carrier restarts the countdown
    /// - Once the countdown has expired and a packet is queued, writes the
    ///   preamble and switches on the transmitter; the interrupt handler
    ///   sends the rest
    pub fn tick(&mut self) -> Result<(), Error> {
        if self.state.protocol != ProtocolState::ReceiveIdle {
            return Ok(());
        }

        if self.config.collision_avoidance {
            let status = {
                let mut radio = self.masked();
                let command = radio.config.commands.status;
                radio.command(command)?
            };
            if status & self.config.commands.status_carrier != 0 {
                self.state.channel_free_count = self.config.channel_free_time;
                return Ok(());
            }
            if self.state.channel_free_count > 0 {
                self.state.channel_free_count -= 1;
                return Ok(());
            }
        }

        if self.state.tx_request == TxState::Occupied {
            let mut radio = self.masked();
            if let Err(err) = radio.arm_transmission() {
                warn!("rfm12: could not start transmission: {}", err);
                radio.recover();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Hands the queued packet to the interrupt handler. Runs masked.
    fn arm_transmission(&mut self) -> Result<(), Error> {
        let commands = self.config.commands;

        self.state.total_bytes = u16::from(self.tx_buffer.len()) + TX_OVERHEAD;
        self.state.byte_count = 0;
        self.state.protocol = ProtocolState::Transmitting;
        self.write_ptt(true);

        // The TX register is two bytes deep, so the whole preamble fits
        // before the transmitter starts.
        for _ in 0..PREAMBLE_LEN {
            self.write(commands.tx_write | u16::from(PREAMBLE))?;
        }

        let pwrmgt = self.shadow.pwrmgt | commands.pwrmgt_transmit;
        self.write_register(Register::PowerManagement, pwrmgt)?;
        debug!(
            "rfm12: transmitting {} bytes of type {}",
            self.tx_buffer.len(),
            self.tx_buffer.packet_type()
        );
        Ok(())
    }
}
