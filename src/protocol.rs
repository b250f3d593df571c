//! Interrupt-driven protocol state machine.
//!
//! [`Rfm12::handle_interrupt`] runs once per falling edge of the chip's nIRQ
//! line. Each transition function consumes exactly one FIFO event and tells
//! the driving loop whether the current packet is finished
//! ([`Step::Completed`]) or more bytes are expected ([`Step::AwaitingMore`]).
//! Only `Completed` takes the reset path that re-arms the FIFO and returns
//! the machine to [`ProtocolState::ReceiveIdle`].

use embedded_hal::digital::OutputPin;

use crate::buffer::BufferStatus;
use crate::bus::Rfm12Bus;
use crate::checksum::HeaderCheck;
use crate::consts::{FLUSH_BYTE, RX_OVERHEAD};
use crate::driver::Rfm12;
use crate::error::Error;
use crate::irq::IrqLine;
use crate::state::{ProtocolState, Register, Step, TxState};

impl<BUS, IRQ, PTT> Rfm12<BUS, IRQ, PTT>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    /// Services the chip until it stops reporting FIFO events.
    ///
    /// Call this from the interrupt handler of the nIRQ line. The line is
    /// masked for the duration of the call.
    ///
    /// Corrupt headers and packets arriving while both receive slots are full
    /// are dropped silently (see [`stats()`](Rfm12::stats)). A bus error
    /// abandons the packet in flight: the transmitter is switched off, the
    /// FIFO is cleared and re-armed and the machine returns to
    /// [`ProtocolState::ReceiveIdle`]. A queued transmission stays queued and
    /// is retried by the next [`tick()`](Rfm12::tick). The original error is
    /// returned even if the recovery writes fail too.
    pub fn handle_interrupt(&mut self) -> Result<(), Error> {
        let mut radio = self.masked();
        let result = radio.service();
        if let Err(err) = result {
            warn!("rfm12: interrupt aborted: {}", err);
            radio.recover();
        }
        result
    }

    /// Polling-build equivalent of [`handle_interrupt()`](Rfm12::handle_interrupt).
    ///
    /// Call as often as possible; at 9600 baud a byte arrives roughly every
    /// 830 us.
    pub fn poll(&mut self) -> Result<(), Error> {
        self.handle_interrupt()
    }

    fn service(&mut self) -> Result<(), Error> {
        let commands = self.config.commands;
        loop {
            // Reading the status clears the chip's interrupt flags.
            let status = self.command(commands.status)?;
            if status & commands.status_ready == 0 {
                return Ok(());
            }

            let step = match self.state.protocol {
                ProtocolState::ReceiveIdle => self.receive_start()?,
                ProtocolState::ReceiveActive => self.receive_byte()?,
                ProtocolState::Transmitting => self.transmit_byte()?,
            };
            if step == Step::Completed {
                self.finish_packet()?;
            }
        }
    }

    /// Reset path: back to idle with the FIFO cleared and waiting for sync.
    fn finish_packet(&mut self) -> Result<(), Error> {
        self.state.protocol = ProtocolState::ReceiveIdle;
        if !self.config.transmit_only {
            let commands = self.config.commands;
            self.write(commands.fifo_clear)?;
            self.write(commands.fifo_accept)?;
        }
        Ok(())
    }

    /// Best-effort reset after a failed transfer. Runs masked.
    pub(crate) fn recover(&mut self) {
        if self.state.protocol == ProtocolState::Transmitting {
            self.write_ptt(false);
        }
        self.state.protocol = ProtocolState::ReceiveIdle;

        let commands = self.config.commands;
        if self.shadow.pwrmgt & commands.pwrmgt_transmit != 0 {
            let pwrmgt = (self.shadow.pwrmgt & !commands.pwrmgt_transmit) | self.config.receive_mode();
            if let Err(err) = self.write_register(Register::PowerManagement, pwrmgt) {
                warn!("rfm12: could not switch off transmitter: {}", err);
            }
        }
        if let Err(err) = self.finish_packet() {
            warn!("rfm12: could not reset FIFO: {}", err);
        }
    }

    fn read_fifo(&mut self) -> Result<u8, Error> {
        let word = self.command(self.config.commands.fifo_read)?;
        Ok((word & 0x00FF) as u8)
    }

    /// First byte after sync: the length byte.
    fn receive_start(&mut self) -> Result<Step, Error> {
        let len = self.read_fifo()?;
        if self.config.transmit_only {
            return Ok(Step::Completed);
        }

        self.state.checksum = HeaderCheck::seed(len);
        self.state.byte_count = 1;
        self.state.total_bytes = u16::from(len) + RX_OVERHEAD;

        let slot = &mut self.rx_buffers[self.state.buffer_in];
        if slot.status != BufferStatus::Free {
            self.stats.rx_dropped_full = self.stats.rx_dropped_full.wrapping_add(1);
            debug!("rfm12: receive slots full, dropping {} byte packet", len);
            return Ok(Step::Completed);
        }
        slot.begin(len);
        self.state.protocol = ProtocolState::ReceiveActive;
        Ok(Step::AwaitingMore)
    }

    fn receive_byte(&mut self) -> Result<Step, Error> {
        let byte = self.read_fifo()?;
        let index = self.state.buffer_in;

        if self.state.byte_count >= self.state.total_bytes {
            // Trailer byte: the packet is complete.
            self.rx_buffers[index].status = BufferStatus::Complete;
            self.state.buffer_in ^= 1;
            self.stats.rx_good = self.stats.rx_good.wrapping_add(1);
            trace!(
                "rfm12: received {} byte packet into slot {}",
                self.rx_buffers[index].len(),
                index
            );
            return Ok(Step::Completed);
        }

        self.state.checksum.feed(byte);
        self.rx_buffers[index].store(self.state.byte_count, byte);
        if self.state.byte_count == 2
            && self.config.verify_checksum
            && !self.state.checksum.is_valid()
        {
            self.stats.rx_bad_checksum = self.stats.rx_bad_checksum.wrapping_add(1);
            debug!("rfm12: header checksum mismatch");
            return Ok(Step::Completed);
        }
        self.state.byte_count += 1;
        Ok(Step::AwaitingMore)
    }

    fn transmit_byte(&mut self) -> Result<Step, Error> {
        let commands = self.config.commands;

        if self.state.byte_count < self.state.total_bytes {
            let byte = self.tx_buffer.byte_at(self.state.byte_count);
            self.write(commands.tx_write | u16::from(byte))?;
            self.state.byte_count += 1;
            return Ok(Step::AwaitingMore);
        }

        self.write_ptt(false);
        self.state.tx_request = TxState::Free;
        let pwrmgt = (self.shadow.pwrmgt & !commands.pwrmgt_transmit) | self.config.receive_mode();
        self.write_register(Register::PowerManagement, pwrmgt)?;
        // Dummy byte clears the TX register interrupt.
        self.write(commands.tx_write | u16::from(FLUSH_BYTE))?;
        self.stats.tx_good = self.stats.tx_good.wrapping_add(1);
        trace!("rfm12: sent {} byte packet", self.tx_buffer.len());
        Ok(Step::Completed)
    }
}

#[cfg(test)]
mod tests {
    use crate::buffer::BufferStatus;
    use crate::checksum::header_checksum;
    use crate::config::Config;
    use crate::consts::MAX_PAYLOAD_LEN_USIZE;
    use crate::error::Error;
    use crate::sim;
    use crate::state::{ProtocolState, TxState};

    fn private_channel() -> Config {
        Config {
            collision_avoidance: false,
            ..Config::default()
        }
    }

    /// Sends one packet and returns what went on air after the preamble and sync.
    fn send(packet_type: u8, payload: &[u8]) -> Vec<u8> {
        let (mut radio, chip) = sim::radio(private_channel());
        radio.enqueue(packet_type, payload).unwrap();
        radio.tick().unwrap();
        let _ = sim::transmit(&mut radio, &chip);
        let on_air = chip.lock().unwrap().on_air.clone();
        assert_eq!(on_air[..4], [0xAA, 0xAA, 0x2D, 0xD4]);
        // Drop the flush byte too; a receiver's FIFO has been reset by then.
        on_air[4..on_air.len() - 1].to_vec()
    }

    fn packet(packet_type: u8, payload: &[u8]) -> Vec<u8> {
        let len = payload.len() as u8;
        let mut bytes = vec![len, packet_type, header_checksum(len, packet_type)];
        bytes.extend_from_slice(payload);
        bytes.push(0xAA);
        bytes
    }

    #[test]
    fn test_transmit_wire_format() {
        let (mut radio, chip) = sim::radio(private_channel());
        radio.enqueue(0x21, b"hi!").unwrap();
        radio.tick().unwrap();
        assert_eq!(radio.protocol_state(), ProtocolState::Transmitting);

        // Sync, header, payload and trailer, then the completion interrupt.
        assert_eq!(sim::transmit(&mut radio, &chip), 3 + 6 + 1);

        let chip = chip.lock().unwrap();
        assert_eq!(
            chip.on_air,
            [
                0xAA, 0xAA, 0x2D, 0xD4, 3, 0x21, 3 ^ 0x21 ^ 0xFF, b'h', b'i', b'!', 0xAA, 0xAA
            ]
        );
        assert!(chip.writes.ends_with(&[0x82D9, 0xB8AA, 0xCA81, 0xCA83]));
        assert!(!chip.transmitting);
        assert!(chip.unmasked_writes.is_empty());
        assert_eq!(radio.tx_state(), TxState::Free);
        assert!(radio.tx_done().is_ok());
        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveIdle);
        assert_eq!(radio.shadow_registers().pwrmgt, 0x82D9);
        assert_eq!(radio.stats().tx_good, 1);
    }

    #[test]
    fn test_transmit_empty_payload() {
        assert_eq!(send(0x05, &[]), packet(0x05, &[]));
    }

    #[test]
    fn test_header_accepted_iff_checksum_valid() {
        for len in [0u8, 4] {
            for packet_type in [0x00u8, 0x5A] {
                for checksum in 0..=0xFFu8 {
                    let (mut radio, chip) = sim::radio(Config::default());
                    sim::receive(&mut radio, &chip, &[len, packet_type, checksum]);

                    if len ^ packet_type ^ checksum == 0xFF {
                        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveActive);
                        assert_eq!(radio.stats().rx_bad_checksum, 0);
                    } else {
                        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveIdle);
                        assert_eq!(radio.stats().rx_bad_checksum, 1);
                        assert_eq!(radio.rx_status(), BufferStatus::Free);
                        assert!(radio.rx_buffers[0].data().is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn test_bad_checksum_accepted_when_unverified() {
        let config = Config {
            verify_checksum: false,
            ..Config::default()
        };
        let (mut radio, chip) = sim::radio(config);
        sim::receive(&mut radio, &chip, &[1, 0x10, 0x00, 0x77, 0xAA]);

        assert_eq!(radio.rx_data(), Some(&[0x77][..]));
        assert_eq!(radio.rx_packet().map(|p| p.checksum()), Some(0x00));
        assert_eq!(radio.rx_packet().map(|p| p.header_valid()), Some(false));
    }

    #[test]
    fn test_round_trip() {
        let payload = b"round trip";
        let wire = send(0x33, payload);
        assert_eq!(wire, packet(0x33, payload));

        let (mut radio, chip) = sim::radio(Config::default());
        let resets = chip.lock().unwrap().fifo_resets;
        sim::receive(&mut radio, &chip, &wire);

        assert_eq!(radio.rx_status(), BufferStatus::Complete);
        assert_eq!(radio.rx_len(), Some(payload.len() as u8));
        assert_eq!(radio.rx_type(), Some(0x33));
        assert_eq!(radio.rx_data(), Some(&payload[..]));
        assert_eq!(radio.stats().rx_good, 1);
        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveIdle);
        assert_eq!(chip.lock().unwrap().fifo_resets, resets + 1);
    }

    #[test]
    fn test_full_slots_drop_new_packet() {
        let (mut radio, chip) = sim::radio(Config::default());
        sim::receive(&mut radio, &chip, &packet(1, b"one"));
        sim::receive(&mut radio, &chip, &packet(2, b"two"));
        assert_eq!(radio.stats().rx_good, 2);

        sim::receive(&mut radio, &chip, &[5]);

        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveIdle);
        assert_eq!(radio.stats().rx_dropped_full, 1);
        assert_eq!(radio.rx_buffers[0].data(), b"one");
        assert_eq!(radio.rx_buffers[1].data(), b"two");
        assert_eq!(radio.rx_buffers[0].len(), 3);
    }

    #[test]
    fn test_rx_clear_exposes_slots_in_order() {
        let (mut radio, chip) = sim::radio(Config::default());
        sim::receive(&mut radio, &chip, &packet(1, b"first"));
        sim::receive(&mut radio, &chip, &packet(2, b"second"));

        assert_eq!(radio.rx_data(), Some(&b"first"[..]));
        assert_eq!(radio.rx_clear(), Ok(()));
        assert_eq!(radio.rx_type(), Some(2));
        assert_eq!(radio.rx_data(), Some(&b"second"[..]));
        assert_eq!(radio.rx_clear(), Ok(()));
        assert_eq!(radio.rx_data(), None);
        assert_eq!(radio.rx_clear(), Err(Error::NotComplete));

        // The freed slot is filled again.
        sim::receive(&mut radio, &chip, &packet(3, b"third"));
        assert_eq!(radio.rx_data(), Some(&b"third"[..]));
    }

    #[test]
    fn test_rx_clear_never_exposes_slot_being_filled() {
        let (mut radio, chip) = sim::radio(Config::default());
        sim::receive(&mut radio, &chip, &packet(1, b"done"));
        radio.rx_clear().unwrap();
        let partial = packet(2, b"partial");
        sim::receive(&mut radio, &chip, &partial[..5]);

        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveActive);
        assert_eq!(radio.rx_data(), None);
        assert_eq!(radio.rx_clear(), Err(Error::NotComplete));

        sim::receive(&mut radio, &chip, &partial[5..]);
        assert_eq!(radio.rx_data(), Some(&b"partial"[..]));
    }

    #[test]
    fn test_oversized_payload_is_bounded() {
        let payload: Vec<u8> = (0..40).collect();
        let (mut radio, chip) = sim::radio(Config::default());
        sim::receive(&mut radio, &chip, &packet(9, &payload));

        assert_eq!(radio.rx_len(), Some(40));
        assert_eq!(radio.rx_data(), Some(&payload[..MAX_PAYLOAD_LEN_USIZE]));
        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveIdle);
    }

    #[test]
    fn test_bus_error_returns_to_idle() {
        let (mut radio, chip) = sim::radio(Config::default());
        sim::receive(&mut radio, &chip, &[3, 1, header_checksum(3, 1)]);
        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveActive);

        {
            let mut chip = chip.lock().unwrap();
            chip.rx_fifo.push_back(0x11);
            chip.fail_after = Some(1);
        }
        assert!(matches!(radio.handle_interrupt(), Err(Error::Bus(_))));

        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveIdle);
        assert_eq!(radio.rx_status(), BufferStatus::Free);
        let chip = chip.lock().unwrap();
        assert!(!chip.masked);
        assert_eq!(chip.mask_count, chip.unmask_count);
    }

    #[test]
    fn test_bus_error_clears_fifo() {
        let (mut radio, chip) = sim::radio(Config::default());
        sim::receive(&mut radio, &chip, &[3, 1, header_checksum(3, 1)]);
        let resets = chip.lock().unwrap().fifo_resets;

        {
            let mut chip = chip.lock().unwrap();
            chip.rx_fifo.extend([0x11, 0x22]);
            chip.fail_after = Some(1);
            chip.fail_once = true;
        }
        assert!(matches!(radio.handle_interrupt(), Err(Error::Bus(_))));

        {
            let chip = chip.lock().unwrap();
            assert_eq!(chip.fifo_resets, resets + 1);
            assert!(chip.rx_fifo.is_empty());
            assert!(chip.writes.ends_with(&[0xCA81, 0xCA83]));
            assert!(!chip.masked);
        }

        // The leftover payload byte is gone, so it is not taken for a length.
        radio.handle_interrupt().unwrap();
        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveIdle);

        sim::receive(&mut radio, &chip, &packet(2, b"ok"));
        assert_eq!(radio.rx_data(), Some(&b"ok"[..]));
    }

    #[test]
    fn test_bus_error_switches_off_transmitter() {
        let (mut radio, chip) = sim::radio(private_channel());
        radio.enqueue(0x01, b"abc").unwrap();
        radio.tick().unwrap();
        assert_eq!(radio.shadow_registers().pwrmgt, 0x82F9);

        {
            let mut chip = chip.lock().unwrap();
            chip.tx_ready = true;
            chip.fail_after = Some(1);
            chip.fail_once = true;
        }
        assert!(matches!(radio.handle_interrupt(), Err(Error::Bus(_))));

        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveIdle);
        assert_eq!(radio.tx_state(), TxState::Occupied);
        assert_eq!(radio.shadow_registers().pwrmgt, 0x82D9);
        {
            let chip = chip.lock().unwrap();
            assert!(!chip.transmitting);
            assert!(chip.writes.ends_with(&[0x82D9, 0xCA81, 0xCA83]));
        }

        radio.tick().unwrap();
        let _ = sim::transmit(&mut radio, &chip);
        assert_eq!(radio.tx_state(), TxState::Free);
        assert_eq!(radio.stats().tx_good, 1);
    }

    #[test]
    fn test_transmit_only_drains_fifo_events() {
        let config = Config {
            transmit_only: true,
            ..Config::default()
        };
        let (mut radio, chip) = sim::radio(config);
        chip.lock().unwrap().rx_fifo.extend([3, 1, header_checksum(3, 1)]);

        radio.poll().unwrap();

        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveIdle);
        assert_eq!(radio.rx_status(), BufferStatus::Free);
        let chip = chip.lock().unwrap();
        assert!(chip.rx_fifo.is_empty());
        assert!(!chip.writes.contains(&0xCA83));
    }

    #[test]
    fn test_no_event_is_a_no_op() {
        let (mut radio, chip) = sim::radio(Config::default());
        let before = chip.lock().unwrap().writes.len();

        radio.handle_interrupt().unwrap();

        assert_eq!(chip.lock().unwrap().writes.len(), before);
        assert_eq!(radio.protocol_state(), ProtocolState::ReceiveIdle);
    }
}
