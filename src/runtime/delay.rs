use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::bus::Rfm12Bus;
use crate::driver::Rfm12;
use crate::error::Error;
use crate::irq::IrqLine;

/// Runs a blocking loop that polls the chip and runs the scheduler.
///
/// For firmware that cannot route the nIRQ line to an interrupt. Every
/// `poll_us` microseconds the chip is serviced with [`Rfm12::poll`]; every
/// `polls_per_tick` polls [`Rfm12::tick`] runs as well.
///
/// `poll_us` has to be shorter than one byte time on air (about 830 us at
/// 9600 baud), or received bytes are lost to FIFO overruns.
///
/// # Arguments
/// - `radio`: an initialised driver, usually with [`NoIrq`](crate::irq::NoIrq)
/// - `delay`: a delay provider implementing `DelayNs`, typically from the HAL
/// - `poll_us`: the delay between polls, in microseconds
/// - `polls_per_tick`: number of polls per scheduler tick (0 is treated as 1)
/// - `on_poll`: called after every poll, e.g. to consume received packets
///
/// # Errors
/// Returns the first bus error; the loop never ends otherwise.
///
/// # Example
/// ```rust,ignore
/// run_poll_loop(&mut radio, &mut delay, 200, 5, |radio| {
///     if let Some(data) = radio.rx_data() {
///         handle(data);
///         let _ = radio.rx_clear();
///     }
/// })?;
/// ```
pub fn run_poll_loop<D, BUS, IRQ, PTT, F>(
    radio: &mut Rfm12<BUS, IRQ, PTT>,
    delay: &mut D,
    poll_us: u32,
    polls_per_tick: u16,
    mut on_poll: F,
) -> Result<Infallible, Error>
where
    D: DelayNs,
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
    F: FnMut(&mut Rfm12<BUS, IRQ, PTT>),
{
    let polls_per_tick = polls_per_tick.max(1);
    let mut polls = 0;
    loop {
        radio.poll()?;
        on_poll(radio);

        polls += 1;
        if polls >= polls_per_tick {
            polls = 0;
            radio.tick()?;
        }
        delay.delay_us(poll_us);
    }
}
