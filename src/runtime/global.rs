use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::OutputPin;

use crate::bus::Rfm12Bus;
use crate::driver::Rfm12;
use crate::error::Error;
use crate::irq::IrqLine;

/// A driver shared between interrupt handlers and mainline code.
pub type GlobalRfm12<BUS, IRQ, PTT> = Mutex<RefCell<Option<Rfm12<BUS, IRQ, PTT>>>>;

/// Creates an empty global slot, for use in a `static` initialiser.
///
/// # Example
/// ```rust
/// # use embedded_hal_mock::eh1::spi::Mock as SpiMock;
/// # use embedded_hal_mock::eh1::digital::Mock as Pin;
/// use rfm12::{NoIrq, SpiInterface};
/// use rfm12::runtime::{GlobalRfm12, global_rfm12_init};
///
/// static RFM12: GlobalRfm12<SpiInterface<SpiMock<u8>>, NoIrq, Pin> = global_rfm12_init();
/// ```
pub const fn global_rfm12_init<BUS, IRQ, PTT>() -> GlobalRfm12<BUS, IRQ, PTT>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    Mutex::new(RefCell::new(None))
}

/// Initialises `radio` and installs it in the global slot.
///
/// Any driver already installed is dropped. Call once from `main()` before
/// enabling the nIRQ interrupt and the tick timer.
///
/// # Errors
/// Errors from [`Rfm12::init`]; the slot is left untouched in that case.
pub fn global_rfm12_setup<BUS, IRQ, PTT>(
    global: &'static GlobalRfm12<BUS, IRQ, PTT>,
    mut radio: Rfm12<BUS, IRQ, PTT>,
) -> Result<(), Error>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    radio.init()?;
    critical_section::with(|cs| {
        let _ = global.borrow(cs).replace(Some(radio));
    });
    Ok(())
}

/// Services the chip from the nIRQ interrupt handler.
///
/// Does nothing until the driver has been installed.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn EXTI0() {
///     let _ = global_rfm12_interrupt(&RFM12);
/// }
/// ```
pub fn global_rfm12_interrupt<BUS, IRQ, PTT>(
    global: &'static GlobalRfm12<BUS, IRQ, PTT>,
) -> Result<(), Error>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    critical_section::with(|cs| match global.borrow(cs).borrow_mut().as_mut() {
        Some(radio) => radio.handle_interrupt(),
        None => Ok(()),
    })
}

/// Runs the collision-avoidance scheduler, typically from a 1 ms timer interrupt.
///
/// Does nothing until the driver has been installed.
pub fn global_rfm12_tick<BUS, IRQ, PTT>(global: &'static GlobalRfm12<BUS, IRQ, PTT>) -> Result<(), Error>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
{
    critical_section::with(|cs| match global.borrow(cs).borrow_mut().as_mut() {
        Some(radio) => radio.tick(),
        None => Ok(()),
    })
}

/// Runs `f` on the installed driver inside a critical section.
///
/// Returns `None` if no driver has been installed yet.
///
/// # Example
/// ```rust,ignore
/// let sent = global_rfm12_with(&RFM12, |radio| radio.enqueue(0x01, b"hello"));
/// ```
pub fn global_rfm12_with<BUS, IRQ, PTT, F, R>(
    global: &'static GlobalRfm12<BUS, IRQ, PTT>,
    f: F,
) -> Option<R>
where
    BUS: Rfm12Bus,
    IRQ: IrqLine,
    PTT: OutputPin,
    F: FnOnce(&mut Rfm12<BUS, IRQ, PTT>) -> R,
{
    critical_section::with(|cs| global.borrow(cs).borrow_mut().as_mut().map(f))
}
