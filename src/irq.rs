//! Masking of the transceiver's interrupt source.
//!
//! The handler masks its own line on entry and unmasks it on exit, so it
//! never re-enters. Mainline code masks the same line around bus transactions
//! that must not interleave with the handler's. Only this one source is
//! masked; other interrupts keep running.

/// Enables and disables the single interrupt line the handler runs on.
pub trait IrqLine {
    /// Disables the interrupt source. A pending edge must be latched, not lost.
    fn mask(&mut self);

    /// Re-enables the interrupt source.
    fn unmask(&mut self);
}

impl<T: IrqLine + ?Sized> IrqLine for &mut T {
    fn mask(&mut self) {
        T::mask(self)
    }

    fn unmask(&mut self) {
        T::unmask(self)
    }
}

/// No interrupt line: the application calls [`poll`](crate::driver::Rfm12::poll)
/// itself and never preempts the driver.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoIrq;

impl IrqLine for NoIrq {
    fn mask(&mut self) {}

    fn unmask(&mut self) {}
}
