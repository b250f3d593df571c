/// Declares a static global `RFM12` driver slot protected by a `critical_section` mutex.
///
/// # Arguments
/// - `$bus`: the concrete bus type (must implement `Rfm12Bus`)
/// - `$irq`: the concrete interrupt line type (must implement `IrqLine`)
/// - `$ptt`: the concrete PTT pin type (must implement `OutputPin`)
///
/// # Example
/// ```rust,ignore
/// init_rfm12!(SpiInterface<MySpiDevice>, NoIrq, MyPttPin);
/// ```
#[macro_export]
macro_rules! init_rfm12 {
    ( $bus:ty, $irq:ty, $ptt:ty ) => {
        pub static RFM12: $crate::runtime::GlobalRfm12<$bus, $irq, $ptt> =
            $crate::runtime::global_rfm12_init();
    };
}

/// Initialises a driver and installs it in the `RFM12` slot declared by `init_rfm12!`.
///
/// Evaluates to the `Result` of [`Rfm12::init`](crate::driver::Rfm12::init).
///
/// # Example
/// ```rust,ignore
/// setup_rfm12!(Rfm12::new(SpiInterface::new(spi), NoIrq, None, Config::default()))?;
/// ```
#[macro_export]
macro_rules! setup_rfm12 {
    ( $radio:expr ) => {
        $crate::runtime::global_rfm12_setup(&RFM12, $radio)
    };
}

/// Services the global `RFM12` driver; call from the nIRQ interrupt handler.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn EXTI0() {
///     let _ = rfm12_interrupt!();
/// }
/// ```
#[macro_export]
macro_rules! rfm12_interrupt {
    () => {
        $crate::runtime::global_rfm12_interrupt(&RFM12)
    };
}

/// Runs the scheduler of the global `RFM12` driver; call from a periodic timer.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     let _ = rfm12_tick!();
/// }
/// ```
#[macro_export]
macro_rules! rfm12_tick {
    () => {
        $crate::runtime::global_rfm12_tick(&RFM12)
    };
}

/// Runs a closure on the global `RFM12` driver inside a critical section.
///
/// Evaluates to `None` until the driver has been installed.
///
/// # Example
/// ```rust,ignore
/// let queued = with_rfm12!(|radio| radio.enqueue(0x01, b"hello"));
/// ```
#[macro_export]
macro_rules! with_rfm12 {
    ( $f:expr ) => {
        $crate::runtime::global_rfm12_with(&RFM12, $f)
    };
}
