//! # rfm12
//!
//! A portable, no_std Rust packet driver for HopeRF RFM12 / RFM12B FSK transceivers.
//!
//! The chip does the modulation, sync-word detection and byte framing; this
//! crate turns its byte FIFO into a packet link:
//! - framing with a length/type header and an XOR header checksum
//! - double-buffered reception, so one packet can be read while the next arrives
//! - carrier-sense collision avoidance before every transmission
//! - an interrupt-driven state machine that shifts bytes in and out without
//!   mainline involvement
//!
//! ## Crate features
//! | Feature            | Description |
//! |--------------------|-------------|
//! | `std`              | Disables `#![no_std]` |
//! | `global` (default) | `critical_section` protected global driver slot and macros |
//! | `delay-loop`       | Blocking poll loop driven by `embedded_hal::delay::DelayNs` |
//! | `defmt-0-3`        | Uses `defmt` logging |
//! | `log`              | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rfm12::{Config, NoIrq, Rfm12, SpiInterface};
//!
//! let mut radio = Rfm12::new(SpiInterface::new(spi), irq_line, None::<Ptt>, Config::default());
//! radio.init()?;
//!
//! // nIRQ interrupt handler
//! radio.handle_interrupt()?;
//!
//! // every millisecond or so
//! radio.tick()?;
//!
//! // mainline
//! radio.enqueue(0x01, b"hello")?;
//! if let Some(data) = radio.rx_data() {
//!     // ...
//!     radio.rx_clear()?;
//! }
//! ```
//!
//! In practice the handler and mainline code share the driver through
//! [`runtime`]: either the `global` singleton or, without a usable interrupt
//! line, the `delay-loop` poll loop.
//!
//! ## Integration Notes
//!
//! - The chip configuration (band, frequency, data rate, deviation, filter)
//!   is an init sequence of raw command words; see [`config::DEFAULT_INIT_SEQUENCE`]
//! - Nothing is transmitted unless [`Rfm12::tick`] is called regularly
//! - Only one driver instance should exist per transceiver
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
mod fmt;

#[cfg(feature = "global")]
pub use critical_section;

pub use heapless;

pub mod buffer;
pub mod bus;
pub mod checksum;
pub mod config;
pub mod consts;
pub mod driver;
pub mod error;
pub mod irq;
mod protocol;
pub mod runtime;
mod scheduler;
pub mod state;

#[cfg(test)]
mod sim;

pub use bus::{Rfm12Bus, SpiInterface};
pub use config::Config;
pub use driver::Rfm12;
pub use error::Error;
pub use irq::{IrqLine, NoIrq};
