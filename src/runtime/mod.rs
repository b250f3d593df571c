//! Glue for driving an [`Rfm12`](crate::driver::Rfm12) from firmware.
//!
//! Two integration styles are provided:
//!
//! - `global` feature: a `critical_section` protected singleton that the
//!   nIRQ interrupt handler, a periodic timer interrupt and mainline code
//!   all reach through [`global_rfm12_interrupt`], [`global_rfm12_tick`] and
//!   [`global_rfm12_with`], or the `init_rfm12!` / `setup_rfm12!` /
//!   `rfm12_interrupt!` / `rfm12_tick!` / `with_rfm12!` macros.
//! - `delay-loop` feature: [`run_poll_loop`], a blocking loop for firmware
//!   without a usable interrupt line, driven by a `DelayNs` provider.

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "global")]
mod global;
#[cfg(feature = "global")]
pub use global::*;

#[cfg(feature = "global")]
mod macros;
