#![cfg_attr(not(test), no_std)]

//! # A76XX cellular
//!
//! This crate drives SIMCom A76XX series cellular modules over their AT
//! command interface. It can be used both on `no_std` and `std` platforms.
//!
//! [`ModemSerial`] is the AT engine: it sends commands, scans the receive
//! stream for expected responses under a deadline and dispatches
//! unsolicited result codes to registered handlers, even when they arrive
//! in the middle of a response. The [`sms`] module builds the PDU mode
//! messaging service on top of it.
//!
//! ## Example
//!
//! ### Clock trait
//!
//! To use this crate one must implement the [`Clock`] trait for a timer.
//! Notice that `Clock` uses [`Duration`][duration] and [`Instant`][instant]
//! from the [fugit] crate.
//!
//! Here is an example how it would look like for a `std` platform:
//!
//! ```
//! use a76xx_cellular::fugit;
//! use a76xx_cellular::prelude::*;
//!
//! pub struct SysTimer<const TIMER_HZ: u32> {
//!     start: std::time::Instant,
//!     duration: fugit::TimerDurationU32<TIMER_HZ>,
//! }
//!
//! impl<const TIMER_HZ: u32> SysTimer<TIMER_HZ> {
//!     pub fn new() -> Self {
//!         Self {
//!             start: std::time::Instant::now(),
//!             duration: fugit::TimerDurationU32::millis(0),
//!         }
//!     }
//! }
//!
//! impl<const TIMER_HZ: u32> Clock<TIMER_HZ> for SysTimer<TIMER_HZ> {
//!     type Error = std::convert::Infallible;
//!
//!     fn now(&mut self) -> fugit::TimerInstantU32<TIMER_HZ> {
//!         let millis = self.start.elapsed().as_millis();
//!         fugit::TimerInstantU32::from_ticks(millis as u32)
//!     }
//!
//!     fn start(&mut self, duration: fugit::TimerDurationU32<TIMER_HZ>) -> Result<(), Self::Error> {
//!         self.start = std::time::Instant::now();
//!         self.duration = duration.convert();
//!         Ok(())
//!     }
//!
//!     fn wait(&mut self) -> nb::Result<(), Self::Error> {
//!         if std::time::Instant::now() - self.start
//!             > std::time::Duration::from_millis(self.duration.ticks() as u64)
//!         {
//!             Ok(())
//!         } else {
//!             Err(nb::Error::WouldBlock)
//!         }
//!     }
//! }
//! ```
//!
//! ### Driver usage
//!
//! With the `SysTimer` from above and a [`SerialPort`] implementation for
//! the UART, sending a message looks like this:
//!
//! ```
//! use a76xx_cellular::prelude::*;
//! use a76xx_cellular::{Config, ModemSerial, SmsService};
//!
//! fn run<S: SerialPort>(port: S) {
//!     let timer: SysTimer<1000> = SysTimer::new();
//!     let mut modem: ModemSerial<_, _, 1000, 512> =
//!         ModemSerial::new(port, timer, Config::new());
//!
//!     let mut sms = SmsService::new(&mut modem);
//!     sms.init().unwrap();
//!     sms.send("+447700900123", "hello from the field").unwrap();
//! }
//! ```
//!
//! [duration]: ../fugit/duration/struct.Duration.html
//! [instant]: ../fugit/instant/struct.Instant.html
//!

mod buffer;
mod clock;
mod config;
pub mod error;
pub mod hex;
mod serial;
pub mod sms;
mod urc;

#[cfg(test)]
mod test_helpers;

pub use buffer::RingBuffer;
pub use clock::Clock;
pub use config::Config;
pub use error::Error;
pub use serial::{
    MatchTargets, ModemSerial, ResponseOutcome, SerialPort, DEFAULT_TIMEOUT_MS,
    MAX_EVENT_HANDLERS,
};
pub use sms::SmsService;
pub use urc::{Cursor, HandlerId, UrcHandler};

// Re-export fugit
pub use fugit;

/// Prelude - Include traits
pub mod prelude {
    pub use super::clock::Clock;
    pub use super::serial::SerialPort;
    pub use super::urc::{Cursor, UrcHandler};
}
