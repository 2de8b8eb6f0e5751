//! Unsolicited result code dispatch.
//!
//! The modem announces events such as incoming messages with unsolicited
//! result codes that can interleave with command responses. Handlers
//! registered on the engine are matched against the receive stream during
//! every response scan and get a chance to consume the body of their URC
//! before scanning resumes.

use crate::error::Error;

/// Stream access handed to a handler while its URC is being dispatched.
///
/// Reads are bounded by the configured stream timeout, so a handler cannot
/// stall the engine on a quiet line.
pub trait Cursor {
    /// Next byte without consuming it, `None` when nothing arrives in time.
    fn peek(&mut self) -> Result<Option<u8>, Error>;

    /// Consume and return the next byte.
    fn read_byte(&mut self) -> Result<u8, Error>;

    /// Fill `dst` completely from the stream.
    fn read_exact(&mut self, dst: &mut [u8]) -> Result<(), Error>;

    /// Consume bytes through the next occurrence of `byte`.
    fn find(&mut self, byte: u8) -> Result<(), Error>;

    /// Parse a decimal integer, skipping any leading non-numeric bytes.
    /// The byte terminating the number is left unconsumed.
    fn parse_int(&mut self) -> Result<i32, Error>;

    /// Parse a decimal number with an optional fractional part.
    fn parse_float(&mut self) -> Result<f32, Error>;
}

/// Handler for one unsolicited result code.
///
/// Whenever the receive buffer ends with [`prefix`](UrcHandler::prefix)
/// during a scan, the engine consumes the prefix and calls
/// [`process`](UrcHandler::process) with a cursor positioned right after
/// it. A `process` error is logged and swallowed; it never fails the
/// surrounding command.
pub trait UrcHandler {
    /// Pattern announcing this URC, e.g. `"+CMTI: "`.
    fn prefix(&self) -> &str;

    /// Consume the body of the URC, typically through the line terminator.
    fn process(&mut self, stream: &mut dyn Cursor) -> Result<(), Error>;
}

/// Registration token for a handler, used to deregister it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandlerId(pub(crate) u8);
