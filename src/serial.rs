//! AT command engine.
//!
//! [`ModemSerial`] drives the byte stream to and from the modem UART. It
//! buffers received bytes in a ring, scans them for expected response
//! patterns under a deadline and hands unsolicited result codes to the
//! registered handlers as they appear. Higher level services are built on
//! top of [`wait_response`](ModemSerial::wait_response) and the stream
//! reading methods.

use embedded_io::Error as _;
use fugit::TimerDurationU32;

use crate::buffer::RingBuffer;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::Error;
use crate::urc::{Cursor, HandlerId, UrcHandler};

/// Timeout for reads when the caller gives no explicit deadline.
pub const DEFAULT_TIMEOUT_MS: u32 = 1_000;

/// Number of slots in the URC handler table.
pub const MAX_EVENT_HANDLERS: usize = 10;

const RESPONSE_OK: &str = "OK\r\n";
const RESPONSE_ERROR: &str = "ERROR\r\n";

/// Byte transport to the modem UART.
pub trait SerialPort {
    type Error: embedded_io::Error;

    /// Read one received byte, `WouldBlock` when none is pending.
    fn read(&mut self) -> nb::Result<u8, Self::Error>;

    /// Write all of `data`.
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

/// Terminal outcome of a response scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseOutcome {
    /// The `OK\r\n` terminator.
    Ok,
    /// The first custom target.
    Match1,
    /// The second custom target.
    Match2,
    /// The third custom target.
    Match3,
    /// The `ERROR\r\n` terminator.
    Error,
    /// The deadline passed without a match.
    Timeout,
}

/// Up to three custom patterns a scan watches for, in priority order.
///
/// Built from `()`, a single `&str` or a tuple of two or three, so call
/// sites only spell out the targets they use.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchTargets<'a> {
    targets: [Option<&'a str>; 3],
}

impl From<()> for MatchTargets<'static> {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl<'a> From<&'a str> for MatchTargets<'a> {
    fn from(first: &'a str) -> Self {
        Self {
            targets: [Some(first), None, None],
        }
    }
}

impl<'a> From<(&'a str, &'a str)> for MatchTargets<'a> {
    fn from((first, second): (&'a str, &'a str)) -> Self {
        Self {
            targets: [Some(first), Some(second), None],
        }
    }
}

impl<'a> From<(&'a str, &'a str, &'a str)> for MatchTargets<'a> {
    fn from((first, second, third): (&'a str, &'a str, &'a str)) -> Self {
        Self {
            targets: [Some(first), Some(second), Some(third)],
        }
    }
}

/// AT command engine over a byte serial port.
///
/// Owns the receive ring buffer, the response scanner and the URC handler
/// table. All command traffic to the modem goes through this type.
pub struct ModemSerial<'a, S, CLK, const TIMER_HZ: u32, const BUF_LEN: usize> {
    serial: S,
    timer: CLK,
    config: Config,
    buf: RingBuffer<BUF_LEN>,
    peeked: Option<u8>,
    handlers: [Option<&'a mut dyn UrcHandler>; MAX_EVENT_HANDLERS],
}

impl<'a, S, CLK, const TIMER_HZ: u32, const BUF_LEN: usize>
    ModemSerial<'a, S, CLK, TIMER_HZ, BUF_LEN>
where
    S: SerialPort,
    CLK: Clock<TIMER_HZ>,
{
    pub fn new(serial: S, timer: CLK, config: Config) -> Self {
        Self {
            serial,
            timer,
            config,
            buf: RingBuffer::new(),
            peeked: None,
            handlers: core::array::from_fn(|_| None),
        }
    }

    /// Tear down the engine and hand back the serial port and timer.
    pub fn release(self) -> (S, CLK) {
        (self.serial, self.timer)
    }

    /// Scan the receive stream until one of the wanted patterns arrives or
    /// `timeout_ms` expires.
    ///
    /// Custom targets rank above the `OK`/`ERROR` terminators, and earlier
    /// targets above later ones, should several match on the same byte.
    /// Registered URC handlers are consulted before any target on every
    /// received byte, so events interleaved with a response are dispatched
    /// instead of derailing the scan. On return the stream has been
    /// consumed exactly through the matched pattern.
    pub fn wait_response<'m>(
        &mut self,
        targets: impl Into<MatchTargets<'m>>,
        timeout_ms: u32,
        match_ok: bool,
        match_error: bool,
    ) -> Result<ResponseOutcome, Error> {
        let targets = targets.into();
        let checks: [(Option<&str>, ResponseOutcome); 5] = [
            (targets.targets[0], ResponseOutcome::Match1),
            (targets.targets[1], ResponseOutcome::Match2),
            (targets.targets[2], ResponseOutcome::Match3),
            (match_ok.then_some(RESPONSE_OK), ResponseOutcome::Ok),
            (match_error.then_some(RESPONSE_ERROR), ResponseOutcome::Error),
        ];

        self.buf.clear();
        self.timer
            .start(TimerDurationU32::<TIMER_HZ>::millis(timeout_ms))
            .map_err(|_| Error::Clock)?;

        loop {
            match self.timer.wait() {
                Ok(()) => return Ok(ResponseOutcome::Timeout),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(_)) => return Err(Error::Clock),
            }

            let byte = match self.next_byte_nb() {
                Ok(byte) => byte,
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(e)) => return Err(Error::Serial(e.kind())),
            };
            self.buf.write(&[byte]);

            // Events take precedence over whatever the command is waiting for
            if self.dispatch_urc() {
                continue;
            }

            for (pattern, outcome) in checks {
                if let Some(pattern) = pattern {
                    if self.buf.ends_with(pattern.as_bytes()) {
                        return Ok(outcome);
                    }
                }
            }
        }
    }

    /// Give the receive stream a window to deliver pending URCs.
    ///
    /// Scans like [`wait_response`](Self::wait_response) with no patterns
    /// armed, so the whole window is spent dispatching events. Call this
    /// periodically from the application idle loop; a few tens of
    /// milliseconds is plenty.
    pub fn listen(&mut self, timeout_ms: u32) -> Result<(), Error> {
        self.wait_response((), timeout_ms, false, false)?;
        Ok(())
    }

    /// Register `handler` for URC dispatch.
    ///
    /// Fails with [`Error::Capacity`] when all handler slots are taken.
    pub fn register_event_handler(
        &mut self,
        handler: &'a mut dyn UrcHandler,
    ) -> Result<HandlerId, Error> {
        for (slot, entry) in self.handlers.iter_mut().enumerate() {
            if entry.is_none() {
                *entry = Some(handler);
                return Ok(HandlerId(slot as u8));
            }
        }
        Err(Error::Capacity)
    }

    /// Remove a previously registered handler, returning it.
    pub fn deregister_event_handler(&mut self, id: HandlerId) -> Option<&'a mut dyn UrcHandler> {
        self.handlers.get_mut(id.0 as usize)?.take()
    }

    // First handler whose prefix is a suffix of the scan buffer consumes
    // the event. Its buffer contribution is dropped afterwards so response
    // targets cannot fire on URC bytes. Handler errors are logged and
    // swallowed; they must not fail the surrounding command.
    fn dispatch_urc(&mut self) -> bool {
        for slot in 0..self.handlers.len() {
            let matched = match &self.handlers[slot] {
                Some(handler) => self.buf.ends_with(handler.prefix().as_bytes()),
                None => false,
            };
            if !matched {
                continue;
            }
            if let Some(handler) = self.handlers[slot].take() {
                let result = handler.process(&mut StreamCursor { engine: self });
                self.handlers[slot] = Some(handler);
                if let Err(_err) = result {
                    #[cfg(feature = "log-impl")]
                    log::error!("URC handler failed: {:?}", _err);
                }
                self.buf.clear();
                return true;
            }
        }
        false
    }

    /// Send a command terminated with `\r\n`.
    pub fn send_cmd(&mut self, cmd: core::fmt::Arguments<'_>) -> Result<(), Error> {
        self.print_cmd(cmd)?;
        self.write_bytes(b"\r\n")
    }

    /// Send formatted bytes without a terminator.
    pub fn print_cmd(&mut self, cmd: core::fmt::Arguments<'_>) -> Result<(), Error> {
        let mut writer = SerialWriter {
            serial: &mut self.serial,
            error: None,
        };
        let _ = core::fmt::write(&mut writer, cmd);
        match writer.error {
            Some(kind) => Err(Error::Serial(kind)),
            None => Ok(()),
        }
    }

    /// Send raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        self.serial.write(data).map_err(|e| Error::Serial(e.kind()))
    }

    /// Whether at least one received byte is immediately available.
    pub fn available(&mut self) -> Result<bool, Error> {
        if self.peeked.is_some() {
            return Ok(true);
        }
        match self.serial.read() {
            Ok(byte) => {
                self.peeked = Some(byte);
                Ok(true)
            }
            Err(nb::Error::WouldBlock) => Ok(false),
            Err(nb::Error::Other(e)) => Err(Error::Serial(e.kind())),
        }
    }

    /// Next stream byte without consuming it, waiting up to the configured
    /// stream timeout. `None` when nothing arrives in time.
    pub fn peek(&mut self) -> Result<Option<u8>, Error> {
        self.fill_peek(self.config.stream_timeout_ms)
    }

    /// Consume the next stream byte, waiting up to the configured stream
    /// timeout.
    pub fn read_byte(&mut self) -> Result<u8, Error> {
        self.fill_peek(self.config.stream_timeout_ms)?;
        self.peeked.take().ok_or(Error::Timeout)
    }

    /// Fill `dst` completely, each byte bounded by the stream timeout.
    pub fn read_exact(&mut self, dst: &mut [u8]) -> Result<(), Error> {
        for slot in dst.iter_mut() {
            *slot = self.read_byte()?;
        }
        Ok(())
    }

    /// Consume stream bytes through the next occurrence of `byte`.
    pub fn find(&mut self, byte: u8) -> Result<(), Error> {
        loop {
            if self.read_byte()? == byte {
                return Ok(());
            }
        }
    }

    /// Parse a decimal integer, discarding leading bytes that are neither
    /// a digit nor a minus sign. The terminating byte is left unconsumed.
    pub fn parse_int(&mut self) -> Result<i32, Error> {
        let first = self.skip_to_numeric()?;
        let negative = first == b'-';
        if negative {
            self.peeked = None;
        }

        let mut value: i32 = 0;
        while let Some(byte) = self.fill_peek(self.config.stream_timeout_ms)? {
            if !byte.is_ascii_digit() {
                break;
            }
            self.peeked = None;
            value = value * 10 + i32::from(byte - b'0');
        }
        Ok(if negative { -value } else { value })
    }

    /// Parse a decimal number with an optional fractional part. The
    /// terminating byte is left unconsumed.
    pub fn parse_float(&mut self) -> Result<f32, Error> {
        let first = self.skip_to_numeric()?;
        let negative = first == b'-';
        if negative {
            self.peeked = None;
        }

        let mut value: f32 = 0.0;
        let mut fraction: f32 = 1.0;
        let mut seen_dot = false;
        while let Some(byte) = self.fill_peek(self.config.stream_timeout_ms)? {
            match byte {
                b'0'..=b'9' => {
                    self.peeked = None;
                    let digit = f32::from(byte - b'0');
                    if seen_dot {
                        fraction /= 10.0;
                        value += digit * fraction;
                    } else {
                        value = value * 10.0 + digit;
                    }
                }
                b'.' if !seen_dot => {
                    self.peeked = None;
                    seen_dot = true;
                }
                _ => break,
            }
        }
        Ok(if negative { -value } else { value })
    }

    /// Discard everything received but not yet consumed.
    pub fn flush_input(&mut self) -> Result<(), Error> {
        self.peeked = None;
        loop {
            match self.serial.read() {
                Ok(_) => {}
                Err(nb::Error::WouldBlock) => return Ok(()),
                Err(nb::Error::Other(e)) => return Err(Error::Serial(e.kind())),
            }
        }
    }

    fn next_byte_nb(&mut self) -> nb::Result<u8, S::Error> {
        if let Some(byte) = self.peeked.take() {
            return Ok(byte);
        }
        self.serial.read()
    }

    // Hold the next byte in the peek slot, polling the port until it
    // shows up or `timeout_ms` passes.
    fn fill_peek(&mut self, timeout_ms: u32) -> Result<Option<u8>, Error> {
        if self.peeked.is_some() {
            return Ok(self.peeked);
        }
        let start = self.timer.now();
        let budget = TimerDurationU32::<TIMER_HZ>::millis(timeout_ms);
        loop {
            match self.serial.read() {
                Ok(byte) => {
                    self.peeked = Some(byte);
                    return Ok(self.peeked);
                }
                Err(nb::Error::WouldBlock) => {
                    if self.timer.now() - start >= budget {
                        return Ok(None);
                    }
                }
                Err(nb::Error::Other(e)) => return Err(Error::Serial(e.kind())),
            }
        }
    }

    fn skip_to_numeric(&mut self) -> Result<u8, Error> {
        loop {
            match self.fill_peek(self.config.stream_timeout_ms)? {
                Some(byte) if byte == b'-' || byte.is_ascii_digit() => return Ok(byte),
                Some(_) => {
                    self.peeked = None;
                }
                None => return Err(Error::Timeout),
            }
        }
    }
}

struct SerialWriter<'s, S: SerialPort> {
    serial: &'s mut S,
    error: Option<embedded_io::ErrorKind>,
}

impl<S: SerialPort> core::fmt::Write for SerialWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        if let Err(e) = self.serial.write(s.as_bytes()) {
            self.error = Some(e.kind());
            return Err(core::fmt::Error);
        }
        Ok(())
    }
}

// Borrow of the engine handed to URC handlers through `dyn Cursor`.
struct StreamCursor<'c, 'a, S, CLK, const TIMER_HZ: u32, const BUF_LEN: usize> {
    engine: &'c mut ModemSerial<'a, S, CLK, TIMER_HZ, BUF_LEN>,
}

impl<S, CLK, const TIMER_HZ: u32, const BUF_LEN: usize> Cursor
    for StreamCursor<'_, '_, S, CLK, TIMER_HZ, BUF_LEN>
where
    S: SerialPort,
    CLK: Clock<TIMER_HZ>,
{
    fn peek(&mut self) -> Result<Option<u8>, Error> {
        self.engine.peek()
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        self.engine.read_byte()
    }

    fn read_exact(&mut self, dst: &mut [u8]) -> Result<(), Error> {
        self.engine.read_exact(dst)
    }

    fn find(&mut self, byte: u8) -> Result<(), Error> {
        self.engine.find(byte)
    }

    fn parse_int(&mut self) -> Result<i32, Error> {
        self.engine.parse_int()
    }

    fn parse_float(&mut self) -> Result<f32, Error> {
        self.engine.parse_float()
    }
}
