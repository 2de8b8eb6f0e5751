//! Mock implementations backing the unit tests.

use core::convert::Infallible;

use fugit::{TimerDurationU32, TimerInstantU32};

use crate::clock::Clock;
use crate::serial::SerialPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSerialError;

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

/// Serial port fed from a canned receive script, recording every write.
pub struct MockSerial {
    rx: Vec<u8>,
    rx_pos: usize,
    tx: Vec<u8>,
}

impl MockSerial {
    pub fn new(rx: &[u8]) -> Self {
        Self {
            rx: rx.to_vec(),
            rx_pos: 0,
            tx: Vec::new(),
        }
    }

    /// Bytes of the receive script not yet read.
    pub fn remaining(&self) -> usize {
        self.rx.len() - self.rx_pos
    }

    /// Everything written to the port so far.
    pub fn written(&self) -> &[u8] {
        &self.tx
    }
}

impl SerialPort for MockSerial {
    type Error = MockSerialError;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        match self.rx.get(self.rx_pos) {
            Some(&byte) => {
                self.rx_pos += 1;
                Ok(byte)
            }
            None => Err(nb::Error::WouldBlock),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.tx.extend_from_slice(data);
        Ok(())
    }
}

/// Deterministic millisecond clock. Every poll advances time by one tick,
/// so timeouts expire after a bounded number of loop iterations instead of
/// depending on wall time.
pub struct MockTimer {
    now_ms: u32,
    armed: Option<u32>,
}

impl MockTimer {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            armed: None,
        }
    }
}

impl Clock<1000> for MockTimer {
    type Error = Infallible;

    fn now(&mut self) -> TimerInstantU32<1000> {
        self.now_ms += 1;
        TimerInstantU32::<1000>::from_ticks(self.now_ms)
    }

    fn start(&mut self, duration: TimerDurationU32<1000>) -> Result<(), Self::Error> {
        self.armed = Some(self.now_ms + duration.ticks());
        Ok(())
    }

    fn wait(&mut self) -> nb::Result<(), Self::Error> {
        self.now_ms += 1;
        match self.armed {
            Some(expiry) if self.now_ms >= expiry => Ok(()),
            _ => Err(nb::Error::WouldBlock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_serial_scripts_reads_and_records_writes() {
        let mut serial = MockSerial::new(b"ab");
        assert_eq!(serial.read(), Ok(b'a'));
        assert_eq!(serial.read(), Ok(b'b'));
        assert_eq!(serial.read(), Err(nb::Error::WouldBlock));
        assert_eq!(serial.remaining(), 0);

        serial.write(b"AT\r\n").unwrap();
        assert_eq!(serial.written(), b"AT\r\n");
    }

    #[test]
    fn mock_timer_expires_after_armed_duration() {
        let mut timer = MockTimer::new();
        timer.start(TimerDurationU32::<1000>::millis(3)).unwrap();
        assert_eq!(timer.wait(), Err(nb::Error::WouldBlock));
        assert_eq!(timer.wait(), Err(nb::Error::WouldBlock));
        assert_eq!(timer.wait(), Ok(()));
        assert_eq!(timer.wait(), Ok(()));
    }
}
