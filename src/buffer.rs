use heapless::Vec;

/// A lossy byte ring buffer.
///
/// Holds the most recent bytes of the modem receive stream. A write that
/// exceeds the free space advances the read position past the oldest bytes,
/// so the buffer always ends with the newest data. One slot is kept empty
/// to tell a full buffer from an empty one, leaving `N - 1` usable bytes.
#[derive(Debug)]
pub struct RingBuffer<const N: usize> {
    storage: Vec<u8, N>,
    head: usize,
    tail: usize,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    pub fn new() -> Self {
        let mut storage = Vec::new();
        storage.resize_default(N).ok();
        Self {
            storage,
            head: 0,
            tail: 0,
        }
    }

    /// Number of bytes currently held.
    pub fn used(&self) -> usize {
        if self.head >= self.tail {
            self.head - self.tail
        } else {
            N - (self.tail - self.head)
        }
    }

    /// Number of bytes that fit without evicting old data.
    pub fn free(&self) -> usize {
        N - 1 - self.used()
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Drop all held bytes.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    /// Append `data`, evicting the oldest bytes when it does not fit.
    ///
    /// At most `N - 1` bytes are stored; an oversized write keeps only the
    /// leading `N - 1` bytes of `data`. Returns the number of bytes written.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let write_len = data.len().min(N - 1);
        if write_len == 0 {
            return 0;
        }
        let overwrite = write_len > self.free();

        let first = write_len.min(N - self.head);
        self.storage[self.head..self.head + first].copy_from_slice(&data[..first]);
        self.storage[..write_len - first].copy_from_slice(&data[first..write_len]);

        self.head = (self.head + write_len) % N;
        if overwrite {
            self.tail = (self.head + 1) % N;
        }
        write_len
    }

    /// Move up to `dst.len()` of the oldest held bytes into `dst`.
    /// Returns the number of bytes moved.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let read_len = dst.len().min(self.used());
        if read_len == 0 {
            return 0;
        }

        let first = read_len.min(N - self.tail);
        dst[..first].copy_from_slice(&self.storage[self.tail..self.tail + first]);
        dst[first..read_len].copy_from_slice(&self.storage[..read_len - first]);

        self.tail = (self.tail + read_len) % N;
        read_len
    }

    /// Oldest held byte, without consuming it.
    pub fn peek(&self) -> Option<u8> {
        if self.is_empty() {
            None
        } else {
            Some(self.storage[self.tail])
        }
    }

    /// Consume and return the oldest held byte.
    pub fn pop(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.tail = (self.tail + 1) % N;
        Some(byte)
    }

    /// Whether the held bytes end with `pattern`.
    ///
    /// An empty pattern never matches, nor does one longer than the current
    /// contents.
    pub fn ends_with(&self, pattern: &[u8]) -> bool {
        if pattern.is_empty() || pattern.len() > self.used() {
            return false;
        }
        let mut pos = self.head;
        for &expected in pattern.iter().rev() {
            pos = (pos + N - 1) % N;
            if self.storage[pos] != expected {
                return false;
            }
        }
        true
    }
}
