use crate::serial::DEFAULT_TIMEOUT_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub(crate) stream_timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stream_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout for the stream reading methods that take no explicit
    /// deadline, such as `find` and `parse_int`.
    pub fn with_stream_timeout(self, timeout_ms: u32) -> Self {
        Self {
            stream_timeout_ms: timeout_ms,
        }
    }
}
