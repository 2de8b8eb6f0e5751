use fugit::{TimerDurationU32, TimerInstantU32};

/// Timer abstraction the engine is generic over.
///
/// `TIMER_HZ` is the tick rate of the underlying hardware timer. Durations
/// and instants use the [fugit] types at that rate; see the crate-level
/// documentation for a `std` reference implementation.
pub trait Clock<const TIMER_HZ: u32> {
    type Error;

    /// Current monotonic tick count.
    fn now(&mut self) -> TimerInstantU32<TIMER_HZ>;

    /// Arm the timer to expire after `duration`.
    fn start(&mut self, duration: TimerDurationU32<TIMER_HZ>) -> Result<(), Self::Error>;

    /// Poll an armed timer. Returns `WouldBlock` until the duration given
    /// to [`start`](Clock::start) has elapsed, then `Ok` on every call.
    fn wait(&mut self) -> nb::Result<(), Self::Error>;
}
