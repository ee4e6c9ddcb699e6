//! Time source abstraction

/// Monotonic millisecond clock
///
/// `now_ms` takes `&mut self` so implementations may yield to the
/// platform's background work (WiFi stack, watchdog) while callers spin.
pub trait Clock {
    /// Milliseconds since boot
    fn now_ms(&mut self) -> u64;
}
