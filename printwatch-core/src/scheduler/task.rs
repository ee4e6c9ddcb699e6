//! Periodic task record

/// One unit of periodic work
///
/// Timestamps are milliseconds on the station's monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Task<K> {
    id: K,
    interval_ms: u32,
    enabled: bool,
    last_run_at: Option<u64>,
    forced: bool,
}

impl<K: Copy + Eq> Task<K> {
    /// Enabled task that runs on the first tick, then every `interval_ms`
    pub const fn new(id: K, interval_ms: u32) -> Self {
        Self {
            id,
            interval_ms,
            enabled: true,
            last_run_at: None,
            forced: false,
        }
    }

    /// Task registered but not dispatched until enabled
    pub const fn disabled(id: K, interval_ms: u32) -> Self {
        Self {
            id,
            interval_ms,
            enabled: false,
            last_run_at: None,
            forced: false,
        }
    }

    pub fn id(&self) -> K {
        self.id
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start of the most recent run
    pub fn last_run_at(&self) -> Option<u64> {
        self.last_run_at
    }

    /// A forced run is pending
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Check if the task should run at `now_ms`
    ///
    /// A clock reading earlier than the last run counts as no time elapsed.
    pub fn is_due(&self, now_ms: u64) -> bool {
        if !self.enabled {
            return false;
        }
        match self.last_run_at {
            None => true,
            Some(_) if self.forced => true,
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.interval_ms),
        }
    }

    /// Milliseconds until the task is due (0 if due now)
    pub fn due_in(&self, now_ms: u64) -> Option<u64> {
        if !self.enabled {
            return None;
        }
        if self.is_due(now_ms) {
            return Some(0);
        }
        let elapsed = self
            .last_run_at
            .map_or(0, |last| now_ms.saturating_sub(last));
        Some(u64::from(self.interval_ms) - elapsed)
    }

    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(super) fn set_interval(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms;
    }

    pub(super) fn force(&mut self) {
        self.forced = true;
    }

    /// Record a run (or a restart) at `now_ms`
    ///
    /// The last run time never moves backwards.
    pub(super) fn mark_run(&mut self, now_ms: u64) {
        self.last_run_at = Some(self.last_run_at.map_or(now_ms, |last| last.max(now_ms)));
        self.forced = false;
    }
}
