//! Debounced autosave timing.
//!
//! A plain state machine driven by caller-supplied timestamps. Every edit
//! restarts the window; only the latest edit survives. A manual save cancels
//! whatever is pending. Nothing here sleeps or spawns.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Delay between the last edit and the automatic save.
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 2000;

/// Longest accepted autosave delay: one day.
pub const MAX_AUTOSAVE_DELAY_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveDebouncer {
    delay: Duration,
    due_at: Option<DateTime<Utc>>,
}

impl AutosaveDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, due_at: None }
    }

    pub fn from_millis(delay_ms: u64) -> Self {
        let delay = i64::try_from(delay_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .unwrap_or(Duration::MAX);
        Self::new(delay)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record an edit at `now`, cancelling and restarting any pending timer.
    ///
    /// A deadline past the representable range saturates, so the timer only
    /// ends through `cancel` or a manual save.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let due = now
            .checked_add_signed(self.delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        debug!(due_at = %due, restarted = self.due_at.is_some(), "autosave scheduled");
        self.due_at = Some(due);
    }

    pub fn is_pending(&self) -> bool {
        self.due_at.is_some()
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_at
    }

    /// If the timer has expired at `now`, clear it and return true.
    pub fn fire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.due_at {
            Some(due) if now >= due => {
                self.due_at = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending timer. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.due_at.take().is_some()
    }
}

impl Default for AutosaveDebouncer {
    fn default() -> Self {
        Self::from_millis(DEFAULT_AUTOSAVE_DELAY_MS)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    #[test]
    fn fires_after_delay() {
        let mut d = AutosaveDebouncer::default();
        d.touch(t(0));
        assert!(!d.fire_if_due(t(1999)));
        assert!(d.fire_if_due(t(2000)));
        // Already fired; nothing pending.
        assert!(!d.fire_if_due(t(5000)));
    }

    #[test]
    fn new_edit_restarts_window() {
        let mut d = AutosaveDebouncer::default();
        d.touch(t(0));
        d.touch(t(1500));
        assert!(!d.fire_if_due(t(2000)));
        assert!(!d.fire_if_due(t(3499)));
        assert!(d.fire_if_due(t(3500)));
    }

    #[test]
    fn cancel_clears_pending() {
        let mut d = AutosaveDebouncer::from_millis(500);
        assert!(!d.cancel());
        d.touch(t(0));
        assert!(d.is_pending());
        assert!(d.cancel());
        assert!(!d.fire_if_due(t(10_000)));
    }

    #[test]
    fn oversized_delay_saturates_instead_of_overflowing() {
        let mut d = AutosaveDebouncer::new(Duration::MAX);
        d.touch(t(0));
        assert_eq!(d.due_at(), Some(DateTime::<Utc>::MAX_UTC));
        assert!(!d.fire_if_due(t(86_400_000)));
        assert!(d.cancel());

        let mut d = AutosaveDebouncer::from_millis(u64::MAX);
        d.touch(t(0));
        assert!(d.is_pending());
    }
}
