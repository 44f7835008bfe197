//! Coalescing of rapid edits into one change after a quiet period.
//!
//! There is no timer thread: the owner calls [`Debouncer::poll`] from its
//! own loop and receives the pending value once the deadline has passed.

use std::time::{Duration, Instant};

/// Quiet period used for simulator configuration edits.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Holds at most one pending value and the instant it becomes due.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Replace the pending value and restart the quiet period from `now`.
    pub fn submit_at(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    pub fn submit(&mut self, value: T) {
        self.submit_at(value, Instant::now());
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Take the pending value if its deadline is not after `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if *at <= now => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Take the pending value regardless of the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }

    /// Drop the pending value. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coalesces_to_last_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(500));
        d.submit_at(1, t0);
        d.submit_at(2, t0 + Duration::from_millis(300));
        assert_eq!(d.poll(t0 + Duration::from_millis(600)), None);
        assert_eq!(d.poll(t0 + Duration::from_millis(800)), Some(2));
        assert!(!d.is_pending());
        assert_eq!(d.poll(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_flush_and_cancel() {
        let mut d = Debouncer::default();
        d.submit("a");
        assert_eq!(d.flush(), Some("a"));
        assert_eq!(d.flush(), None);

        d.submit("b");
        assert!(d.cancel());
        assert!(!d.cancel());
        assert_eq!(d.poll(Instant::now() + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_deadline_tracks_submit() {
        let t0 = Instant::now();
        let mut d: Debouncer<u8> = Debouncer::default();
        assert_eq!(d.deadline(), None);
        d.submit_at(0, t0);
        assert_eq!(d.deadline(), Some(t0 + DEFAULT_QUIET_PERIOD));
    }
}
