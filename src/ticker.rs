use std::time::{Duration, Instant};

/// Timer resolution in milliseconds
pub const TICK_MS: u64 = 1000;

/// How often the foreground loop polls for input, in milliseconds
pub const POLL_MS: u64 = 250;

/// Get tick duration
pub fn tick_duration() -> Duration {
    Duration::from_millis(TICK_MS)
}

/// Get input poll duration
pub fn poll_duration() -> Duration {
    Duration::from_millis(POLL_MS)
}

/// Periodic one-second tick source.
///
/// Stopping discards the pending deadline; starting again schedules the
/// first tick a full interval later, so stopped time is never replayed.
/// While running, deadlines advance by exactly one interval per tick, so
/// late polling does not drift the clock.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Start fresh from `now` (restarts if already running)
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    /// Cancel any pending tick
    pub fn stop(&mut self) {
        self.next_due = None;
    }

    /// Number of ticks that fell due up to `now`, consuming them
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        let Some(mut next) = self.next_due else {
            return 0;
        };

        let mut count = 0;
        while next <= now {
            count += 1;
            next += self.interval;
        }
        self.next_due = Some(next);
        count
    }

    /// Time left until the next tick, if running
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_due
            .map(|next| next.saturating_duration_since(now))
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(tick_duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations() {
        assert_eq!(tick_duration(), Duration::from_secs(1));
        assert_eq!(poll_duration(), Duration::from_millis(250));
    }

    #[test]
    fn test_stopped_ticker_yields_nothing() {
        let mut ticker = Ticker::default();
        let now = Instant::now();
        assert!(!ticker.is_running());
        assert_eq!(ticker.due_ticks(now + Duration::from_secs(10)), 0);
        assert_eq!(ticker.time_until_next(now), None);
    }

    #[test]
    fn test_ticks_once_per_interval() {
        let mut ticker = Ticker::default();
        let t0 = Instant::now();
        ticker.start(t0);

        assert_eq!(ticker.due_ticks(t0 + Duration::from_millis(999)), 0);
        assert_eq!(ticker.due_ticks(t0 + Duration::from_millis(1000)), 1);
        assert_eq!(ticker.due_ticks(t0 + Duration::from_millis(1500)), 0);
        assert_eq!(ticker.due_ticks(t0 + Duration::from_millis(2000)), 1);
    }

    #[test]
    fn test_late_poll_catches_up_without_drift() {
        let mut ticker = Ticker::default();
        let t0 = Instant::now();
        ticker.start(t0);

        // Poll arrives 3.7s late: three whole seconds elapsed
        assert_eq!(ticker.due_ticks(t0 + Duration::from_millis(3700)), 3);
        // Next deadline is still aligned to t0
        assert_eq!(
            ticker.time_until_next(t0 + Duration::from_millis(3700)),
            Some(Duration::from_millis(300))
        );
        assert_eq!(ticker.due_ticks(t0 + Duration::from_millis(4000)), 1);
    }

    #[test]
    fn test_stop_then_start_does_not_replay() {
        let mut ticker = Ticker::default();
        let t0 = Instant::now();
        ticker.start(t0);
        assert_eq!(ticker.due_ticks(t0 + Duration::from_secs(2)), 2);

        ticker.stop();
        // Ten seconds pass while stopped
        let resumed = t0 + Duration::from_secs(12);
        ticker.start(resumed);
        assert_eq!(ticker.due_ticks(resumed), 0);
        assert_eq!(ticker.due_ticks(resumed + Duration::from_secs(1)), 1);
    }
}
