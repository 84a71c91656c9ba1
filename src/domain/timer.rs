use super::enums::TimerPhase;
use super::task::{minutes_to_seconds, seconds_to_minutes};
use serde::{Deserialize, Serialize};

/// What a single advance did to the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Nothing owns the clock or it is paused
    Skipped,
    /// One second came off the countdown
    CountedDown,
    /// The countdown just reached zero
    ReachedZero,
    /// One second of overtime accrued
    Overtime,
}

/// The single countdown-then-overtime clock
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    /// Task owning the clock
    pub task_id: Option<String>,
    /// Seconds left on the countdown
    pub remaining_seconds: u64,
    /// Planned duration, fixed for the run
    pub total_seconds: u64,
    pub is_paused: bool,
    /// Countdown reached zero; the clock now counts up
    pub is_complete: bool,
    /// Seconds counted after the countdown reached zero
    #[serde(default)]
    pub overtime_seconds: u64,
}

impl Timer {
    /// An idle timer owning nothing
    pub fn idle() -> Self {
        Self::default()
    }

    /// A fresh countdown for a task
    pub fn for_task(task_id: &str, duration_minutes: f64) -> Self {
        let total_seconds = minutes_to_seconds(duration_minutes);
        Self {
            task_id: Some(task_id.to_string()),
            remaining_seconds: total_seconds,
            total_seconds,
            is_paused: false,
            // A sub-second estimate starts in overtime
            is_complete: total_seconds == 0,
            overtime_seconds: 0,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        match (&self.task_id, self.is_complete) {
            (None, _) => TimerPhase::Idle,
            (Some(_), false) => TimerPhase::CountingDown,
            (Some(_), true) => TimerPhase::Overtime,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.task_id.is_none()
    }

    /// Whether ticks should currently be delivered
    pub fn is_running(&self) -> bool {
        self.task_id.is_some() && !self.is_paused
    }

    /// Whether the clock belongs to `task_id`
    pub fn owns(&self, task_id: &str) -> bool {
        self.task_id.as_deref() == Some(task_id)
    }

    /// Advance the clock by one second
    pub fn advance(&mut self) -> Advance {
        if !self.is_running() {
            return Advance::Skipped;
        }

        if self.is_complete {
            self.overtime_seconds = self.overtime_seconds.saturating_add(1);
            return Advance::Overtime;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.is_complete = true;
            Advance::ReachedZero
        } else {
            Advance::CountedDown
        }
    }

    /// Flip the paused flag (no-op while idle); returns whether it changed
    pub fn toggle_pause(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        self.is_paused = !self.is_paused;
        true
    }

    /// Return to idle
    pub fn clear(&mut self) {
        *self = Self::idle();
    }

    /// Countdown plus overtime in seconds
    pub fn elapsed_seconds(&self) -> u64 {
        (self.total_seconds - self.remaining_seconds.min(self.total_seconds))
            .saturating_add(self.overtime_seconds)
    }

    /// Minutes to record on completion: full estimate plus overtime, rounded half up
    pub fn actual_minutes(&self) -> u64 {
        seconds_to_minutes(self.total_seconds.saturating_add(self.overtime_seconds))
    }

    /// Fraction of the countdown still remaining (1.0 at start, 0.0 at zero)
    pub fn remaining_ratio(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        self.remaining_seconds as f64 / self.total_seconds as f64
    }

    /// Repair a restored snapshot so its fields agree with each other
    pub fn sanitize(&mut self) {
        if self.task_id.is_none() {
            self.clear();
            return;
        }
        if self.remaining_seconds > self.total_seconds {
            self.remaining_seconds = self.total_seconds;
        }
        if self.remaining_seconds == 0 {
            self.is_complete = true;
        }
        if !self.is_complete {
            self.overtime_seconds = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_for_task() {
        let timer = Timer::for_task("t1", 30.0);
        assert_eq!(timer.task_id.as_deref(), Some("t1"));
        assert_eq!(timer.total_seconds, 1800);
        assert_eq!(timer.remaining_seconds, 1800);
        assert!(!timer.is_paused);
        assert!(!timer.is_complete);
        assert_eq!(timer.overtime_seconds, 0);
        assert_eq!(timer.phase(), TimerPhase::CountingDown);
    }

    #[test]
    fn test_idle_timer_never_advances() {
        let mut timer = Timer::idle();
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.advance(), Advance::Skipped);
        assert_eq!(timer, Timer::idle());
        assert!(!timer.toggle_pause());
        assert!(!timer.is_paused);
    }

    #[test]
    fn test_countdown_then_overtime() {
        let mut timer = Timer::for_task("t1", 1.0);

        for _ in 0..59 {
            assert_eq!(timer.advance(), Advance::CountedDown);
        }
        assert_eq!(timer.remaining_seconds, 1);
        assert_eq!(timer.advance(), Advance::ReachedZero);
        assert_eq!(timer.remaining_seconds, 0);
        assert!(timer.is_complete);
        assert_eq!(timer.phase(), TimerPhase::Overtime);
        assert_eq!(timer.overtime_seconds, 0);

        for _ in 0..10 {
            assert_eq!(timer.advance(), Advance::Overtime);
        }
        assert_eq!(timer.remaining_seconds, 0);
        assert_eq!(timer.overtime_seconds, 10);
        assert_eq!(timer.elapsed_seconds(), 70);
    }

    #[test]
    fn test_paused_timer_does_not_advance() {
        let mut timer = Timer::for_task("t1", 1.0);
        timer.advance();
        assert!(timer.toggle_pause());
        assert!(!timer.is_running());

        assert_eq!(timer.advance(), Advance::Skipped);
        assert_eq!(timer.remaining_seconds, 59);

        timer.toggle_pause();
        timer.advance();
        assert_eq!(timer.remaining_seconds, 58);
    }

    #[test]
    fn test_pause_in_overtime() {
        let mut timer = Timer::for_task("t1", 1.0 / 60.0);
        assert_eq!(timer.advance(), Advance::ReachedZero);
        timer.advance();
        timer.toggle_pause();
        timer.advance();
        assert_eq!(timer.overtime_seconds, 1);
        assert_eq!(timer.phase(), TimerPhase::Overtime);
    }

    #[test]
    fn test_actual_minutes() {
        let mut timer = Timer::for_task("t1", 30.0);
        timer.remaining_seconds = 0;
        timer.is_complete = true;
        timer.overtime_seconds = 10;
        assert_eq!(timer.actual_minutes(), 30);

        timer.overtime_seconds = 30;
        assert_eq!(timer.actual_minutes(), 31);
    }

    #[test]
    fn test_huge_restored_counters_do_not_overflow() {
        let json = r#"{"taskId":"t1","remainingSeconds":0,"totalSeconds":18446744073709551615,"isPaused":false,"isComplete":true,"overtimeSeconds":18446744073709551615}"#;
        let mut timer: Timer = serde_json::from_str(json).unwrap();
        timer.sanitize();

        assert_eq!(timer.elapsed_seconds(), u64::MAX);
        assert_eq!(timer.actual_minutes(), u64::MAX / 60);
        assert_eq!(timer.advance(), Advance::Overtime);
        assert_eq!(timer.overtime_seconds, u64::MAX);
    }

    #[test]
    fn test_clear_twice_matches_once() {
        let mut once = Timer::for_task("t1", 5.0);
        once.clear();
        let mut twice = Timer::for_task("t1", 5.0);
        twice.clear();
        twice.clear();
        assert_eq!(once, twice);
        assert_eq!(once, Timer::idle());
    }

    #[test]
    fn test_remaining_ratio() {
        let mut timer = Timer::for_task("t1", 2.0);
        assert_eq!(timer.remaining_ratio(), 1.0);
        timer.remaining_seconds = 30;
        assert_eq!(timer.remaining_ratio(), 0.25);
        assert_eq!(Timer::idle().remaining_ratio(), 0.0);
    }

    #[test]
    fn test_snapshot_without_overtime_defaults_to_zero() {
        let json = r#"{"taskId":"t1","remainingSeconds":0,"totalSeconds":1500,"isPaused":false,"isComplete":true}"#;
        let timer: Timer = serde_json::from_str(json).unwrap();
        assert_eq!(timer.overtime_seconds, 0);
        assert_eq!(timer.phase(), TimerPhase::Overtime);
    }

    #[test]
    fn test_sanitize() {
        let mut timer = Timer {
            task_id: Some("t1".to_string()),
            remaining_seconds: 5000,
            total_seconds: 1800,
            is_paused: false,
            is_complete: false,
            overtime_seconds: 7,
        };
        timer.sanitize();
        assert_eq!(timer.remaining_seconds, 1800);
        assert_eq!(timer.overtime_seconds, 0);

        let mut timer = Timer {
            task_id: Some("t1".to_string()),
            remaining_seconds: 0,
            total_seconds: 1800,
            is_paused: true,
            is_complete: false,
            overtime_seconds: 0,
        };
        timer.sanitize();
        assert!(timer.is_complete);

        let mut timer = Timer {
            task_id: None,
            remaining_seconds: 40,
            total_seconds: 60,
            is_paused: true,
            is_complete: false,
            overtime_seconds: 3,
        };
        timer.sanitize();
        assert_eq!(timer, Timer::idle());
    }
}
