use super::enums::TaskStatus;
use super::error::TaskError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Check that a name is usable as a task name
pub fn validate_name(name: &str) -> Result<(), TaskError> {
    if name.trim().is_empty() {
        return Err(TaskError::EmptyName);
    }
    Ok(())
}

/// Check that an estimate is a positive, finite number of minutes
pub fn validate_duration(duration_minutes: f64) -> Result<(), TaskError> {
    if !duration_minutes.is_finite() || duration_minutes <= 0.0 {
        return Err(TaskError::InvalidDuration(duration_minutes));
    }
    Ok(())
}

/// Convert an estimate in minutes to whole seconds, rounding to the nearest second
pub fn minutes_to_seconds(duration_minutes: f64) -> u64 {
    (duration_minutes * 60.0).round().max(0.0) as u64
}

/// Convert seconds to minutes, rounding half up
pub fn seconds_to_minutes(seconds: u64) -> u64 {
    seconds.saturating_add(30) / 60
}

/// A time-boxed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque identifier, assigned at creation
    pub id: String,
    /// Display name (never empty)
    pub name: String,
    /// Estimated duration in minutes
    pub duration_minutes: f64,
    /// Current status
    pub status: TaskStatus,
    /// Day the task is scheduled for
    #[serde(default)]
    pub planned_date: Option<NaiveDate>,
    /// Day the task was completed
    #[serde(default)]
    pub completed_date: Option<NaiveDate>,
    /// Countdown plus overtime, in minutes
    #[serde(default)]
    pub actual_minutes: Option<u64>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Overtime accrued before completion
    #[serde(default)]
    pub overtime_seconds: Option<u64>,
}

impl Task {
    pub fn new(
        name: &str,
        duration_minutes: f64,
        planned_date: Option<NaiveDate>,
        notes: Option<String>,
    ) -> Result<Self, TaskError> {
        validate_name(name)?;
        validate_duration(duration_minutes)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            duration_minutes,
            status: TaskStatus::Pending,
            planned_date,
            completed_date: None,
            actual_minutes: None,
            notes: normalize_notes(notes),
            overtime_seconds: None,
        })
    }

    /// Copy name, estimate and notes into a fresh pending task
    pub fn duplicate(&self, planned_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: self.name.clone(),
            duration_minutes: self.duration_minutes,
            status: TaskStatus::Pending,
            planned_date: Some(planned_date),
            completed_date: None,
            actual_minutes: None,
            notes: self.notes.clone(),
            overtime_seconds: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Bind this task to the timer
    pub fn activate(&mut self) {
        self.status = TaskStatus::Active;
    }

    /// Release an active task back to pending (no-op otherwise)
    pub fn demote(&mut self) {
        if self.status == TaskStatus::Active {
            self.status = TaskStatus::Pending;
        }
    }

    /// Force status back to pending, keeping any completion stamp
    pub fn reset(&mut self) {
        self.status = TaskStatus::Pending;
    }

    /// Mark completed and stamp all completion fields together
    pub fn mark_completed(&mut self, date: NaiveDate, actual_minutes: u64, overtime_seconds: u64) {
        self.status = TaskStatus::Completed;
        self.completed_date = Some(date);
        self.actual_minutes = Some(actual_minutes);
        self.overtime_seconds = Some(overtime_seconds);
    }

    /// Whether a completion stamp is present
    #[cfg(test)]
    pub fn has_completion(&self) -> bool {
        self.completed_date.is_some()
    }

    /// Completion fields are either all set or all unset
    #[cfg(test)]
    pub fn completion_is_consistent(&self) -> bool {
        let set = [
            self.completed_date.is_some(),
            self.actual_minutes.is_some(),
            self.overtime_seconds.is_some(),
        ];
        set.iter().all(|s| *s) || set.iter().all(|s| !*s)
    }
}

/// Treat blank notes as absent
pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_task_new() {
        let task = Task::new("  Write report ", 30.0, Some(date(2024, 5, 2)), None).unwrap();
        assert_eq!(task.name, "Write report");
        assert_eq!(task.duration_minutes, 30.0);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.planned_date, Some(date(2024, 5, 2)));
        assert!(!task.has_completion());
        assert!(task.completion_is_consistent());
        assert!(Uuid::parse_str(&task.id).is_ok());
    }

    #[test]
    fn test_task_new_rejects_bad_input() {
        assert_eq!(Task::new("   ", 30.0, None, None), Err(TaskError::EmptyName));
        assert_eq!(
            Task::new("Name", 0.0, None, None),
            Err(TaskError::InvalidDuration(0.0))
        );
        assert!(Task::new("Name", -5.0, None, None).is_err());
        assert!(Task::new("Name", f64::NAN, None, None).is_err());
        assert!(Task::new("Name", f64::INFINITY, None, None).is_err());
    }

    #[test]
    fn test_blank_notes_are_dropped() {
        let task = Task::new("Name", 10.0, None, Some("  ".to_string())).unwrap();
        assert_eq!(task.notes, None);
    }

    #[test]
    fn test_minutes_to_seconds_rounds_to_nearest_second() {
        assert_eq!(minutes_to_seconds(1.5), 90);
        // 0.1h entered as hours: 6.000000000000001 minutes
        assert_eq!(minutes_to_seconds(0.1 * 60.0), 360);
        assert_eq!(minutes_to_seconds(0.33), 20);
    }

    #[test]
    fn test_seconds_to_minutes_rounds_half_up() {
        assert_eq!(seconds_to_minutes(1810), 30);
        assert_eq!(seconds_to_minutes(1829), 30);
        assert_eq!(seconds_to_minutes(1830), 31);
        assert_eq!(seconds_to_minutes(29), 0);
        assert_eq!(seconds_to_minutes(30), 1);
        assert_eq!(seconds_to_minutes(u64::MAX), u64::MAX / 60);
    }

    #[test]
    fn test_duplicate_clears_status_and_completion() {
        let mut task = Task::new("Read", 20.0, None, Some("ch. 4".to_string())).unwrap();
        task.mark_completed(date(2024, 5, 1), 25, 300);

        let copy = task.duplicate(date(2024, 5, 3));
        assert_ne!(copy.id, task.id);
        assert_eq!(copy.name, "Read");
        assert_eq!(copy.duration_minutes, 20.0);
        assert_eq!(copy.notes.as_deref(), Some("ch. 4"));
        assert_eq!(copy.status, TaskStatus::Pending);
        assert_eq!(copy.planned_date, Some(date(2024, 5, 3)));
        assert!(!copy.has_completion());
        assert!(copy.completion_is_consistent());
    }

    #[test]
    fn test_mark_completed_sets_all_fields() {
        let mut task = Task::new("Name", 30.0, None, None).unwrap();
        task.activate();
        task.mark_completed(date(2024, 5, 1), 30, 10);

        assert!(task.is_completed());
        assert_eq!(task.completed_date, Some(date(2024, 5, 1)));
        assert_eq!(task.actual_minutes, Some(30));
        assert_eq!(task.overtime_seconds, Some(10));
        assert!(task.completion_is_consistent());
    }

    #[test]
    fn test_reset_keeps_completion_stamp() {
        let mut task = Task::new("Name", 30.0, None, None).unwrap();
        task.mark_completed(date(2024, 5, 1), 42, 720);
        task.reset();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.actual_minutes, Some(42));
        assert!(task.completion_is_consistent());
    }

    #[test]
    fn test_demote_only_affects_active() {
        let mut task = Task::new("Name", 30.0, None, None).unwrap();
        task.mark_completed(date(2024, 5, 1), 30, 0);
        task.demote();
        assert_eq!(task.status, TaskStatus::Completed);

        let mut task = Task::new("Name", 30.0, None, None).unwrap();
        task.activate();
        task.demote();
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{"id":"t1","name":"Old","durationMinutes":25,"status":"pending"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.duration_minutes, 25.0);
        assert_eq!(task.planned_date, None);
        assert_eq!(task.notes, None);
        assert!(task.completion_is_consistent());
    }

    #[test]
    fn test_serialize_uses_camel_case_and_iso_dates() {
        let mut task = Task::new("Name", 30.0, Some(date(2024, 5, 2)), None).unwrap();
        task.id = "t1".to_string();
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["durationMinutes"], 30.0);
        assert_eq!(json["plannedDate"], "2024-05-02");
        assert!(json["completedDate"].is_null());
        assert!(json["overtimeSeconds"].is_null());
    }
}
