use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Active,
    Completed,
}

impl TaskStatus {
    /// Short badge for list output
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Pending => "[ ]",
            Self::Active => "[>]",
            Self::Completed => "[x]",
        }
    }
}

/// Derived state of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// No task owns the clock
    Idle,
    /// Counting down from the estimate
    CountingDown,
    /// Estimate reached, counting up
    Overtime,
}

/// Board column a task is displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Undated, overdue or planned for today
    Today,
    /// Planned after today
    Upcoming,
    /// Completed tasks
    Done,
}

impl Column {
    /// Parse a column from a drop-target id
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "today" => Some(Self::Today),
            "upcoming" | "tomorrow" | "future" => Some(Self::Upcoming),
            "done" | "completed" => Some(Self::Done),
            _ => None,
        }
    }

    /// Display title
    pub fn title(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Upcoming => "Upcoming",
            Self::Done => "Done",
        }
    }

    /// Planned date a task gets when dropped on this column (None = not a drop target)
    pub fn drop_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Today => Some(today),
            Self::Upcoming => Some(today + Duration::days(1)),
            Self::Done => None,
        }
    }

    /// All columns in board order
    pub fn all() -> &'static [Column] {
        &[Column::Today, Column::Upcoming, Column::Done]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_serde_is_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
        let parsed: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, TaskStatus::Completed);
    }

    #[test]
    fn test_column_drop_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(Column::Today.drop_date(today), Some(today));
        assert_eq!(
            Column::Upcoming.drop_date(today),
            NaiveDate::from_ymd_opt(2024, 4, 1)
        );
        assert_eq!(Column::Done.drop_date(today), None);
    }

    #[test]
    fn test_column_from_id() {
        assert_eq!(Column::from_id("today"), Some(Column::Today));
        assert_eq!(Column::from_id("Tomorrow"), Some(Column::Upcoming));
        assert_eq!(Column::from_id("done"), Some(Column::Done));
        assert_eq!(Column::from_id("backlog"), None);
    }
}
