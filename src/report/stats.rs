use crate::domain::{Task, TaskStatus};
use chrono::{Duration, NaiveDate};

/// Headline numbers over completed tasks
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub completed_count: usize,
    /// Share of completed tasks finished within their estimate (0-100)
    pub time_accuracy_percent: u32,
    pub total_focused_minutes: u64,
    pub total_planned_minutes: u64,
    /// Mean of actual minus estimated minutes
    pub avg_delta_minutes: i64,
}

/// Planned vs overtime minutes for one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayStat {
    pub date: NaiveDate,
    pub planned_minutes: u64,
    pub overtime_minutes: u64,
}

/// Estimated vs actual minutes for one completed task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDelta {
    pub estimated_minutes: u64,
    pub actual_minutes: u64,
}

impl TaskDelta {
    pub fn is_over(&self) -> bool {
        self.actual_minutes > self.estimated_minutes
    }

    /// Minutes beyond the estimate (0 when on time)
    pub fn overrun_minutes(&self) -> u64 {
        self.actual_minutes.saturating_sub(self.estimated_minutes)
    }
}

/// Completed tasks carrying an actual time
pub fn completed_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed && t.actual_minutes.is_some())
        .collect()
}

fn estimate_minutes(task: &Task) -> u64 {
    task.duration_minutes.round().max(0.0) as u64
}

/// Estimated vs actual for a completed task
pub fn task_delta(task: &Task) -> Option<TaskDelta> {
    let actual_minutes = task.actual_minutes?;
    Some(TaskDelta {
        estimated_minutes: estimate_minutes(task),
        actual_minutes,
    })
}

/// Calculate the headline numbers over completed tasks
pub fn calculate_summary(tasks: &[Task]) -> Summary {
    let completed = completed_tasks(tasks);
    let completed_count = completed.len();

    if completed_count == 0 {
        return Summary {
            completed_count: 0,
            time_accuracy_percent: 0,
            total_focused_minutes: 0,
            total_planned_minutes: 0,
            avg_delta_minutes: 0,
        };
    }

    let mut on_time = 0;
    let mut total_focused_minutes: u64 = 0;
    let mut total_planned = 0.0;
    let mut total_delta = 0.0;

    for task in &completed {
        let actual = task.actual_minutes.unwrap_or(0);
        if actual as f64 <= task.duration_minutes {
            on_time += 1;
        }
        total_focused_minutes += actual;
        total_planned += task.duration_minutes;
        total_delta += actual as f64 - task.duration_minutes;
    }

    let time_accuracy_percent = ((on_time as f64 / completed_count as f64) * 100.0).round() as u32;
    let avg_delta_minutes = (total_delta / completed_count as f64).round() as i64;

    Summary {
        completed_count,
        time_accuracy_percent,
        total_focused_minutes,
        total_planned_minutes: total_planned.round() as u64,
        avg_delta_minutes,
    }
}

/// Planned and overtime minutes per day for the `days` days ending at `today`, oldest first
pub fn daily_breakdown(tasks: &[Task], today: NaiveDate, days: u32) -> Vec<DayStat> {
    let completed = completed_tasks(tasks);

    (0..days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset as i64);
            let mut planned = 0.0;
            let mut actual: u64 = 0;
            for task in completed.iter().filter(|t| t.completed_date == Some(date)) {
                planned += task.duration_minutes;
                actual += task.actual_minutes.unwrap_or(0);
            }
            let planned_minutes = planned.round() as u64;
            DayStat {
                date,
                planned_minutes,
                overtime_minutes: actual.saturating_sub(planned_minutes),
            }
        })
        .collect()
}
