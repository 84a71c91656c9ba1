use super::enums::{Column, TaskStatus};
use super::task::Task;
use super::timer::Timer;
use chrono::NaiveDate;

/// Column a task belongs to on the board
pub fn column_for(task: &Task, today: NaiveDate) -> Column {
    if task.status == TaskStatus::Completed {
        return Column::Done;
    }
    match task.planned_date {
        Some(date) if date > today => Column::Upcoming,
        _ => Column::Today,
    }
}

/// Group tasks into board columns, keeping sequence order within each column
pub fn group_by_column(tasks: &[Task], today: NaiveDate) -> Vec<(Column, Vec<&Task>)> {
    Column::all()
        .iter()
        .map(|column| {
            let members = tasks
                .iter()
                .filter(|t| column_for(t, today) == *column)
                .collect();
            (*column, members)
        })
        .collect()
}

/// The task owning the timer, if any
pub fn active_task<'a>(tasks: &'a [Task], timer: &Timer) -> Option<&'a Task> {
    let id = timer.task_id.as_deref()?;
    tasks.iter().find(|t| t.id == id)
}

/// Format seconds as "MM:SS" (minutes keep counting past 99)
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Format minutes as "Xh Ym" (omits 0 values)
pub fn format_minutes(total_minutes: u64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours > 0 && minutes > 0 {
        format!("{}h {}m", hours, minutes)
    } else if hours > 0 {
        format!("{}h", hours)
    } else {
        format!("{}m", minutes)
    }
}

/// Format a (possibly fractional) estimate for display
pub fn format_estimate(duration_minutes: f64) -> String {
    format_minutes(duration_minutes.round().max(0.0) as u64)
}

/// One-line timer read-out, e.g. "12:04 Write report" or "+00:10 Write report (paused)"
pub fn timer_line(timer: &Timer, task: Option<&Task>) -> String {
    if timer.is_idle() {
        return "No timer running".to_string();
    }

    let clock = if timer.is_complete {
        format!("+{}", format_clock(timer.overtime_seconds))
    } else {
        format_clock(timer.remaining_seconds)
    };
    let name = task.map(|t| t.name.as_str()).unwrap_or("(unknown task)");

    let mut line = format!("{} {}", clock, name);
    if timer.is_complete {
        line.push_str(" - time's up");
    }
    if timer.is_paused {
        line.push_str(" (paused)");
    }
    line
}
