use crate::domain::{format_estimate, format_minutes, Task};
use crate::persistence::{atomic_write, ensure_dir, report_file};
use crate::report::stats::{calculate_summary, completed_tasks, daily_breakdown, task_delta};
use anyhow::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Days covered by the per-day table
pub const BREAKDOWN_DAYS: u32 = 7;

/// Format a signed minute delta as "+Xm" / "-Xm" / "0m"
fn format_delta(minutes: i64) -> String {
    if minutes > 0 {
        format!("+{}", format_minutes(minutes as u64))
    } else if minutes < 0 {
        format!("-{}", format_minutes(minutes.unsigned_abs()))
    } else {
        "0m".to_string()
    }
}

/// Render the markdown report for `date`
pub fn render_report(tasks: &[Task], date: NaiveDate) -> String {
    let summary = calculate_summary(tasks);
    let days = daily_breakdown(tasks, date, BREAKDOWN_DAYS);

    let mut report = String::new();

    // Header
    report.push_str(&format!("# Time-Box Report - {}\n\n", date.format("%Y-%m-%d")));

    // Summary Section
    report.push_str("## Summary\n\n");
    report.push_str(&format!("- **Completed Tasks:** {}\n", summary.completed_count));
    report.push_str(&format!("- **Time Accuracy:** {}%\n", summary.time_accuracy_percent));
    report.push_str(&format!(
        "- **Focused Time:** {} / {} planned\n",
        format_minutes(summary.total_focused_minutes),
        format_minutes(summary.total_planned_minutes)
    ));
    report.push_str(&format!(
        "- **Average Delta:** {}\n\n",
        format_delta(summary.avg_delta_minutes)
    ));

    // Last days
    report.push_str(&format!("## Last {} Days\n\n", BREAKDOWN_DAYS));
    report.push_str("| Day | Planned | Overtime |\n");
    report.push_str("|-----|---------|----------|\n");
    for day in &days {
        report.push_str(&format!(
            "| {} | {} | {} |\n",
            day.date.format("%a %Y-%m-%d"),
            format_minutes(day.planned_minutes),
            format_minutes(day.overtime_minutes)
        ));
    }
    report.push('\n');

    // Completed on the report date, in sequence order
    let done_today: Vec<&Task> = completed_tasks(tasks)
        .into_iter()
        .filter(|t| t.completed_date == Some(date))
        .collect();

    report.push_str("## Completed\n\n");
    if done_today.is_empty() {
        report.push_str("_Nothing completed._\n");
    }
    for task in done_today {
        let Some(delta) = task_delta(task) else {
            continue;
        };
        let marker = if delta.is_over() { "over" } else { "on time" };
        report.push_str(&format!(
            "- [x] **{}** - {} / {} estimated ({})\n",
            task.name,
            format_minutes(delta.actual_minutes),
            format_estimate(task.duration_minutes),
            marker
        ));
        if delta.is_over() {
            report.push_str(&format!(
                "  - Overrun: {}\n",
                format_minutes(delta.overrun_minutes())
            ));
        }
        if let Some(notes) = &task.notes {
            report.push_str(&format!("  - Notes: {}\n", notes));
        }
    }

    report
}

/// Generate the report for `date` and write it to `output` or `<dir>/report-YYYY-MM-DD.md`
pub fn generate_report(
    tasks: &[Task],
    dir: &Path,
    date: NaiveDate,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let report = render_report(tasks, date);

    let output = match output {
        Some(path) => path,
        None => {
            ensure_dir(dir)?;
            report_file(dir, date)
        }
    };

    atomic_write(&output, &report)?;
    tracing::info!(path = %output.display(), "report written");

    Ok(output)
}
