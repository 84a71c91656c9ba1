mod app;
mod domain;
mod logging;
mod notifications;
mod persistence;
mod report;
mod ticker;

use anyhow::{Context, Result};
use app::AppState;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, disable_raw_mode, enable_raw_mode, ClearType},
};
use domain::{format_clock, format_estimate, format_minutes, timer_line, Column, TaskUpdate, TimerPhase};
use persistence::{ensure_dir, get_data_dir, init_local_dir, FileStorage};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "kairos")]
#[command(about = "A time-boxing task planner with a single countdown timer", long_about = None)]
struct Cli {
    /// Data directory. Defaults to the nearest .kairos directory, then ~/.kairos
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .kairos directory in the current directory
    Init,
    /// Add a task
    Add {
        name: String,
        /// Estimated duration (minutes, or hours with --hours)
        duration: f64,
        /// Interpret the duration as hours
        #[arg(long)]
        hours: bool,
        /// Planned date (YYYY-MM-DD). Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Show tasks grouped into Today, Upcoming and Done
    List,
    /// Show the timer
    Status,
    /// Start the countdown for a task
    Start { id: String },
    /// Pause or resume the timer
    Pause,
    /// Clear the timer without completing the task
    Dismiss,
    /// Complete the timed task (only once its countdown has run out)
    Complete,
    /// Delete a task
    Delete { id: String },
    /// Edit a task
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// New estimate (minutes, or hours with --hours)
        #[arg(long)]
        duration: Option<f64>,
        #[arg(long)]
        hours: bool,
        /// New planned date (YYYY-MM-DD)
        #[arg(short, long, conflicts_with = "clear_date")]
        date: Option<String>,
        /// Remove the planned date
        #[arg(long)]
        clear_date: bool,
        #[arg(short, long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        /// Remove the notes
        #[arg(long)]
        clear_notes: bool,
    },
    /// Copy a task as a new pending task
    Duplicate {
        id: String,
        /// Planned date of the copy (YYYY-MM-DD). Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Move a task into the position of another
    Reorder { id: String, over: String },
    /// Re-plan a task by dropping it on a column (today, upcoming)
    Drop { id: String, column: String },
    /// Put a task back to pending
    Reset { id: String },
    /// Run the countdown in the foreground, optionally starting a task first
    Run { id: Option<String> },
    /// Generate a report with statistics
    Report {
        /// Date to generate report for (YYYY-MM-DD format). Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
        /// Output file path. Defaults to <data dir>/report-YYYY-MM-DD.md
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    logging::init_logging()?;
    let cli = Cli::parse();
    let dir = cli.dir.as_deref();

    match cli.command {
        Some(Commands::Init) => {
            let cwd = std::env::current_dir().context("Could not determine current directory")?;
            let data_dir = init_local_dir(&cwd)?;
            println!("Initialized kairos directory: {}", data_dir.display());
            println!();
            println!("Kairos will now use this local directory for task storage.");
            Ok(())
        }
        Some(Commands::Add {
            name,
            duration,
            hours,
            date,
            notes,
        }) => {
            let (mut app, _) = open_app(dir)?;
            let planned_date = date.as_deref().map(parse_date).transpose()?;
            app.on_add(&name, to_minutes(duration, hours), planned_date, notes);
            ensure_applied(&mut app)?;
            if let Some(task) = app.tasks().last() {
                println!("Added {} ({})", task.name, short_id(&task.id));
            }
            Ok(())
        }
        Some(Commands::List) => {
            let (app, _) = open_app(dir)?;
            print_board(&app);
            Ok(())
        }
        Some(Commands::Status) => {
            let (app, _) = open_app(dir)?;
            print_status(&app);
            Ok(())
        }
        Some(Commands::Start { id }) => {
            let (mut app, _) = open_app(dir)?;
            let id = app.resolve_id(&id)?;
            app.on_start(&id);
            ensure_applied(&mut app)?;
            println!("{}", timer_line(app.timer(), app.active_task()));
            Ok(())
        }
        Some(Commands::Pause) => {
            let (mut app, _) = open_app(dir)?;
            app.on_toggle_pause();
            ensure_applied(&mut app)?;
            println!("{}", if app.timer().is_paused { "Paused" } else { "Resumed" });
            Ok(())
        }
        Some(Commands::Dismiss) => {
            let (mut app, _) = open_app(dir)?;
            match app.timer().task_id.clone() {
                Some(id) => {
                    app.on_dismiss();
                    println!("Dismissed timer for {}", short_id(&id));
                }
                None => println!("No timer running"),
            }
            Ok(())
        }
        Some(Commands::Complete) => {
            let (mut app, _) = open_app(dir)?;
            let owner = app.timer().task_id.clone();
            app.on_complete();
            ensure_applied(&mut app)?;
            let completed = owner.and_then(|id| app.tasks().iter().find(|t| t.id == id));
            if let Some(task) = completed {
                println!(
                    "Completed {} in {}",
                    task.name,
                    format_minutes(task.actual_minutes.unwrap_or(0))
                );
            }
            Ok(())
        }
        Some(Commands::Delete { id }) => {
            let (mut app, _) = open_app(dir)?;
            let id = app.resolve_id(&id)?;
            let name = app
                .tasks()
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.name.clone())
                .unwrap_or_default();
            app.on_delete(&id);
            ensure_applied(&mut app)?;
            println!("Deleted {}", name);
            Ok(())
        }
        Some(Commands::Edit {
            id,
            name,
            duration,
            hours,
            date,
            clear_date,
            notes,
            clear_notes,
        }) => {
            let (mut app, _) = open_app(dir)?;
            let id = app.resolve_id(&id)?;

            let planned_date = if clear_date {
                Some(None)
            } else {
                date.as_deref().map(parse_date).transpose()?.map(Some)
            };
            let notes = if clear_notes { Some(None) } else { notes.map(Some) };
            let update = TaskUpdate {
                name,
                duration_minutes: duration.map(|d| to_minutes(d, hours)),
                planned_date,
                notes,
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to change. See 'kairos edit --help'.");
            }

            app.on_update(&id, update);
            ensure_applied(&mut app)?;
            println!("Updated {}", short_id(&id));
            Ok(())
        }
        Some(Commands::Duplicate { id, date }) => {
            let (mut app, _) = open_app(dir)?;
            let id = app.resolve_id(&id)?;
            let planned_date = date
                .as_deref()
                .map(parse_date)
                .transpose()?
                .unwrap_or_else(app::today);
            app.on_duplicate(&id, planned_date);
            ensure_applied(&mut app)?;
            if let Some(copy) = app.tasks().last() {
                println!("Duplicated as {}", short_id(&copy.id));
            }
            Ok(())
        }
        Some(Commands::Reorder { id, over }) => {
            let (mut app, _) = open_app(dir)?;
            let id = app.resolve_id(&id)?;
            let over = app.resolve_id(&over)?;
            let before = task_ids(&app);
            app.on_reorder(&id, &over);
            if task_ids(&app) == before {
                println!("Nothing moved");
            }
            Ok(())
        }
        Some(Commands::Drop { id, column }) => {
            let (mut app, _) = open_app(dir)?;
            let id = app.resolve_id(&id)?;
            let target = Column::from_id(&column)
                .with_context(|| format!("Unknown column '{}'. Use today or upcoming.", column))?;
            app.on_drop_to_column(&id, target);
            ensure_applied(&mut app)?;
            println!("Moved {} to {}", short_id(&id), target.title());
            Ok(())
        }
        Some(Commands::Reset { id }) => {
            let (mut app, _) = open_app(dir)?;
            let id = app.resolve_id(&id)?;
            app.on_reset(&id);
            ensure_applied(&mut app)?;
            println!("Reset {}", short_id(&id));
            Ok(())
        }
        Some(Commands::Report { date, output }) => {
            let (app, data_dir) = open_app(dir)?;
            let report_date = date
                .as_deref()
                .map(parse_date)
                .transpose()?
                .unwrap_or_else(app::today);
            let output_path = output.map(PathBuf::from);

            println!("Generating report for {}...", report_date);
            let report_path =
                report::generate_report(app.tasks(), &data_dir, report_date, output_path)?;
            println!("Report generated: {}", report_path.display());
            Ok(())
        }
        Some(Commands::Run { id }) => {
            let (mut app, _) = open_app(dir)?;
            if let Some(id) = id {
                let id = app.resolve_id(&id)?;
                app.on_start(&id);
                ensure_applied(&mut app)?;
            }
            run_countdown(&mut app)
        }
        None => {
            let (mut app, _) = open_app(dir)?;
            run_countdown(&mut app)
        }
    }
}

/// Resolve the data directory and restore state from it
fn open_app(dir: Option<&Path>) -> Result<(AppState, PathBuf)> {
    let data_dir = get_data_dir(dir)?;
    ensure_dir(&data_dir)?;
    tracing::debug!(dir = %data_dir.display(), "using data directory");

    let app = AppState::load(Box::new(FileStorage::new(data_dir.clone())));
    Ok((app, data_dir))
}

/// Fail the command when the last collaborator call was declined
fn ensure_applied(app: &mut AppState) -> Result<()> {
    match app.take_declined() {
        Some(reason) => Err(reason.into()),
        None => Ok(()),
    }
}

fn task_ids(app: &AppState) -> Vec<String> {
    app.tasks().iter().map(|t| t.id.clone()).collect()
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid date format. Use YYYY-MM-DD: {}", e))
}

fn to_minutes(value: f64, hours: bool) -> f64 {
    if hours {
        value * 60.0
    } else {
        value
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn print_board(app: &AppState) {
    for (column, tasks) in app.columns(app::today()) {
        println!("{} ({})", column.title(), tasks.len());
        for task in tasks {
            let mut line = format!(
                "  {} {}  {}  {}",
                task.status.badge(),
                short_id(&task.id),
                task.name,
                format_estimate(task.duration_minutes)
            );
            if let Some(actual) = task.actual_minutes.filter(|_| task.is_completed()) {
                line.push_str(&format!(" -> {}", format_minutes(actual)));
            }
            if let Some(date) = task.planned_date {
                line.push_str(&format!("  {}", date.format("%Y-%m-%d")));
            }
            println!("{}", line);
        }
        println!();
    }
}

fn print_status(app: &AppState) {
    let timer = app.timer();
    println!("{}", timer_line(timer, app.active_task()));
    match timer.phase() {
        TimerPhase::Idle => {}
        TimerPhase::CountingDown => println!(
            "{} elapsed of {}",
            format_clock(timer.elapsed_seconds()),
            format_clock(timer.total_seconds)
        ),
        TimerPhase::Overtime => println!("Run 'kairos complete' to finish the task"),
    }
}

/// Progress bar of the remaining time
fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn draw_status(stdout: &mut io::Stdout, app: &AppState) -> Result<()> {
    let timer = app.timer();
    let line = format!(
        "{} {}   [space] pause  [c] complete  [d] dismiss  [q] quit",
        progress_bar(timer.remaining_ratio(), 20),
        timer_line(timer, app.active_task())
    );
    execute!(
        stdout,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(line)
    )?;
    stdout.flush()?;
    Ok(())
}

fn run_countdown(app: &mut AppState) -> Result<()> {
    enable_raw_mode()?;
    let result = countdown_loop(app);
    disable_raw_mode()?;
    println!();

    if let Err(e) = app.save() {
        eprintln!("Error saving state: {}", e);
    }

    result
}

fn countdown_loop(app: &mut AppState) -> Result<()> {
    let mut stdout = io::stdout();
    let poll = ticker::poll_duration();

    loop {
        app.pump(Instant::now());
        draw_status(&mut stdout, app)?;

        // Wake for the next tick or the next input poll, whichever is sooner
        let timeout = app
            .next_tick_in(Instant::now())
            .map_or(poll, |until_tick| until_tick.min(poll));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only process key press events (ignore key release)
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(())
                    }
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') | KeyCode::Char('p') => app.on_toggle_pause(),
                    KeyCode::Char('c') => app.on_complete(),
                    KeyCode::Char('d') => app.on_dismiss(),
                    _ => {}
                }
            }
        }
    }
}
