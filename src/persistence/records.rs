use super::storage::Storage;
use crate::domain::{Task, Timer};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Storage key of the task sequence
pub const TASKS_KEY: &str = "timeboxed-tasks";

/// Storage key of the timer snapshot
pub const TIMER_KEY: &str = "timeboxed-timer";

/// Read and parse one record.
///
/// `Ok(None)` means the record is missing or blank. Unparseable records are
/// backed up so the next write cannot destroy them.
fn read_record<T>(storage: &mut dyn Storage, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let raw = match storage.read(key)? {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(None),
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            if let Err(e) = storage.backup(key) {
                tracing::warn!(key, error = %e, "could not back up corrupt record");
            }
            Err(e).with_context(|| format!("Corrupt record: {}", key))
        }
    }
}

/// Load a record at startup, falling back to `T::default()` on any failure
fn load_or_default<T>(storage: &mut dyn Storage, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match read_record(storage, key) {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "could not load record, starting empty");
            T::default()
        }
    }
}

/// Re-read a record another process may have written since the last read.
///
/// `None` when it cannot be read, so the caller keeps its current copy.
fn reload<T>(storage: &mut dyn Storage, key: &str) -> Option<T>
where
    T: DeserializeOwned + Default,
{
    match read_record(storage, key) {
        Ok(value) => Some(value.unwrap_or_default()),
        Err(e) => {
            tracing::warn!(key, error = %e, "could not reload record, keeping current state");
            None
        }
    }
}

/// Load the task sequence (empty when missing or corrupt)
pub fn load_tasks(storage: &mut dyn Storage) -> Vec<Task> {
    load_or_default(storage, TASKS_KEY)
}

/// Load the timer snapshot (idle when missing or corrupt)
pub fn load_timer(storage: &mut dyn Storage) -> Timer {
    load_or_default(storage, TIMER_KEY)
}

/// Current persisted task sequence, `None` when unreadable
pub fn reload_tasks(storage: &mut dyn Storage) -> Option<Vec<Task>> {
    reload(storage, TASKS_KEY)
}

/// Current persisted timer snapshot, `None` when unreadable
pub fn reload_timer(storage: &mut dyn Storage) -> Option<Timer> {
    reload(storage, TIMER_KEY)
}

/// Persist the task sequence in order
pub fn save_tasks(storage: &mut dyn Storage, tasks: &[Task]) -> Result<()> {
    let json = serde_json::to_string_pretty(tasks).context("Failed to encode tasks")?;
    storage.write(TASKS_KEY, &json)
}

/// Persist the timer snapshot
pub fn save_timer(storage: &mut dyn Storage, timer: &Timer) -> Result<()> {
    let json = serde_json::to_string_pretty(timer).context("Failed to encode timer")?;
    storage.write(TIMER_KEY, &json)
}
