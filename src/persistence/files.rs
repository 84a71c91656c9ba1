use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the data directory (local or in the home directory)
pub const DATA_DIR_NAME: &str = ".kairos";

/// Get the data directory - an explicit override wins, then a local .kairos, then ~/.kairos
pub fn get_data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }

    // Check for local .kairos directory
    let current_dir = env::current_dir().context("Could not determine current directory")?;
    if let Some(local_dir) = find_local_dir(&current_dir) {
        return Ok(local_dir);
    }

    // Fall back to global ~/.kairos
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(DATA_DIR_NAME))
}

/// Find local .kairos directory by walking up the directory tree
fn find_local_dir(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        let data_dir = current.join(DATA_DIR_NAME);
        if data_dir.is_dir() {
            return Some(data_dir);
        }

        // Move up to parent directory
        current = current.parent()?;
    }
}

/// Ensure the data directory exists
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(())
}

/// Initialize a local .kairos directory inside `parent`
pub fn init_local_dir(parent: &Path) -> Result<PathBuf> {
    let data_dir = parent.join(DATA_DIR_NAME);

    if data_dir.exists() {
        anyhow::bail!("Data directory already exists: {}", data_dir.display());
    }

    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create directory: {}", data_dir.display()))?;

    Ok(data_dir)
}

/// Path of a stored record (`<key>.json`)
pub fn record_file(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", key))
}

/// Default path of the report for a date (report-YYYY-MM-DD.md)
pub fn report_file(dir: &Path, date: chrono::NaiveDate) -> PathBuf {
    dir.join(format!("report-{}.md", date.format("%Y-%m-%d")))
}

/// Atomically write content to a file using temp file + rename
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = path
        .parent()
        .context("File path has no parent directory")?;

    // Create temp file in the same directory
    let mut temp_file = NamedTempFile::new_in(dir)
        .context("Failed to create temporary file")?;

    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write to temporary file")?;

    // Sync to disk
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to sync temporary file")?;

    // Atomically rename temp file to target
    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist file: {}", path.display()))?;

    Ok(())
}

/// Read file content, None if the file doesn't exist
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Copy a file aside with a timestamp (name.bak.YYYYmmdd_HHMMSS.json)
pub fn backup_file<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let backup_path = path.with_extension(format!("bak.{}.json", timestamp));

    fs::copy(path, &backup_path)
        .with_context(|| format!("Failed to backup file: {}", path.display()))?;

    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_data_dir_override() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = get_data_dir(Some(temp_dir.path())).unwrap();
        assert_eq!(dir, temp_dir.path());
    }

    #[test]
    fn test_find_local_dir_walks_up() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = init_local_dir(temp_dir.path()).unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_local_dir(&nested), Some(data_dir));
    }

    #[test]
    fn test_init_local_dir_twice_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        init_local_dir(temp_dir.path()).unwrap();
        assert!(init_local_dir(temp_dir.path()).is_err());
    }

    #[test]
    fn test_atomic_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("test.json");

        atomic_write(&test_file, "[]").unwrap();
        assert_eq!(read_file(&test_file).unwrap().as_deref(), Some("[]"));

        atomic_write(&test_file, "[1]").unwrap();
        assert_eq!(read_file(&test_file).unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_read_nonexistent_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("nonexistent.json");
        assert_eq!(read_file(&test_file).unwrap(), None);
    }

    #[test]
    fn test_backup_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("timeboxed-tasks.json");

        atomic_write(&test_file, "not json").unwrap();
        let backup_path = backup_file(&test_file).unwrap();

        assert_ne!(backup_path, test_file);
        assert!(backup_path.exists());
        assert_eq!(read_file(&backup_path).unwrap().as_deref(), Some("not json"));
    }

    #[test]
    fn test_record_and_report_paths() {
        let dir = Path::new("/data");
        assert_eq!(record_file(dir, "timeboxed-timer"), dir.join("timeboxed-timer.json"));
        let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(report_file(dir, date), dir.join("report-2024-05-02.md"));
    }
}
