use super::files::{atomic_write, backup_file, ensure_dir, read_file, record_file};
use anyhow::Result;
#[cfg(test)]
use std::collections::HashMap;
use std::path::PathBuf;

/// Durable key-value storage for the persisted records
pub trait Storage {
    /// Read a record; `None` when it was never written
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace a record
    fn write(&mut self, key: &str, value: &str) -> Result<()>;

    /// Keep a copy of a record that failed to load, before it gets overwritten
    fn backup(&mut self, _key: &str) -> Result<()> {
        Ok(())
    }
}

/// One JSON file per record inside the data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        read_file(record_file(&self.dir, key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        ensure_dir(&self.dir)?;
        atomic_write(record_file(&self.dir, key), value)
    }

    fn backup(&mut self, key: &str) -> Result<()> {
        let path = backup_file(record_file(&self.dir, key))?;
        tracing::warn!(backup = %path.display(), "kept a copy of unreadable record");
        Ok(())
    }
}

/// In-memory storage for engine tests
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    /// Keys for which `backup` was requested
    pub backups: Vec<String>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn backup(&mut self, key: &str) -> Result<()> {
        self.backups.push(key.to_string());
        Ok(())
    }
}
