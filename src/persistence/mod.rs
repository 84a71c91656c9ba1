pub mod files;
pub mod records;
pub mod storage;

pub use files::{atomic_write, ensure_dir, get_data_dir, init_local_dir, report_file};
pub use records::{load_tasks, load_timer, reload_tasks, reload_timer, save_tasks, save_timer};
pub use storage::{FileStorage, Storage};

#[cfg(test)]
pub use records::{TASKS_KEY, TIMER_KEY};
#[cfg(test)]
pub use storage::MemoryStorage;
