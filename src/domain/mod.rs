pub mod enums;
pub mod error;
pub mod store;
pub mod task;
pub mod timer;
pub mod views;

pub use enums::{Column, TaskStatus, TimerPhase};
pub use error::TaskError;
pub use store::{TaskStore, TaskUpdate};
pub use task::Task;
pub use timer::{Advance, Timer};
pub use views::{active_task, format_clock, format_estimate, format_minutes, group_by_column, timer_line};
