use super::enums::TaskStatus;
use super::error::TaskError;
use super::task::{normalize_notes, validate_duration, validate_name, Task};
use chrono::NaiveDate;

/// Partial edit of a task's user-editable fields
///
/// `planned_date` and `notes` use a nested option so a field can be cleared
/// (`Some(None)`) as well as left alone (`None`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub duration_minutes: Option<f64>,
    pub planned_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.duration_minutes.is_none()
            && self.planned_date.is_none()
            && self.notes.is_none()
    }
}

/// The ordered task sequence
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Tasks in display order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Find a task by exact id, or by a prefix that matches exactly one id
    pub fn resolve(&self, id_or_prefix: &str) -> Result<&Task, TaskError> {
        if let Some(task) = self.get(id_or_prefix) {
            return Ok(task);
        }
        if id_or_prefix.is_empty() {
            return Err(TaskError::NotFound(String::new()));
        }

        let mut matches = self.tasks.iter().filter(|t| t.id.starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task),
            (Some(_), Some(_)) => Err(TaskError::AmbiguousId(id_or_prefix.to_string())),
            _ => Err(TaskError::NotFound(id_or_prefix.to_string())),
        }
    }

    /// Append a new pending task and return its id
    pub fn add(
        &mut self,
        name: &str,
        duration_minutes: f64,
        planned_date: NaiveDate,
        notes: Option<String>,
    ) -> Result<String, TaskError> {
        let task = Task::new(name, duration_minutes, Some(planned_date), notes)?;
        let id = task.id.clone();
        self.tasks.push(task);
        Ok(id)
    }

    /// Remove a task, returning it
    pub fn delete(&mut self, id: &str) -> Result<Task, TaskError> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        Ok(self.tasks.remove(idx))
    }

    /// Edit name, estimate, planned date and notes; status and completion stay untouched
    pub fn update(&mut self, id: &str, update: TaskUpdate) -> Result<(), TaskError> {
        let task = self
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        // Validate everything before touching the task
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        if let Some(duration) = update.duration_minutes {
            validate_duration(duration)?;
        }

        if let Some(name) = update.name {
            task.name = name.trim().to_string();
        }
        if let Some(duration) = update.duration_minutes {
            task.duration_minutes = duration;
        }
        if let Some(planned_date) = update.planned_date {
            task.planned_date = planned_date;
        }
        if let Some(notes) = update.notes {
            task.notes = normalize_notes(notes);
        }
        Ok(())
    }

    /// Move `active_id` into the slot `over_id` occupies (remove, then insert)
    ///
    /// Returns whether the sequence changed.
    pub fn reorder(&mut self, active_id: &str, over_id: &str) -> bool {
        if active_id == over_id {
            return false;
        }
        let (Some(old_index), Some(new_index)) = (self.index_of(active_id), self.index_of(over_id))
        else {
            return false;
        };

        let moved = self.tasks.remove(old_index);
        self.tasks.insert(new_index, moved);
        true
    }

    /// Append a pending copy of a task planned for `planned_date`, returning the new id
    pub fn duplicate(&mut self, id: &str, planned_date: NaiveDate) -> Result<String, TaskError> {
        let copy = self
            .get(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?
            .duplicate(planned_date);
        let new_id = copy.id.clone();
        self.tasks.push(copy);
        Ok(new_id)
    }

    /// Force a task back to pending
    pub fn reset(&mut self, id: &str) -> Result<(), TaskError> {
        let task = self
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        task.reset();
        Ok(())
    }

    /// Make `id` the only active task, demoting any other active one
    pub fn activate(&mut self, id: &str) -> Result<(), TaskError> {
        let task = self.get(id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        if task.is_completed() {
            return Err(TaskError::AlreadyCompleted(id.to_string()));
        }

        for task in &mut self.tasks {
            if task.id == id {
                task.activate();
            } else {
                task.demote();
            }
        }
        Ok(())
    }

    /// Number of tasks currently active
    pub fn active_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Active)
            .count()
    }

    /// Demote every active task except `keep` (used to repair restored state)
    pub fn demote_all_except(&mut self, keep: Option<&str>) -> usize {
        let mut demoted = 0;
        for task in &mut self.tasks {
            if task.is_active() && Some(task.id.as_str()) != keep {
                task.demote();
                demoted += 1;
            }
        }
        demoted
    }
}
