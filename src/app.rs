use crate::domain::{
    active_task, group_by_column, Advance, Column, Task, TaskError, TaskStore, TaskUpdate, Timer,
};
use crate::notifications;
use crate::persistence::{
    load_tasks, load_timer, reload_tasks, reload_timer, save_tasks, save_timer, Storage,
};
use crate::ticker::Ticker;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::time::{Duration, Instant};

/// Current local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Main application state: the task sequence, the single timer, its tick
/// source and the storage both are persisted to
pub struct AppState {
    store: TaskStore,
    timer: Timer,
    ticker: Ticker,
    storage: Box<dyn Storage>,
    pub needs_save: bool,
    pub timer_needs_save: bool,
    /// Why the last collaborator call was declined
    last_declined: Option<TaskError>,
}

impl AppState {
    /// Restore state from storage, repairing anything inconsistent
    pub fn load(mut storage: Box<dyn Storage>) -> Self {
        let tasks = load_tasks(storage.as_mut());
        let mut timer = load_timer(storage.as_mut());
        timer.sanitize();

        let mut app = Self {
            store: TaskStore::new(tasks),
            timer,
            ticker: Ticker::default(),
            storage,
            needs_save: false,
            timer_needs_save: false,
            last_declined: None,
        };
        app.repair();
        app.sync_ticker(Instant::now());
        app
    }

    /// Pick up what other processes persisted since the last read.
    ///
    /// Records with unsaved local changes are kept as they are.
    fn refresh(&mut self, now: Instant) {
        if !self.needs_save {
            match reload_tasks(self.storage.as_mut()) {
                Some(tasks) => self.store = TaskStore::new(tasks),
                None => self.needs_save = true,
            }
        }
        if !self.timer_needs_save {
            match reload_timer(self.storage.as_mut()) {
                Some(mut timer) => {
                    timer.sanitize();
                    self.timer = timer;
                }
                None => self.timer_needs_save = true,
            }
        }

        self.repair();
        self.sync_ticker(now);
        self.flush();
    }

    /// Make restored state satisfy the single-active-task invariants
    fn repair(&mut self) {
        if let Some(owner) = self.timer.task_id.clone() {
            match self.store.get(&owner) {
                None => {
                    tracing::warn!(task = %owner, "timer owned a missing task, clearing it");
                    self.timer.clear();
                    self.timer_needs_save = true;
                }
                Some(task) if task.is_completed() => {
                    tracing::warn!(task = %owner, "timer owned a completed task, clearing it");
                    self.timer.clear();
                    self.timer_needs_save = true;
                }
                Some(task) if !task.is_active() => {
                    if self.store.activate(&owner).is_ok() {
                        self.needs_save = true;
                    }
                }
                Some(_) => {}
            }
        }

        if self.store.active_count() > 1 {
            let keep = self.timer.task_id.clone().or_else(|| {
                self.store
                    .tasks()
                    .iter()
                    .find(|t| t.is_active())
                    .map(|t| t.id.clone())
            });
            let demoted = self.store.demote_all_except(keep.as_deref());
            tracing::warn!(demoted, "more than one active task, demoted extras");
            self.needs_save = true;
        }
    }

    /// Tasks in display order
    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    /// Current timer snapshot
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// The task owning the timer
    pub fn active_task(&self) -> Option<&Task> {
        active_task(self.store.tasks(), &self.timer)
    }

    /// Tasks grouped into board columns
    pub fn columns(&self, today: NaiveDate) -> Vec<(Column, Vec<&Task>)> {
        group_by_column(self.store.tasks(), today)
    }

    /// Resolve a full id or unique id prefix
    pub fn resolve_id(&self, id_or_prefix: &str) -> Result<String, TaskError> {
        self.store.resolve(id_or_prefix).map(|t| t.id.clone())
    }

    #[cfg(test)]
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Add a task, planned for today unless a date is given
    fn add_task(
        &mut self,
        name: &str,
        duration_minutes: f64,
        planned_date: Option<NaiveDate>,
        notes: Option<String>,
    ) -> Result<String, TaskError> {
        self.refresh(Instant::now());
        let planned_date = planned_date.unwrap_or_else(today);
        let id = self.store.add(name, duration_minutes, planned_date, notes)?;
        tracing::info!(task = %id, "added task");

        self.needs_save = true;
        self.flush();
        Ok(id)
    }

    /// Bind the timer to a task, ending any timer already running
    fn start_task(&mut self, id: &str) -> Result<(), TaskError> {
        self.refresh(Instant::now());
        let duration_minutes = self
            .store
            .get(id)
            .map(|t| t.duration_minutes)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        self.store.activate(id)?;

        if let Some(previous) = self.timer.task_id.as_deref().filter(|p| *p != id) {
            tracing::info!(task = %previous, "ending previous timer");
        }
        self.timer = Timer::for_task(id, duration_minutes);
        tracing::info!(task = %id, seconds = self.timer.total_seconds, "started timer");

        // The old tick source belongs to the old timer
        self.ticker.stop();
        self.needs_save = true;
        self.timer_needs_save = true;
        self.sync_ticker(Instant::now());
        self.flush();
        Ok(())
    }

    /// Remove a task; clears the timer in the same step when it owned it
    fn delete_task(&mut self, id: &str) -> Result<Task, TaskError> {
        self.refresh(Instant::now());
        let task = self.store.delete(id)?;
        if self.timer.owns(id) {
            tracing::info!(task = %id, "deleted task owned the timer, clearing it");
            self.timer.clear();
            self.timer_needs_save = true;
        }

        self.needs_save = true;
        self.sync_ticker(Instant::now());
        self.flush();
        Ok(task)
    }

    /// Edit a task's name, estimate, planned date or notes
    fn update_task(&mut self, id: &str, update: TaskUpdate) -> Result<(), TaskError> {
        self.refresh(Instant::now());
        self.store.update(id, update)?;
        self.needs_save = true;
        self.flush();
        Ok(())
    }

    /// Append a pending copy of a task planned for `planned_date`
    fn duplicate_task(&mut self, id: &str, planned_date: NaiveDate) -> Result<String, TaskError> {
        self.refresh(Instant::now());
        let new_id = self.store.duplicate(id, planned_date)?;
        tracing::info!(task = %id, copy = %new_id, "duplicated task");
        self.needs_save = true;
        self.flush();
        Ok(new_id)
    }

    /// Move `active_id` into the slot of `over_id`; returns whether anything moved
    fn reorder_tasks(&mut self, active_id: &str, over_id: &str) -> bool {
        self.refresh(Instant::now());
        if !self.store.reorder(active_id, over_id) {
            return false;
        }
        self.needs_save = true;
        self.flush();
        true
    }

    /// Force a task back to pending; a timer it owned is dismissed
    fn reset_task(&mut self, id: &str) -> Result<(), TaskError> {
        self.refresh(Instant::now());
        self.store.reset(id)?;
        if self.timer.owns(id) {
            self.timer.clear();
            self.timer_needs_save = true;
        }

        self.needs_save = true;
        self.sync_ticker(Instant::now());
        self.flush();
        Ok(())
    }

    /// Re-plan a task by dropping it on a board column
    fn move_to_column(&mut self, id: &str, column: Column, today: NaiveDate) -> Result<(), TaskError> {
        let date = column
            .drop_date(today)
            .ok_or(TaskError::InvalidDropTarget(column.title()))?;
        self.update_task(
            id,
            TaskUpdate {
                planned_date: Some(Some(date)),
                ..Default::default()
            },
        )
    }

    /// Pause or resume the timer; returns whether it is now paused
    fn toggle_pause(&mut self) -> Result<bool, TaskError> {
        self.refresh(Instant::now());
        if !self.timer.toggle_pause() {
            return Err(TaskError::NoTimer);
        }
        tracing::info!(paused = self.timer.is_paused, "toggled pause");

        self.timer_needs_save = true;
        self.sync_ticker(Instant::now());
        self.flush();
        Ok(self.timer.is_paused)
    }

    /// Clear the timer without touching the owning task; returns the previous owner
    fn dismiss_timer(&mut self) -> Option<String> {
        self.refresh(Instant::now());
        let previous = self.timer.task_id.take();
        self.timer.clear();

        self.timer_needs_save = true;
        self.sync_ticker(Instant::now());
        self.flush();
        previous
    }

    /// Complete the owning task once the countdown has run out
    fn complete_task(&mut self) -> Result<String, TaskError> {
        self.refresh(Instant::now());
        let id = self.timer.task_id.clone().ok_or(TaskError::NoTimer)?;
        if !self.timer.is_complete {
            return Err(TaskError::NotInOvertime);
        }

        let actual_minutes = self.timer.actual_minutes();
        let overtime_seconds = self.timer.overtime_seconds;
        let task = self
            .store
            .get_mut(&id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))?;
        task.mark_completed(today(), actual_minutes, overtime_seconds);
        notifications::notify_task_completed(&task.name, actual_minutes);
        tracing::info!(task = %id, actual_minutes, overtime_seconds, "completed task");

        self.timer.clear();
        self.needs_save = true;
        self.timer_needs_save = true;
        self.sync_ticker(Instant::now());
        self.flush();
        Ok(id)
    }

    /// Advance the timer by one second
    pub fn tick(&mut self) -> Advance {
        let advance = self.timer.advance();
        match advance {
            Advance::Skipped => return advance,
            Advance::ReachedZero => {
                let name = self.active_task().map(|t| t.name.clone()).unwrap_or_default();
                tracing::info!(task = ?self.timer.task_id, "countdown reached zero");
                notifications::notify_time_up(&name);
            }
            Advance::CountedDown | Advance::Overtime => {}
        }

        self.timer_needs_save = true;
        self.flush();
        advance
    }

    /// Pick up outside changes, then deliver every tick that fell due up to
    /// `now`; returns how many
    pub fn pump(&mut self, now: Instant) -> u32 {
        self.refresh(now);
        let due = self.ticker.due_ticks(now);
        for _ in 0..due {
            self.tick();
        }
        due
    }

    /// Time until the next tick, if the tick source is running
    pub fn next_tick_in(&self, now: Instant) -> Option<Duration> {
        self.ticker.time_until_next(now)
    }

    /// Run the tick source exactly while a task owns an unpaused timer
    fn sync_ticker(&mut self, now: Instant) {
        if self.timer.is_running() {
            if !self.ticker.is_running() {
                self.ticker.start(now);
            }
        } else {
            self.ticker.stop();
        }
    }

    /// Persist dirty records
    pub fn save(&mut self) -> Result<()> {
        if self.needs_save {
            save_tasks(self.storage.as_mut(), self.store.tasks())?;
            self.needs_save = false;
        }
        if self.timer_needs_save {
            save_timer(self.storage.as_mut(), &self.timer)?;
            self.timer_needs_save = false;
        }
        Ok(())
    }

    /// Persist after a mutation; failures are logged and retried on the next save
    fn flush(&mut self) {
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "failed to persist state");
        }
    }
}

/// Collaborator-facing entry points: each one either applies fully or is
/// declined, leaving state unchanged
impl AppState {
    /// Record why a call was declined; the entry points themselves return nothing
    fn record<T>(&mut self, op: &'static str, result: Result<T, TaskError>) {
        match result {
            Ok(_) => self.last_declined = None,
            Err(e) => {
                tracing::debug!(op, reason = %e, "operation declined");
                self.last_declined = Some(e);
            }
        }
    }

    /// Reason the last entry point was declined, if it was
    pub fn take_declined(&mut self) -> Option<TaskError> {
        self.last_declined.take()
    }

    pub fn on_add(
        &mut self,
        name: &str,
        duration_minutes: f64,
        planned_date: Option<NaiveDate>,
        notes: Option<String>,
    ) {
        let result = self.add_task(name, duration_minutes, planned_date, notes);
        self.record("add", result);
    }

    pub fn on_start(&mut self, id: &str) {
        let result = self.start_task(id);
        self.record("start", result);
    }

    pub fn on_delete(&mut self, id: &str) {
        let result = self.delete_task(id);
        self.record("delete", result);
    }

    pub fn on_update(&mut self, id: &str, update: TaskUpdate) {
        let result = self.update_task(id, update);
        self.record("update", result);
    }

    pub fn on_duplicate(&mut self, id: &str, planned_date: NaiveDate) {
        let result = self.duplicate_task(id, planned_date);
        self.record("duplicate", result);
    }

    /// Unknown ids and dropping a task on itself are no-ops, not declines
    pub fn on_reorder(&mut self, active_id: &str, over_id: &str) {
        self.reorder_tasks(active_id, over_id);
        self.last_declined = None;
    }

    pub fn on_reset(&mut self, id: &str) {
        let result = self.reset_task(id);
        self.record("reset", result);
    }

    pub fn on_drop_to_column(&mut self, id: &str, column: Column) {
        let result = self.move_to_column(id, column, today());
        self.record("drop", result);
    }

    pub fn on_toggle_pause(&mut self) {
        let result = self.toggle_pause();
        self.record("toggle_pause", result);
    }

    pub fn on_dismiss(&mut self) {
        self.dismiss_timer();
        self.last_declined = None;
    }

    pub fn on_complete(&mut self) {
        let result = self.complete_task();
        self.record("complete", result);
    }
}
