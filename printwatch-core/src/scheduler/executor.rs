//! Task dispatch
//!
//! Tracks registered tasks and runs the due ones on every tick, in
//! registration order. The scheduler never retries: a task that fails
//! simply runs again when its interval next elapses.

use heapless::Vec;

use super::task::Task;

/// Maximum registered tasks
pub const MAX_TASKS: usize = 8;

/// Scheduler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// A task with this id is already registered
    DuplicateTask,
    /// No task with this id
    UnknownTask,
    /// [`MAX_TASKS`] already registered
    Full,
}

/// Receives dispatched tasks
///
/// The runner gets the scheduler back so a task can force, re-time, enable
/// or disable other tasks (or itself) while it runs.
pub trait TaskRunner<K> {
    /// Run the task `id`, dispatched at `now_ms`
    fn run(&mut self, id: K, now_ms: u64, scheduler: &mut Scheduler<K>);
}

/// Cooperative scheduler over task ids of type `K`
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    tasks: Vec<Task<K>, MAX_TASKS>,
}

impl<K: Copy + Eq> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq> Scheduler<K> {
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Register a task
    pub fn add_task(&mut self, task: Task<K>) -> Result<(), SchedulerError> {
        if self.tasks.iter().any(|t| t.id() == task.id()) {
            return Err(SchedulerError::DuplicateTask);
        }
        self.tasks.push(task).map_err(|_| SchedulerError::Full)
    }

    fn task_mut(&mut self, id: K) -> Result<&mut Task<K>, SchedulerError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or(SchedulerError::UnknownTask)
    }

    /// Registered task by id
    pub fn task(&self, id: K) -> Option<&Task<K>> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// All tasks in registration order
    pub fn tasks(&self) -> &[Task<K>] {
        &self.tasks
    }

    /// Allow dispatch (idempotent)
    pub fn enable(&mut self, id: K) -> Result<(), SchedulerError> {
        self.task_mut(id)?.set_enabled(true);
        Ok(())
    }

    /// Stop future dispatch (idempotent)
    ///
    /// A run already in progress completes normally.
    pub fn disable(&mut self, id: K) -> Result<(), SchedulerError> {
        self.task_mut(id)?.set_enabled(false);
        Ok(())
    }

    /// Make the task due on the next tick
    ///
    /// The interval is not changed.
    pub fn force_next_iteration(&mut self, id: K) -> Result<(), SchedulerError> {
        self.task_mut(id)?.force();
        Ok(())
    }

    /// Change the interval
    ///
    /// Applies to the next due-time check; the last run time is kept, so a
    /// shorter interval alone may or may not make the task due.
    pub fn set_interval(&mut self, id: K, interval_ms: u32) -> Result<(), SchedulerError> {
        self.task_mut(id)?.set_interval(interval_ms);
        Ok(())
    }

    /// Start a full interval from `now_ms`, dropping any pending force
    pub fn restart(&mut self, id: K, now_ms: u64) -> Result<(), SchedulerError> {
        self.task_mut(id)?.mark_run(now_ms);
        Ok(())
    }

    /// Milliseconds until the next task is due
    ///
    /// `None` when no task is enabled. Lets the outer loop sleep.
    pub fn next_due_in(&self, now_ms: u64) -> Option<u64> {
        self.tasks.iter().filter_map(|t| t.due_in(now_ms)).min()
    }

    /// Run every due task once
    ///
    /// Tasks are checked in registration order. A task's last run time is
    /// recorded before it is dispatched, so a task that forces itself runs
    /// again on the following tick, not this one.
    ///
    /// Returns the number of tasks dispatched.
    pub fn tick<R: TaskRunner<K>>(&mut self, now_ms: u64, runner: &mut R) -> usize {
        let mut dispatched = 0;
        let mut index = 0;

        // Tasks may be added while running, so re-check the length
        while index < self.tasks.len() {
            let task = &mut self.tasks[index];
            if task.is_due(now_ms) {
                task.mark_run(now_ms);
                let id = task.id();
                runner.run(id, now_ms, self);
                dispatched += 1;
            }
            index += 1;
        }

        dispatched
    }
}
