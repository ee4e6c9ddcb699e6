//! Cooperative task scheduler
//!
//! Multiplexes independently timed polling operations on one thread.
//! Every dispatched task runs to completion before the next is considered.

pub mod executor;
pub mod task;

pub use executor::{Scheduler, SchedulerError, TaskRunner, MAX_TASKS};
pub use task::Task;
