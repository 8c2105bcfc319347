//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system.
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method runs on a worker thread, or inline on the caller's thread
//!    when no workers are configured
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the main thread with the world
//! 5. The result can spawn follow-up tasks
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the main thread
//! - Tasks own their inputs; world state is only touched in `handle_result()`

use crate::engine_state::voxels::world::World;

/// A unit of work that can be executed away from the main thread.
///
/// Tasks should be self-contained and own all the data they need. They never
/// receive a reference to the world.
pub trait Task: Send {
    /// Performs the work and packages its output for the main thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// The output of a processed `Task`, applied on the main thread.
pub trait TaskResult: Send {
    /// Publishes the result into the world.
    ///
    /// Runs on the main thread between frames, so it should stay cheap. Returns
    /// follow-up tasks to schedule, usually none.
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task + Send>>;
}
