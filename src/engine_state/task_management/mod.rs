//! # Task Management System
//!
//! This module provides the task queue that runs chunk generation away from the frame
//! loop, either on a pool of worker threads or cooperatively on the main thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed on another thread
//! - `TaskResult`: The result of a completed task, applied to the world on the main thread
//! - `TaskChannel`: Communication channel between the main thread and one worker thread
//!
//! ## Scheduling Modes
//!
//! ### Worker threads
//! - One `std::thread` per configured worker, each fed by its own channel
//! - Tasks are handed out round-robin, at most `MAX_TASKS_IN_FLIGHT` per worker
//! - Results are collected without blocking in `process_completed_tasks()`
//!
//! ### Cooperative (zero workers)
//! - Tasks stay queued until `process_queued_tasks()` runs
//! - Each call processes at most `inline_budget` tasks on the calling thread, bounding
//!   the time a burst of newly visible chunks can take out of a single frame
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The manager sends them to an idle worker or queues them
//! 3. Results come back through `process_completed_tasks()`
//! 4. The caller hands each result the world via `TaskResult::handle_result()`
//!
//! Results are only ever applied on the main thread, so a chunk is published to the world
//! after its generation has fully completed.

pub mod task;

use log::{debug, error, info};
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use task::{Task, TaskResult};

/// A communication channel between the main thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from main thread to worker
/// - `result_receiver`: Receives task results from worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `worker`: Handle to the worker thread, joined on drop
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    num_tasks_in_flight: usize,
    worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Fields
/// - `channels`: Set of active worker channels
/// - `queued_tasks`: Tasks waiting for an available worker
/// - `current_channel`: Index for round-robin scheduling
/// - `inline_budget`: Tasks processed per call in cooperative mode
/// - `inline_results`: Results of tasks processed in cooperative mode
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
    inline_budget: usize,
    inline_results: VecDeque<Box<dyn TaskResult + Send>>,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Keeping this at 1 leaves the remaining work in the shared queue, where stale tasks can
/// still be dropped before they start.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager`.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create. `0` selects cooperative mode.
    /// * `inline_budget` - Tasks processed per `process_queued_tasks()` call in cooperative
    ///   mode. Clamped to at least one.
    pub fn new(num_workers: usize, inline_budget: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        if num_workers > 0 {
            info!(
                "Starting {} generation workers (available parallelism: {:?})",
                num_workers,
                thread::available_parallelism()
            );
        } else {
            info!("Generation runs cooperatively, {} task(s) per frame", inline_budget.max(1));
        }

        for _ in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                worker: thread::spawn(task_closure),
            });
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
            inline_budget: inline_budget.max(1),
            inline_results: VecDeque::new(),
        }
    }

    /// Tasks waiting to be started.
    pub fn queued_len(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Tasks currently running on workers or finished but not yet collected.
    pub fn in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum::<usize>()
            + self.inline_results.len()
    }

    /// `true` when nothing is queued, running, or waiting to be collected.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.in_flight() == 0
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// Returns the task on failure (worker disconnected), allowing it to be requeued.
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => {
                error!("Generation worker {} disconnected", channel_idx);
                Err(task.0)
            }
        }
    }

    /// Finds an available worker channel that can accept a new task.
    ///
    /// Round-robin starting from the last used channel; channels at
    /// `MAX_TASKS_IN_FLIGHT` are skipped.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel;
        let mut current = start_channel;

        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was immediately scheduled on an available worker
    /// - `false` if the task was queued
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Starts queued tasks while capacity allows.
    ///
    /// With workers this hands tasks to idle channels in FIFO order. In cooperative mode
    /// it runs up to `inline_budget` tasks right here.
    pub fn process_queued_tasks(&mut self) {
        if self.queued_tasks.is_empty() {
            return;
        }

        if self.channels.is_empty() {
            for _ in 0..self.inline_budget {
                let Some(task) = self.queued_tasks.pop_front() else {
                    break;
                };
                self.inline_results.push_back(task.process());
            }
            return;
        }

        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                }
                Err(task) => {
                    // Channel is disconnected, put task back and stop processing
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
    }

    /// Collects every result that is ready, without blocking.
    ///
    /// The caller applies them with `TaskResult::handle_result()`.
    pub fn process_completed_tasks(&mut self) -> Vec<Box<dyn TaskResult + Send>> {
        let mut results: Vec<_> = self.inline_results.drain(..).collect();
        for (channel_idx, channel) in self.channels.iter_mut().enumerate() {
            loop {
                match channel.result_receiver.try_recv() {
                    Ok(result) => {
                        channel.num_tasks_in_flight -= 1;
                        results.push(result);
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if channel.num_tasks_in_flight > 0 {
                            error!(
                                "Generation worker {} stopped with {} task(s) in flight",
                                channel_idx, channel.num_tasks_in_flight
                            );
                            channel.num_tasks_in_flight = 0;
                        }
                        break;
                    }
                }
            }
        }
        results
    }

    /// Like `process_completed_tasks()`, but waits until at least one result is available
    /// if any work is outstanding.
    pub fn wait_for_completed_tasks(&mut self) -> Vec<Box<dyn TaskResult + Send>> {
        self.process_queued_tasks();
        let mut results = Vec::new();

        if let Some(channel) = self
            .channels
            .iter_mut()
            .find(|channel| channel.num_tasks_in_flight > 0)
        {
            match channel.result_receiver.recv() {
                Ok(result) => {
                    channel.num_tasks_in_flight -= 1;
                    results.push(result);
                }
                Err(_) => {
                    error!("Generation worker stopped while a task was in flight");
                    channel.num_tasks_in_flight = 0;
                }
            }
        }

        results.extend(self.process_completed_tasks());
        results
    }

    /// Drops every task that has not started yet. Returns how many were dropped.
    pub fn clear_queued(&mut self) -> usize {
        let dropped = self.queued_tasks.len();
        self.queued_tasks.clear();
        if dropped > 0 {
            debug!("Dropped {} queued task(s)", dropped);
        }
        dropped
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        for channel in self.channels.drain(..) {
            let TaskChannel {
                task_sender,
                result_receiver,
                worker,
                ..
            } = channel;
            // Closing both ends lets the worker loop exit after its current task.
            drop(task_sender);
            drop(result_receiver);
            if worker.join().is_err() {
                error!("Generation worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::world::World;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingTask {
        processed: Arc<AtomicUsize>,
    }

    struct NoopResult;

    impl TaskResult for NoopResult {
        fn handle_result(self: Box<Self>, _world: &mut World) -> Vec<Box<dyn Task + Send>> {
            Vec::new()
        }
    }

    impl Task for CountingTask {
        fn process(&self) -> Box<dyn TaskResult + Send> {
            self.processed.fetch_add(1, Ordering::SeqCst);
            Box::new(NoopResult)
        }
    }

    fn publish(manager: &mut TaskManager, count: usize) -> Arc<AtomicUsize> {
        let processed = Arc::new(AtomicUsize::new(0));
        for _ in 0..count {
            manager.publish_task(Box::new(CountingTask {
                processed: processed.clone(),
            }));
        }
        processed
    }

    #[test]
    fn cooperative_mode_respects_the_budget() {
        let mut manager = TaskManager::new(0, 2);
        let processed = publish(&mut manager, 5);
        assert_eq!(manager.queued_len(), 5);
        assert_eq!(processed.load(Ordering::SeqCst), 0);

        manager.process_queued_tasks();
        assert_eq!(processed.load(Ordering::SeqCst), 2);
        assert_eq!(manager.process_completed_tasks().len(), 2);

        manager.process_queued_tasks();
        manager.process_queued_tasks();
        assert_eq!(manager.process_completed_tasks().len(), 3);
        assert!(manager.is_idle());
    }

    #[test]
    fn workers_drain_the_queue() {
        let mut manager = TaskManager::new(2, 1);
        let processed = publish(&mut manager, 9);

        let mut collected = 0;
        while !manager.is_idle() {
            collected += manager.wait_for_completed_tasks().len();
        }
        assert_eq!(collected, 9);
        assert_eq!(processed.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn clearing_drops_unstarted_tasks() {
        let mut manager = TaskManager::new(0, 1);
        let processed = publish(&mut manager, 4);
        assert_eq!(manager.clear_queued(), 4);
        manager.process_queued_tasks();
        assert_eq!(processed.load(Ordering::SeqCst), 0);
        assert!(manager.is_idle());
    }
}
