use crossbeam::channel::{Receiver, Sender, bounded};
use serde::Serialize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace, warn};

use crate::{Error, Result};

/// Lifecycle of a single task inside the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Dispatched,
    Computing,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskState::Queued => "queued",
            TaskState::Dispatched => "dispatched",
            TaskState::Computing => "computing",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A finished task, in the order it arrived at the collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion<R> {
    pub task_id: usize,
    pub worker_id: usize,
    pub result: R,
}

type Outcome<R> = Result<Completion<R>>;

/// Fixed-size pool of worker threads draining a bounded channel
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    channel_buffer_multiplier: usize,
}

impl WorkerPool {
    pub fn new(workers: usize, channel_buffer_multiplier: usize) -> Self {
        Self {
            workers: workers.max(1),
            channel_buffer_multiplier: channel_buffer_multiplier.max(1),
        }
    }

    /// Never more workers than work items
    pub fn effective_workers(&self, work_count: usize) -> usize {
        std::cmp::min(self.workers, work_count.max(1))
    }

    /// Process every item on the pool and return one outcome per item
    ///
    /// Outcomes are in completion order, not submission order. A panic inside
    /// `worker_fn` becomes [`Error::WorkerFailure`] for that item only; the
    /// worker thread carries on with the next item.
    pub fn execute<T, R, F>(&self, work_items: Vec<T>, worker_fn: F) -> Result<Vec<Outcome<R>>>
    where
        T: Send,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        let work_count = work_items.len();
        if work_count == 0 {
            return Ok(Vec::new());
        }

        let workers = self.effective_workers(work_count);
        // A slot beyond the item count is never filled
        let buffer = workers.saturating_mul(self.channel_buffer_multiplier).min(work_count);
        debug!(work_count, workers, buffer, "starting worker pool");

        let (work_tx, work_rx): (Sender<(usize, T)>, Receiver<(usize, T)>) = bounded(buffer);
        let (result_tx, result_rx): (Sender<Outcome<R>>, Receiver<Outcome<R>>) =
            bounded(buffer.saturating_mul(2).min(work_count));

        let progress_counter = AtomicUsize::new(0);
        let worker_fn = &worker_fn;
        let progress_counter = &progress_counter;

        crossbeam::thread::scope(|s| {
            for worker_id in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();

                s.spawn(move |_| {
                    while let Ok((task_id, item)) = work_rx.recv() {
                        trace!(task_id, worker_id, state = %TaskState::Dispatched);
                        trace!(task_id, worker_id, state = %TaskState::Computing);

                        let outcome = match catch_unwind(AssertUnwindSafe(|| worker_fn(&item))) {
                            Ok(result) => {
                                trace!(task_id, worker_id, state = %TaskState::Completed);
                                Ok(Completion {
                                    task_id,
                                    worker_id,
                                    result,
                                })
                            }
                            Err(payload) => {
                                warn!(task_id, worker_id, state = %TaskState::Failed, "task panicked");
                                Err(Error::from_panic(task_id, payload))
                            }
                        };

                        if result_tx.send(outcome).is_err() {
                            break; // Collector dropped
                        }

                        let current = progress_counter.fetch_add(1, Ordering::Relaxed) + 1;
                        debug!(worker_id, "completed {}/{} tasks", current, work_count);
                    }
                });
            }

            // Producer: the queue is written once, then closed
            let producer_tx = work_tx.clone();
            s.spawn(move |_| {
                for (task_id, item) in work_items.into_iter().enumerate() {
                    trace!(task_id, state = %TaskState::Queued);
                    if producer_tx.send((task_id, item)).is_err() {
                        break; // Workers dropped
                    }
                }
            });

            // Drop the original senders so receivers know when work is done
            drop(work_tx);
            drop(result_tx);

            collect_outcomes(result_rx, work_count)
        })
        .map_err(|payload| Error::from_panic(0, payload))
    }
}

fn collect_outcomes<R>(result_rx: Receiver<Outcome<R>>, total_work: usize) -> Vec<Outcome<R>> {
    let mut outcomes = Vec::with_capacity(total_work);

    while let Ok(outcome) = result_rx.recv() {
        outcomes.push(outcome);
        if outcomes.len() >= total_work {
            break;
        }
    }

    outcomes
}
