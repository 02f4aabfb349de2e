//! Parallel reducer
//!
//! Generates a [`WorkQueue`] of random values, fans them out to a fixed
//! [`WorkerPool`], and collects one partial result per value in completion
//! order. Each task is the pure [`accumulate`] loop, so partial results do not
//! depend on which worker ran them or what it ran before. The caller sums the
//! partials.
//!
//! ```text
//! ┌────────────┐  bounded   ┌────────────┐  bounded   ┌────────────┐
//! │ WorkQueue  │──channel──▶│ worker × W │──channel──▶│ collector  │
//! │ N values   │            │ accumulate │            │ completion │
//! └────────────┘            └────────────┘            │ order      │
//!                                                     └────────────┘
//! ```

pub mod pool;
pub mod queue;
pub mod task;

pub use pool::{Completion, TaskState, WorkerPool};
pub use queue::WorkQueue;
pub use task::accumulate;

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::{Error, Result};

/// Largest accepted `channel_buffer_multiplier`
pub const MAX_CHANNEL_BUFFER_MULTIPLIER: usize = 1024;

/// Shape of a reduction round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Number of random values (and tasks) per round
    pub task_count: usize,
    /// Worker threads in the pool
    pub worker_count: usize,
    /// Work channel capacity = workers * multiplier
    pub channel_buffer_multiplier: usize,
    /// Default lower bound used by the CLI
    pub low: i64,
    /// Default upper bound used by the CLI
    pub high: i64,
    /// Fixed RNG seed for reproducible queues
    pub seed: Option<u64>,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            task_count: 10,
            worker_count: 4,
            channel_buffer_multiplier: 2,
            low: -20_000_000,
            high: 20_000_000,
            seed: None,
        }
    }
}

/// Outcome of one reduction round
#[derive(Debug, Clone, Serialize)]
pub struct Reduction {
    /// Generated values, in submission order
    pub values: Vec<i64>,
    /// Finished tasks, in completion order
    pub completions: Vec<Completion<i64>>,
    pub elapsed: Duration,
}

impl Reduction {
    /// Partial results in completion order
    pub fn results(&self) -> Vec<i64> {
        self.completions.iter().map(|c| c.result).collect()
    }

    pub fn total(&self) -> i128 {
        self.completions.iter().map(|c| i128::from(c.result)).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Reducer {
    config: ReducerConfig,
}

impl Reducer {
    pub fn new(config: ReducerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    pub fn validate(&self, low: i64, high: i64) -> Result<()> {
        if self.config.worker_count == 0 {
            return Err(Error::InvalidConfig("worker_count must be at least 1".to_string()));
        }
        let multiplier = self.config.channel_buffer_multiplier;
        if multiplier == 0 || multiplier > MAX_CHANNEL_BUFFER_MULTIPLIER {
            return Err(Error::InvalidConfig(format!(
                "channel_buffer_multiplier must be in 1..={MAX_CHANNEL_BUFFER_MULTIPLIER}, got {multiplier}"
            )));
        }
        if low > high {
            return Err(Error::InvalidRange { low, high });
        }
        Ok(())
    }

    /// Run one round over `[low, high]` with the accumulation loop
    pub fn run(&self, low: i64, high: i64) -> Result<Reduction> {
        self.run_with(low, high, accumulate)
    }

    /// Run one round with a custom task function
    ///
    /// The first failed task is returned as the error; tasks that completed
    /// before it are unaffected but discarded.
    pub fn run_with<F>(&self, low: i64, high: i64, task: F) -> Result<Reduction>
    where
        F: Fn(i64) -> i64 + Sync,
    {
        self.validate(low, high)?;

        let queue = WorkQueue::generate_seeded(low, high, self.config.task_count, self.config.seed)?;
        let values = queue.values().to_vec();
        debug!(?values, "work queue filled");

        let pool = WorkerPool::new(self.config.worker_count, self.config.channel_buffer_multiplier);
        let start_time = Instant::now();
        let outcomes = pool.execute(queue.into_values(), |value| task(*value))?;
        let elapsed = start_time.elapsed();

        let completions = outcomes.into_iter().collect::<Result<Vec<_>>>()?;
        let reduction = Reduction {
            values,
            completions,
            elapsed,
        };

        info!(
            tasks = reduction.completions.len(),
            total = %reduction.total(),
            elapsed_ms = elapsed.as_millis() as u64,
            "reduction finished"
        );
        Ok(reduction)
    }
}

/// Generate `task_count` values in `[low, high]`, reduce them on
/// `worker_count` workers, and return the partial results in completion order.
pub fn reduce_range(low: i64, high: i64, task_count: usize, worker_count: usize) -> Result<Vec<i64>> {
    let reducer = Reducer::new(ReducerConfig {
        task_count,
        worker_count,
        ..ReducerConfig::default()
    });
    Ok(reducer.run(low, high)?.results())
}

/// Run `runs` independent reductions at the same time on blocking tasks
///
/// With a fixed seed, run `i` uses `seed + i`.
pub async fn reduce_concurrently(config: &ReducerConfig, low: i64, high: i64, runs: usize) -> Result<Vec<Reduction>> {
    let handles: Vec<_> = (0..runs)
        .map(|run| {
            let mut config = config.clone();
            config.seed = config.seed.map(|seed| seed.wrapping_add(run as u64));
            let reducer = Reducer::new(config);
            tokio::task::spawn_blocking(move || reducer.run(low, high))
        })
        .collect();

    let mut reductions = Vec::with_capacity(runs);
    for (run, handle) in handles.into_iter().enumerate() {
        let reduction = handle.await.map_err(|e| Error::WorkerFailure {
            task_id: run,
            message: e.to_string(),
        })??;
        reductions.push(reduction);
    }

    Ok(reductions)
}
