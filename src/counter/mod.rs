//! Shared-counter mutation
//!
//! Two workers run at the same time against one integer cell: one increments it
//! `add_count` times, the other decrements it `remove_count` times. Whatever the
//! scheduling, the final value is `initial + add_count - remove_count`.
//!
//! Three cells are available:
//!
//! - [`SharedCounter`] with [`Granularity::Coarse`]: each worker holds the lock
//!   for its whole loop, so the two loops never interleave.
//! - [`SharedCounter`] with [`Granularity::PerStep`]: the lock is taken per
//!   step, so individual increments and decrements interleave.
//! - [`AtomicCounter`]: no lock, fetch-add / fetch-sub per step.
//!
//! ```rust
//! use multicrypt::counter::{mutate, CounterCell, SharedCounter};
//!
//! let cell = SharedCounter::new(10);
//! mutate(&cell, 5, 3).unwrap();
//! assert_eq!(cell.value(), 12);
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, trace};

use crate::{Error, Result};

/// Direction of a single mutation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Add,
    Remove,
}

impl Step {
    fn delta(self) -> i64 {
        match self {
            Step::Add => 1,
            Step::Remove => -1,
        }
    }
}

/// How long a [`SharedCounter`] worker holds the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// One acquisition for the worker's whole loop
    #[default]
    Coarse,
    /// One acquisition per increment/decrement
    PerStep,
}

/// Cell selection used by the CLI and configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LockMode {
    #[default]
    Coarse,
    PerStep,
    Atomic,
}

impl LockMode {
    /// Build a fresh cell holding `initial` for this mode
    pub fn build(self, initial: i64) -> Box<dyn CounterCell + Send> {
        match self {
            LockMode::Coarse => Box::new(SharedCounter::with_granularity(initial, Granularity::Coarse)),
            LockMode::PerStep => Box::new(SharedCounter::with_granularity(initial, Granularity::PerStep)),
            LockMode::Atomic => Box::new(AtomicCounter::new(initial)),
        }
    }
}

impl std::fmt::Display for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LockMode::Coarse => "coarse",
            LockMode::PerStep => "per-step",
            LockMode::Atomic => "atomic",
        };
        f.write_str(name)
    }
}

/// An integer cell that two workers can mutate concurrently
pub trait CounterCell: Sync {
    /// Apply `step` to the cell `count` times, pausing `delay` after each step
    fn run_worker(&self, step: Step, count: u64, delay: Option<Duration>);

    /// Current value of the cell
    fn value(&self) -> i64;
}

/// Integer cell guarded by a single mutex
#[derive(Debug)]
pub struct SharedCounter {
    value: Mutex<i64>,
    granularity: Granularity,
}

impl SharedCounter {
    pub fn new(initial: i64) -> Self {
        Self::with_granularity(initial, Granularity::Coarse)
    }

    pub fn with_granularity(initial: i64, granularity: Granularity) -> Self {
        Self {
            value: Mutex::new(initial),
            granularity,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    // A panicking worker leaves a whole integer behind, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, i64> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CounterCell for SharedCounter {
    fn run_worker(&self, step: Step, count: u64, delay: Option<Duration>) {
        match self.granularity {
            Granularity::Coarse => {
                let mut value = self.lock();
                trace!(?step, count, "acquired counter lock for whole loop");
                for _ in 0..count {
                    *value = value.wrapping_add(step.delta());
                    pause(delay);
                }
            }
            Granularity::PerStep => {
                for _ in 0..count {
                    {
                        let mut value = self.lock();
                        *value = value.wrapping_add(step.delta());
                    }
                    pause(delay);
                }
            }
        }
    }

    fn value(&self) -> i64 {
        *self.lock()
    }
}

/// Lock-free integer cell
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicI64,
}

impl AtomicCounter {
    pub fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
        }
    }
}

impl CounterCell for AtomicCounter {
    fn run_worker(&self, step: Step, count: u64, delay: Option<Duration>) {
        for _ in 0..count {
            match step {
                Step::Add => self.value.fetch_add(1, Ordering::SeqCst),
                Step::Remove => self.value.fetch_sub(1, Ordering::SeqCst),
            };
            pause(delay);
        }
    }

    fn value(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }
}

fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        std::thread::sleep(delay);
    }
}

/// Negative counts iterate zero times
fn steps(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// Runs the add and remove workers against a cell and waits for both
#[derive(Debug, Clone, Default)]
pub struct Mutator {
    step_delay: Option<Duration>,
}

impl Mutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep after every step, widening the window for interleaving
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = Some(delay);
        self
    }

    pub fn run<C>(&self, cell: &C, add_count: i64, remove_count: i64) -> Result<()>
    where
        C: CounterCell + ?Sized,
    {
        let adds = steps(add_count);
        let removes = steps(remove_count);
        let delay = self.step_delay;
        debug!(adds, removes, ?delay, "starting counter workers");

        crossbeam::thread::scope(|s| -> Result<()> {
            let adder = s.spawn(move |_| cell.run_worker(Step::Add, adds, delay));
            let remover = s.spawn(move |_| cell.run_worker(Step::Remove, removes, delay));

            let added = adder.join().map_err(|payload| Error::from_panic(0, payload));
            let removed = remover.join().map_err(|payload| Error::from_panic(1, payload));
            added.and(removed)
        })
        .map_err(|payload| Error::from_panic(0, payload))??;

        debug!(value = cell.value(), "counter workers joined");
        Ok(())
    }
}

/// Increment `cell` `add_count` times and decrement it `remove_count` times
/// on two concurrent workers, returning once both have finished.
pub fn mutate<C>(cell: &C, add_count: i64, remove_count: i64) -> Result<()>
where
    C: CounterCell + ?Sized,
{
    Mutator::new().run(cell, add_count, remove_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    const ALL_MODES: [LockMode; 3] = [LockMode::Coarse, LockMode::PerStep, LockMode::Atomic];

    #[test]
    fn test_final_value_for_every_mode() {
        for mode in ALL_MODES {
            let cell = mode.build(100);
            mutate(cell.as_ref(), 1_000, 250).unwrap();
            assert_eq!(cell.value(), 850, "mode {mode}");
        }
    }

    #[test]
    fn test_negative_counts_iterate_zero_times() {
        let cell = SharedCounter::new(7);
        mutate(&cell, -5, 2).unwrap();
        assert_eq!(cell.value(), 5);

        mutate(&cell, 3, -9).unwrap();
        assert_eq!(cell.value(), 8);
    }

    #[test]
    fn test_no_lost_updates_with_step_delay() {
        let mutator = Mutator::new().with_step_delay(Duration::from_micros(50));
        for mode in ALL_MODES {
            let cell = mode.build(-3);
            mutator.run(cell.as_ref(), 200, 150).unwrap();
            assert_eq!(cell.value(), 47, "mode {mode}");
        }
    }

    #[test]
    fn test_coarse_loops_never_interleave() {
        let cell = SharedCounter::with_granularity(0, Granularity::Coarse);
        let mutator = Mutator::new().with_step_delay(Duration::from_micros(200));
        let done = AtomicBool::new(false);

        let seen = crossbeam::thread::scope(|s| {
            let sampler = s.spawn(|_| {
                let mut seen = BTreeSet::new();
                while !done.load(Ordering::SeqCst) {
                    seen.insert(cell.value());
                }
                seen.insert(cell.value());
                seen
            });

            mutator.run(&cell, 50, 30).unwrap();
            done.store(true, Ordering::SeqCst);
            sampler.join().unwrap()
        })
        .unwrap();

        // Only the value between the two loops or after both can be observed
        let allowed = BTreeSet::from([0, 50, -30, 20]);
        assert!(seen.is_subset(&allowed), "observed intermediate values: {seen:?}");
        assert!(seen.contains(&20));
    }

    #[test]
    fn test_result_independent_of_repeated_scheduling() {
        for _ in 0..20 {
            let cell = SharedCounter::with_granularity(0, Granularity::PerStep);
            mutate(&cell, 500, 500).unwrap();
            assert_eq!(cell.value(), 0);
        }
    }

    #[test]
    fn test_independent_cells_do_not_interfere() {
        let cells: Vec<Arc<SharedCounter>> = (0..4).map(|i| Arc::new(SharedCounter::new(i * 10))).collect();

        let handles: Vec<_> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let cell = Arc::clone(cell);
                std::thread::spawn(move || {
                    let i = i as i64;
                    mutate(cell.as_ref(), 1_000 + i, 1_000).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for (i, cell) in cells.iter().enumerate() {
            let i = i as i64;
            assert_eq!(cell.value(), i * 10 + i);
        }
    }

    struct FailingCell;

    impl CounterCell for FailingCell {
        fn run_worker(&self, step: Step, _count: u64, _delay: Option<Duration>) {
            if step == Step::Remove {
                panic!("remove worker exploded");
            }
        }

        fn value(&self) -> i64 {
            0
        }
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let err = mutate(&FailingCell, 1, 1).unwrap_err();
        match err {
            Error::WorkerFailure { task_id, message } => {
                assert_eq!(task_id, 1);
                assert!(message.contains("remove worker exploded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lock_mode_display() {
        assert_eq!(LockMode::PerStep.to_string(), "per-step");
        assert_eq!(LockMode::default(), LockMode::Coarse);
        assert_eq!(SharedCounter::new(0).granularity(), Granularity::Coarse);
    }
}
