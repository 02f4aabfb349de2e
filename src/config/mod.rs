//! Configuration management for multicrypt
//!
//! Settings are layered with figment: the embedded `default-config.toml`, then
//! a project file (or the file passed with `--config`), then `MULTICRYPT_`
//! environment variables. Nested keys use `__` in environment variables, e.g.
//! `MULTICRYPT_REDUCER__WORKER_COUNT=8`.

mod core;
pub mod smart_load;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::counter::LockMode;
use crate::reducer::ReducerConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parallel reducer settings
    pub reducer: ReducerConfig,

    /// Shared-counter settings
    pub counter: CounterConfig,
}

/// Shared-counter settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Which cell the mutator runs against
    pub mode: LockMode,

    /// Sleep after each step, in microseconds (0 = no delay)
    pub step_delay_us: u64,
}

impl CounterConfig {
    pub fn step_delay(&self) -> Option<Duration> {
        (self.step_delay_us > 0).then(|| Duration::from_micros(self.step_delay_us))
    }
}
