//! One non-interactive round of the demo
//!
//! Encrypts the starting value, runs the two counter workers, re-encrypts and
//! decrypts the result, then runs a reduction over the configured range.

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

use crate::codec::IntegerCodec;
use crate::config::AppConfig;
use crate::counter::{LockMode, Mutator};
use crate::reducer::{Reducer, Reduction};
use crate::{Error, Result};

/// Inputs for a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundInput {
    pub initial: i64,
    pub add: i64,
    pub remove: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub initial: i64,
    pub mode: LockMode,
    pub encrypted_initial: String,
    pub after_mutation: i64,
    pub encrypted: String,
    pub decrypted: i64,
    pub reduction: Reduction,
    pub timings: RoundTimings,
}

/// Wall-clock time of each phase, in milliseconds
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoundTimings {
    pub encryption_ms: f64,
    pub threading_ms: f64,
    pub decryption_ms: f64,
    pub reduction_ms: f64,
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

pub fn run_round(config: &AppConfig, input: RoundInput) -> Result<RoundReport> {
    let codec = IntegerCodec::new();
    let mut timings = RoundTimings::default();

    let encrypted_initial = codec.encrypt(input.initial)?;

    let mode = config.counter.mode;
    let cell = mode.build(input.initial);
    let mut mutator = Mutator::new();
    if let Some(delay) = config.counter.step_delay() {
        mutator = mutator.with_step_delay(delay);
    }
    let start_time = Instant::now();
    mutator.run(cell.as_ref(), input.add, input.remove)?;
    timings.threading_ms = millis(start_time.elapsed());
    let after_mutation = cell.value();

    let start_time = Instant::now();
    let encrypted = codec.encrypt(after_mutation)?;
    timings.encryption_ms = millis(start_time.elapsed());

    let start_time = Instant::now();
    let decrypted = codec.decrypt(encrypted.as_bytes())?;
    timings.decryption_ms = millis(start_time.elapsed());
    if decrypted != after_mutation {
        return Err(Error::decode(format!(
            "decrypted {decrypted}, expected {after_mutation}"
        )));
    }

    let reducer = Reducer::new(config.reducer.clone());
    let reduction = reducer.run(config.reducer.low, config.reducer.high)?;
    timings.reduction_ms = millis(reduction.elapsed);

    info!(
        initial = input.initial,
        after_mutation,
        total = %reduction.total(),
        "round finished"
    );

    Ok(RoundReport {
        initial: input.initial,
        mode,
        encrypted_initial: encrypted_initial.to_hex(),
        after_mutation,
        encrypted: encrypted.to_hex(),
        decrypted,
        reduction,
        timings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::ReducerConfig;

    fn small_config(mode: LockMode) -> AppConfig {
        let mut config = AppConfig::default();
        config.counter.mode = mode;
        config.reducer = ReducerConfig {
            task_count: 4,
            worker_count: 2,
            low: -1_000,
            high: 1_000,
            seed: Some(11),
            ..ReducerConfig::default()
        };
        config
    }

    #[test]
    fn test_round_mutates_and_roundtrips() {
        for mode in [LockMode::Coarse, LockMode::PerStep, LockMode::Atomic] {
            let input = RoundInput {
                initial: 25,
                add: 300,
                remove: 120,
            };
            let report = run_round(&small_config(mode), input).unwrap();

            assert_eq!(report.after_mutation, 205);
            assert_eq!(report.decrypted, 205);
            assert_ne!(report.encrypted_initial, report.encrypted);
            assert_eq!(report.reduction.completions.len(), 4);
        }
    }

    #[test]
    fn test_round_rejects_out_of_range_start() {
        let input = RoundInput {
            initial: 1 << 40,
            add: 0,
            remove: 0,
        };
        let err = run_round(&small_config(LockMode::Coarse), input).unwrap_err();
        assert!(matches!(err, Error::InputRange { .. }));
    }

    #[test]
    fn test_round_report_serializes() {
        let input = RoundInput {
            initial: 0,
            add: 1,
            remove: 0,
        };
        let report = run_round(&small_config(LockMode::Atomic), input).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["after_mutation"], 1);
        assert_eq!(json["mode"], "atomic");
        assert!(json["timings"]["reduction_ms"].is_number());
    }
}
