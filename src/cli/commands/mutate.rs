//! Mutate command implementation
//!
//! Runs the add and remove workers against a fresh counter cell.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::cli::Context;
use crate::counter::{LockMode, Mutator};

#[derive(Args, Debug)]
pub struct MutateArgs {
    /// Starting value of the shared counter
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub initial: i64,

    /// Increments performed by the add worker
    #[arg(long, allow_negative_numbers = true)]
    pub add: i64,

    /// Decrements performed by the remove worker
    #[arg(long, allow_negative_numbers = true)]
    pub remove: i64,

    /// Lock mode (defaults to counter.mode from config)
    #[arg(long, value_enum)]
    pub mode: Option<LockMode>,

    /// Sleep after each step, in microseconds
    #[arg(long)]
    pub step_delay_us: Option<u64>,
}

#[derive(Serialize)]
struct MutateReport {
    initial: i64,
    add: i64,
    remove: i64,
    mode: LockMode,
    final_value: i64,
    elapsed_ms: f64,
}

/// Execute the mutate command
pub async fn execute(args: MutateArgs, ctx: &Context) -> Result<()> {
    let mode = args.mode.unwrap_or(ctx.config.counter.mode);
    let delay_us = args.step_delay_us.unwrap_or(ctx.config.counter.step_delay_us);

    let mut mutator = Mutator::new();
    if delay_us > 0 {
        mutator = mutator.with_step_delay(Duration::from_micros(delay_us));
    }

    let cell = mode.build(args.initial);
    let start_time = Instant::now();
    mutator.run(cell.as_ref(), args.add, args.remove)?;
    let elapsed = start_time.elapsed();

    let report = MutateReport {
        initial: args.initial,
        add: args.add,
        remove: args.remove,
        mode,
        final_value: cell.value(),
        elapsed_ms: elapsed.as_secs_f64() * 1_000.0,
    };

    let output = &ctx.output;
    if output.is_json() {
        return output.json(&report);
    }

    output.header("Shared counter");
    output.verbose(&format!("mode: {mode}, step delay: {delay_us}µs"));
    output.key_value("Initial value:", report.initial);
    output.key_value("Final value:", report.final_value);
    output.key_value("Threading time:", format!("{:.3} ms", report.elapsed_ms));
    Ok(())
}
