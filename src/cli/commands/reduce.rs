//! Reduce command implementation
//!
//! Runs one or more reductions over a random work queue and prints the
//! partial results in completion order together with their sum.

use anyhow::{Context as _, Result};
use clap::Args;
use clap::builder::RangedU64ValueParser;
use serde::Serialize;

use crate::cli::Context;
use crate::cli::output::group_digits;
use crate::reducer::{Reduction, reduce_concurrently};

#[derive(Args, Debug)]
pub struct ReduceArgs {
    /// Lower bound of the random values (inclusive)
    #[arg(long, allow_negative_numbers = true)]
    pub low: Option<i64>,

    /// Upper bound of the random values (inclusive)
    #[arg(long, allow_negative_numbers = true)]
    pub high: Option<i64>,

    /// Number of random values, one task each
    #[arg(long)]
    pub tasks: Option<usize>,

    /// Worker threads in the pool
    #[arg(long)]
    pub workers: Option<usize>,

    /// Seed for a reproducible work queue
    #[arg(long)]
    pub seed: Option<u64>,

    /// Independent reductions to run at the same time
    #[arg(long, default_value_t = 1, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub runs: usize,
}

#[derive(Serialize)]
struct ReduceReport<'a> {
    low: i64,
    high: i64,
    runs: Vec<RunReport<'a>>,
}

#[derive(Serialize)]
struct RunReport<'a> {
    values: &'a [i64],
    results: Vec<i64>,
    total: String,
    elapsed_ms: f64,
}

impl<'a> From<&'a Reduction> for RunReport<'a> {
    fn from(reduction: &'a Reduction) -> Self {
        Self {
            values: &reduction.values,
            results: reduction.results(),
            total: reduction.total().to_string(),
            elapsed_ms: reduction.elapsed.as_secs_f64() * 1_000.0,
        }
    }
}

/// Execute the reduce command
pub async fn execute(args: ReduceArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.reducer.clone();
    if let Some(tasks) = args.tasks {
        config.task_count = tasks;
    }
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let low = args.low.unwrap_or(config.low);
    let high = args.high.unwrap_or(config.high);

    let reductions = reduce_concurrently(&config, low, high, args.runs)
        .await
        .context("Reduction failed")?;

    let output = &ctx.output;
    if output.is_json() {
        let report = ReduceReport {
            low,
            high,
            runs: reductions.iter().map(RunReport::from).collect(),
        };
        return output.json(&report);
    }

    output.header(&format!(
        "Reducing {} values in [{}, {}] on {} workers",
        config.task_count,
        group_digits(low.into()),
        group_digits(high.into()),
        config.worker_count
    ));

    for (run, reduction) in reductions.iter().enumerate() {
        if reductions.len() > 1 {
            output.info(&format!("Run {}", run + 1));
        }
        output.verbose(&format!("values: {:?}", reduction.values));
        for completion in &reduction.completions {
            output.list_item(&format!(
                "task {} (worker {}): {}",
                completion.task_id,
                completion.worker_id,
                group_digits(completion.result.into())
            ));
        }
        output.key_value("Summarized result:", group_digits(reduction.total()));
        output.key_value(
            "Execution time:",
            format!("{:.2} ms", reduction.elapsed.as_secs_f64() * 1_000.0),
        );
    }
    Ok(())
}
