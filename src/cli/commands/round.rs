//! Round command implementation
//!
//! One non-interactive pass of the demo loop, with per-phase timings.

use anyhow::{Context as _, Result};
use clap::Args;

use crate::cli::Context;
use crate::cli::output::group_digits;
use crate::counter::LockMode;
use crate::round::{RoundInput, run_round};

#[derive(Args, Debug)]
pub struct RoundArgs {
    /// Starting value, must fit in 5 signed bytes
    #[arg(long, allow_negative_numbers = true)]
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
}

/// Execute the round command
pub async fn execute(args: RoundArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.clone();
    if let Some(mode) = args.mode {
        config.counter.mode = mode;
    }
    let input = RoundInput {
        initial: args.initial,
        add: args.add,
        remove: args.remove,
    };

    let report = tokio::task::spawn_blocking(move || run_round(&config, input))
        .await
        .context("Round task panicked")?
        .context("Round failed")?;

    let output = &ctx.output;
    if output.is_json() {
        return output.json(&report);
    }

    output.header("Round");
    output.key_value("Number at start:", report.initial);
    output.verbose(&format!("encrypted: {}", report.encrypted_initial));
    output.key_value("After threading:", report.after_mutation);
    output.key_value("Encrypted:", &report.encrypted);
    output.key_value("Decrypted:", report.decrypted);
    output.key_value("Summarized result:", group_digits(report.reduction.total()));

    output.header("Timings");
    let timings = &report.timings;
    output.key_value("Threading:", format!("{:.3} ms", timings.threading_ms));
    output.key_value("Encryption:", format!("{:.3} ms", timings.encryption_ms));
    output.key_value("Decryption:", format!("{:.3} ms", timings.decryption_ms));
    output.key_value("Reduction:", format!("{:.2} ms", timings.reduction_ms));
    Ok(())
}
