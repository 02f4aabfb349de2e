//! Configuration command implementations

use anyhow::Result;
use serde::Serialize;

use crate::cli::{ConfigCommands, Context};
use crate::config::AppConfig;

#[derive(Serialize)]
struct ConfigReport<'a> {
    #[serde(flatten)]
    config: &'a AppConfig,
    host_cpus: usize,
}

/// Execute config commands
pub async fn execute(cmd: ConfigCommands, ctx: &Context) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(ctx),
        ConfigCommands::Validate => validate(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let report = ConfigReport {
        config: &ctx.config,
        host_cpus: num_cpus::get(),
    };
    // Always JSON: the config is a nested document
    ctx.output.json(&report)
}

fn validate(ctx: &Context) -> Result<()> {
    // Loading already validated; report what was accepted
    ctx.config.validate()?;
    let output = &ctx.output;
    if output.is_json() {
        return output.json(&serde_json::json!({ "valid": true }));
    }

    output.success("Configuration is valid");
    let reducer = &ctx.config.reducer;
    output.key_value("Tasks:", reducer.task_count);
    output.key_value("Workers:", reducer.worker_count);
    output.key_value("Range:", format!("[{}, {}]", reducer.low, reducer.high));
    output.key_value("Counter mode:", ctx.config.counter.mode);
    Ok(())
}
