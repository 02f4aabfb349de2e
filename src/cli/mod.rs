//! Command-line interface for multicrypt
//!
//! Argument parsing with clap, logging setup, configuration loading and
//! dispatch to the command modules.

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

pub use output::{Output, OutputFormat};

use crate::config::AppConfig;

/// multicrypt - threads, a worker pool and AES on one shared integer
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path (TOML, YAML or JSON)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the add and remove workers against a shared counter
    Mutate(commands::mutate::MutateArgs),
    /// Reduce random values on the worker pool
    Reduce(commands::reduce::ReduceArgs),
    /// Encrypt an integer with a throwaway key and print the blob
    Encrypt(commands::codec::CodecArgs),
    /// Encrypt and decrypt an integer with one codec
    Roundtrip(commands::codec::CodecArgs),
    /// Run one full round: encrypt, mutate, re-encrypt, decrypt, reduce
    Round(commands::round::RoundArgs),
    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Check that the configuration loads and is valid
    Validate,
}

/// What every command receives
pub struct Context {
    pub output: Output,
    pub config: AppConfig,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);

        let Some(command) = self.command else {
            // Show help when no command is provided
            Cli::command().print_help()?;
            return Ok(());
        };

        let config = AppConfig::load_with_custom_config(self.config.as_deref())
            .context("Failed to load configuration")?;
        let ctx = Context {
            output: Output::new(self.verbose > 0, self.quiet, self.format),
            config,
        };

        match command {
            Commands::Mutate(args) => commands::mutate::execute(args, &ctx).await,
            Commands::Reduce(args) => commands::reduce::execute(args, &ctx).await,
            Commands::Encrypt(args) => commands::codec::encrypt(args, &ctx).await,
            Commands::Roundtrip(args) => commands::codec::roundtrip(args, &ctx).await,
            Commands::Round(args) => commands::round::execute(args, &ctx).await,
            Commands::Config(cmd) => commands::config::execute(cmd, &ctx).await,
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => tracing_subscriber::EnvFilter::new("warn"),
        1 => tracing_subscriber::EnvFilter::new("info"),
        2 => tracing_subscriber::EnvFilter::new("debug"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    });

    // Logs go to stderr so stdout stays parseable with --format json
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
