//! Encrypt and roundtrip command implementations

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::Context;
use crate::codec::IntegerCodec;

#[derive(Args, Debug)]
pub struct CodecArgs {
    /// Integer in [-2^39, 2^39 - 1]
    #[arg(allow_negative_numbers = true)]
    pub value: i64,
}

#[derive(Serialize)]
struct CodecReport {
    value: i64,
    encrypted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    decrypted: Option<i64>,
}

/// Execute the encrypt command
pub async fn encrypt(args: CodecArgs, ctx: &Context) -> Result<()> {
    let codec = IntegerCodec::new();
    let encrypted = codec
        .encrypt(args.value)
        .with_context(|| format!("Failed to encrypt {}", args.value))?;

    let report = CodecReport {
        value: args.value,
        encrypted: encrypted.to_hex(),
        decrypted: None,
    };
    print_report(&report, ctx)
}

/// Execute the roundtrip command
pub async fn roundtrip(args: CodecArgs, ctx: &Context) -> Result<()> {
    let codec = IntegerCodec::new();
    let encrypted = codec
        .encrypt(args.value)
        .with_context(|| format!("Failed to encrypt {}", args.value))?;
    let decrypted = codec
        .decrypt(encrypted.as_bytes())
        .context("Failed to decrypt value")?;

    let report = CodecReport {
        value: args.value,
        encrypted: encrypted.to_hex(),
        decrypted: Some(decrypted),
    };
    print_report(&report, ctx)
}

fn print_report(report: &CodecReport, ctx: &Context) -> Result<()> {
    let output = &ctx.output;
    if output.is_json() {
        return output.json(report);
    }

    output.header("Secure integer codec");
    output.key_value("Value:", report.value);
    output.key_value("Encrypted:", &report.encrypted);
    if let Some(decrypted) = report.decrypted {
        output.key_value("Decrypted:", decrypted);
    }
    Ok(())
}
