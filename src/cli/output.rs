//! Plain output for multicrypt
//!
//! Text output honours `--quiet` and `--verbose`; `--format json` prints one
//! JSON document per command instead.

use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize)]
pub enum OutputFormat {
    /// Human readable lines
    #[default]
    Text,
    /// A single JSON document
    Json,
}

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
    format: OutputFormat,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool, format: OutputFormat) -> Self {
        Self { verbose, quiet, format }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Print a header/title
    pub fn header(&self, title: &str) {
        if !self.quiet && !self.is_json() {
            println!("\n{title}");
            println!("{}", "─".repeat(title.chars().count()));
        }
    }

    /// Print a key-value pair; always shown in text mode, even when quiet
    pub fn key_value(&self, key: &str, value: impl std::fmt::Display) {
        if !self.is_json() {
            println!("  {key:<22} {value}");
        }
    }

    /// Print an informational line
    pub fn info(&self, message: &str) {
        if !self.quiet && !self.is_json() {
            println!("{message}");
        }
    }

    /// Print a line only when verbose
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet && !self.is_json() {
            println!("  {message}");
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if !self.quiet && !self.is_json() {
            println!("  • {item}");
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet && !self.is_json() {
            println!("✔ {message}");
        }
    }

    /// Print a serializable report as pretty JSON
    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Group digits with underscores, e.g. `-12_345_678`
pub fn group_digits(value: i128) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('_');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1_000");
        assert_eq!(group_digits(-20_000_000), "-20_000_000");
        assert_eq!(group_digits(123_456_789_012), "123_456_789_012");
    }
}
