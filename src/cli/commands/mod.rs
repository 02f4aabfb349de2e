//! Command implementations for the multicrypt CLI
//!
//! Each command is organized into its own module.

pub mod codec;
pub mod config;
pub mod mutate;
pub mod reduce;
pub mod round;
