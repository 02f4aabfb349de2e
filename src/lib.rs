//! # multicrypt
//!
//! Threads, a worker pool and AES encryption used together to mutate and
//! track a single shared integer.
//!
//! ## Components
//!
//! - [`counter`]: two concurrent workers increment and decrement one shared
//!   cell under a lock (or lock-free), always ending at
//!   `initial + add - remove`.
//! - [`reducer`]: a fixed worker pool drains a queue of random values and
//!   returns one partial result per value in completion order.
//! - [`codec`]: AES-256-CBC encryption of 5-byte signed integers with a fresh
//!   IV per blob and an HMAC tag.
//! - [`round`]: one non-interactive pass that ties the three together.
//!
//! ## Quick Start
//!
//! ```bash
//! multicrypt mutate --initial 10 --add 1000 --remove 400
//! multicrypt reduce --low -20000000 --high 20000000 --runs 2
//! multicrypt roundtrip -- -42
//! multicrypt round --initial 5 --add 100 --remove 30
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod counter;
pub mod error;
pub mod reducer;
pub mod round;

pub use cli::Cli;
pub use config::AppConfig;
pub use error::Error;

/// Result type alias for multicrypt operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
