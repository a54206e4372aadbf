//! Library half of the bidl compiler driver.
//!
//! The binary in `main.rs` only parses the command word and dispatches; the
//! commands themselves live here so they can be tested without spawning a
//! process.

pub mod commands;
mod options;
mod unit;

pub use options::{parse_args, CliOptions};

use std::path::PathBuf;

/// Driver-level failures: bad invocations and filesystem problems.
///
/// Problems *inside* source files are never `CliError`s; they flow through
/// the diagnostics collector and turn into a nonzero exit instead.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("cannot read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
