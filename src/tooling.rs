//! Tooling layer
//!
//! The `hotload` command-line surface and the text/JSON formatting it prints.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
