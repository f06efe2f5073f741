//! Command-line interface for tune-recall.
//!
//! This module provides CLI commands for managing the song library,
//! building quiz sessions, grading answers, and showing the statistics
//! dashboard. All scheduling decisions happen in the core modules; the
//! CLI is I/O glue.

mod commands;

pub use commands::{Cli, Commands, run_command};
