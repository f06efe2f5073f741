//! Tune Recall - a blind-test trainer for song recognition.
//!
//! Maintains a per-song mastery state, schedules reviews with spaced
//! repetition, and composes quiz sessions (Standard, Challenge, Gauntlet,
//! Learning Lab) over a local song library. Audio playback and metadata
//! lookup are external; this binary owns the scheduling and the store.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod grader;
pub mod library;
pub mod model;
pub mod session;
pub mod srs;
pub mod stats;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("tune_recall=info".parse().unwrap()))
        .init();

    cli::run_command(&args)
}
