//! Application-wide error types.
//!
//! This module provides a unified error hierarchy for the application.
//! Library modules use specific error variants via `thiserror`, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - [`ResultExt`]: context-attaching extension for `Result`
//! - Scheduling and aggregation are total over valid records and never
//!   produce errors; out-of-range values are clamped, not rejected
//!
//! # Example
//!
//! ```ignore
//! use tune_recall::error::{Error, Result};
//!
//! fn plan(records: &[MasteryRecord]) -> Result<Vec<i64>> {
//!     if records.len() < 10 {
//!         return Err(Error::insufficient_library(10, records.len()));
//!     }
//!     Ok(vec![])
//! }
//! ```

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
///
/// Aggregates errors from all subsystems for unified handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A session mode requires more songs than the library holds.
    /// The caller decides whether to shrink the request or abort.
    #[error("library has {available} songs but the session needs {needed}")]
    InsufficientLibrary { needed: usize, available: usize },

    /// No mastery record exists for a song id. Indicates a library/store
    /// inconsistency; recoverable by re-importing the song.
    #[error("no mastery record for song id {0}")]
    RecordNotFound(i64),

    /// A persisted outcome fell outside the closed enumeration.
    /// Should never occur in correct integration; a corrupt store.
    #[error("invalid outcome in store: {0:?}")]
    InvalidOutcome(String),

    /// A song with the same path or Spotify ID already exists
    #[error("duplicate song: {0}")]
    DuplicateSong(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an insufficient-library error.
    pub fn insufficient_library(needed: usize, available: usize) -> Self {
        Self::InsufficientLibrary { needed, available }
    }

    /// Create a duplicate-song error.
    pub fn duplicate_song(path: impl Into<String>) -> Self {
        Self::DuplicateSong(path.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}
