//! Core data models for the trainer.
//!
//! Defines the primary entities: [`Song`], [`MasteryRecord`], and the graded
//! [`Outcome`] of a quiz attempt. Songs are derived from SQLx for database
//! mapping; mastery records carry their review history and are assembled by
//! the `db` module from two tables.
//!
//! # Database Schema
//!
//! - `songs` - Imported songs with metadata (path is the unique identity)
//! - `mastery` - One spaced-repetition state row per song
//! - `review_history` - Append-only log of graded attempts

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// A song in the training library.
///
/// Immutable once imported, except for metadata refresh (title, artist,
/// year, album art can be corrected later; the path never changes).
#[derive(Debug, Clone, FromRow)]
pub struct Song {
    /// Database ID (auto-generated)
    pub id: i64,
    /// Song title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Release year (optional)
    pub release_year: Option<i64>,
    /// Absolute file path (unique identifier)
    pub path: String,
    /// Album art reference (URL or local path)
    pub album_art: Option<String>,
    /// Spotify track ID, if the song was matched during import
    pub spotify_id: Option<String>,
}

/// Graded result of a single quiz attempt.
///
/// This is the sole input to the scheduler; the scheduler matches it
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Both title and artist identified
    Correct,
    /// Exactly one of title/artist identified
    Partial,
    /// Neither identified, or no response before the timeout
    Incorrect,
}

impl Outcome {
    /// Stable string form used for database storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Partial => "partial",
            Outcome::Incorrect => "incorrect",
        }
    }

    /// Parse the stored string form. Returns `None` for anything outside
    /// the closed set (a corrupt store, see [`crate::error::Error::InvalidOutcome`]).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "correct" => Some(Outcome::Correct),
            "partial" => Some(Outcome::Partial),
            "incorrect" => Some(Outcome::Incorrect),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One graded attempt in a song's review history.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry {
    /// When the attempt was graded
    pub reviewed_at: DateTime<Utc>,
    /// The graded outcome
    pub outcome: Outcome,
    /// Response latency in seconds (None when the round timed out)
    pub latency_seconds: Option<f64>,
}

/// Spaced-repetition state for one song.
///
/// Created alongside the song at import time, mutated only by the scheduler
/// in response to a graded attempt. `history` is append-only and its length
/// equals the total number of graded attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct MasteryRecord {
    /// ID of the owning song
    pub song_id: i64,
    /// Successful reviews in the current learning streak
    pub repetition_count: u32,
    /// Interval growth multiplier, kept within configured bounds
    pub ease_factor: f64,
    /// Days until the next scheduled review
    pub interval_days: u32,
    /// Date the song becomes eligible for a Standard-mode review
    pub due_date: NaiveDate,
    /// Failures since the song was first learned (never decreases)
    pub lapse_count: u32,
    /// Timestamp of the last graded attempt, None until first reviewed
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// Ordered log of all graded attempts
    pub history: Vec<ReviewEntry>,
}

impl MasteryRecord {
    /// Fresh record for a newly imported song: due immediately, default
    /// ease, no history.
    pub fn new(song_id: i64, today: NaiveDate) -> Self {
        Self {
            song_id,
            repetition_count: 0,
            ease_factor: 2.5,
            interval_days: 1,
            due_date: today,
            lapse_count: 0,
            last_reviewed_at: None,
            history: Vec::new(),
        }
    }
}
