//! Database module for songs, mastery state, and review history.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Provides async operations for:
//! - Song CRUD (import, metadata refresh, cascading removal)
//! - Mastery record load/save
//! - Append-only review history
//!
//! The mastery invariants live at this layer: a song and its mastery
//! record are created in one transaction, and a review saves the updated
//! state plus exactly one history row in one transaction.
//!
//! # Example
//!
//! ```ignore
//! use tune_recall::db::{init_db, list_records};
//!
//! let pool = init_db("sqlite:tune_recall.db").await?;
//! let records = list_records(&pool).await?;
//! ```

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::{Error, Result};
use crate::model::{MasteryRecord, Outcome, ReviewEntry, Song};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "tune_recall.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> std::result::Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Song fields supplied by the import pipeline (scanner + metadata
/// provider); the database assigns the id.
#[derive(Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub release_year: Option<i64>,
    pub path: String,
    pub album_art: Option<String>,
    pub spotify_id: Option<String>,
}

/// Insert a song and its fresh mastery record in one transaction.
///
/// The record starts due on `today` with the default ease, so a newly
/// imported song shows up in the next Standard session.
///
/// # Returns
///
/// The database ID of the new song.
pub async fn insert_song(
    pool: &SqlitePool,
    song: &NewSong,
    today: NaiveDate,
) -> sqlx::Result<i64> {
    let mut tx = pool.begin().await?;

    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO songs (title, artist, release_year, path, album_art, spotify_id)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&song.title)
    .bind(&song.artist)
    .bind(song.release_year)
    .bind(&song.path)
    .bind(song.album_art.as_deref())
    .bind(song.spotify_id.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO mastery (song_id, due_date) VALUES (?, ?)")
        .bind(row.0)
        .bind(today)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row.0)
}

/// Get a song by its database ID.
pub async fn get_song(pool: &SqlitePool, song_id: i64) -> sqlx::Result<Option<Song>> {
    sqlx::query_as::<_, Song>(
        "SELECT id, title, artist, release_year, path, album_art, spotify_id FROM songs WHERE id = ?",
    )
    .bind(song_id)
    .fetch_optional(pool)
    .await
}

/// Get all songs in the library.
pub async fn get_all_songs(pool: &SqlitePool) -> sqlx::Result<Vec<Song>> {
    sqlx::query_as::<_, Song>(
        "SELECT id, title, artist, release_year, path, album_art, spotify_id FROM songs ORDER BY id",
    )
    .fetch_all(pool)
    .await
}

/// Refresh a song's metadata (title, artist, year, art).
///
/// The path and id never change; this is the only mutation a song accepts
/// after import.
pub async fn update_song_metadata(
    pool: &SqlitePool,
    song_id: i64,
    title: &str,
    artist: &str,
    release_year: Option<i64>,
    album_art: Option<&str>,
) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE songs SET title = ?, artist = ?, release_year = ?, album_art = ? WHERE id = ?",
    )
    .bind(title)
    .bind(artist)
    .bind(release_year)
    .bind(album_art)
    .bind(song_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Remove a song and cascade to its mastery record and history.
///
/// Explicit deletes in one transaction rather than relying on the
/// foreign-key pragma being set on every connection.
pub async fn delete_song(pool: &SqlitePool, song_id: i64) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM review_history WHERE song_id = ?")
        .bind(song_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM mastery WHERE song_id = ?")
        .bind(song_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(song_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// Raw mastery row before history is attached.
#[derive(Debug, sqlx::FromRow)]
struct MasteryRow {
    song_id: i64,
    repetition_count: i64,
    ease_factor: f64,
    interval_days: i64,
    due_date: NaiveDate,
    lapse_count: i64,
    last_reviewed_at: Option<DateTime<Utc>>,
}

/// Raw history row.
#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    song_id: i64,
    reviewed_at: DateTime<Utc>,
    outcome: String,
    latency_seconds: Option<f64>,
}

impl MasteryRow {
    fn into_record(self, history: Vec<ReviewEntry>) -> MasteryRecord {
        MasteryRecord {
            song_id: self.song_id,
            repetition_count: self.repetition_count.max(0) as u32,
            ease_factor: self.ease_factor,
            interval_days: self.interval_days.max(0) as u32,
            due_date: self.due_date,
            lapse_count: self.lapse_count.max(0) as u32,
            last_reviewed_at: self.last_reviewed_at,
            history,
        }
    }
}

fn parse_entry(row: HistoryRow) -> Result<ReviewEntry> {
    let outcome = Outcome::parse(&row.outcome).ok_or(Error::InvalidOutcome(row.outcome))?;
    Ok(ReviewEntry {
        reviewed_at: row.reviewed_at,
        outcome,
        latency_seconds: row.latency_seconds,
    })
}

/// Load the mastery record (with full history) for one song.
///
/// Returns `Ok(None)` when the song has no record; fails with
/// [`Error::InvalidOutcome`] if the stored history contains an outcome
/// outside the closed set.
pub async fn get_record(pool: &SqlitePool, song_id: i64) -> Result<Option<MasteryRecord>> {
    let row: Option<MasteryRow> = sqlx::query_as(
        r#"
        SELECT song_id, repetition_count, ease_factor, interval_days,
               due_date, lapse_count, last_reviewed_at
        FROM mastery WHERE song_id = ?
        "#,
    )
    .bind(song_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let history_rows: Vec<HistoryRow> = sqlx::query_as(
        r#"
        SELECT song_id, reviewed_at, outcome, latency_seconds
        FROM review_history WHERE song_id = ?
        ORDER BY reviewed_at, id
        "#,
    )
    .bind(song_id)
    .fetch_all(pool)
    .await?;

    let history = history_rows
        .into_iter()
        .map(parse_entry)
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(row.into_record(history)))
}

/// Load every mastery record with its history attached.
///
/// This is the input to session building and the statistics views.
pub async fn list_records(pool: &SqlitePool) -> Result<Vec<MasteryRecord>> {
    let rows: Vec<MasteryRow> = sqlx::query_as(
        r#"
        SELECT song_id, repetition_count, ease_factor, interval_days,
               due_date, lapse_count, last_reviewed_at
        FROM mastery ORDER BY song_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let history_rows: Vec<HistoryRow> = sqlx::query_as(
        r#"
        SELECT song_id, reviewed_at, outcome, latency_seconds
        FROM review_history ORDER BY reviewed_at, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut by_song: HashMap<i64, Vec<ReviewEntry>> = HashMap::new();
    for row in history_rows {
        let song_id = row.song_id;
        by_song.entry(song_id).or_default().push(parse_entry(row)?);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let history = by_song.remove(&row.song_id).unwrap_or_default();
            row.into_record(history)
        })
        .collect())
}

/// Persist a scheduled review: updated mastery state plus the newest
/// history entry, in one transaction.
///
/// The record must be the output of `srs::schedule`, whose final history
/// entry is the attempt being saved. Earlier entries are already on disk
/// and are never rewritten.
pub async fn save_review(pool: &SqlitePool, record: &MasteryRecord) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE mastery
        SET repetition_count = ?, ease_factor = ?, interval_days = ?,
            due_date = ?, lapse_count = ?, last_reviewed_at = ?
        WHERE song_id = ?
        "#,
    )
    .bind(record.repetition_count as i64)
    .bind(record.ease_factor)
    .bind(record.interval_days as i64)
    .bind(record.due_date)
    .bind(record.lapse_count as i64)
    .bind(record.last_reviewed_at)
    .bind(record.song_id)
    .execute(&mut *tx)
    .await?;

    if let Some(entry) = record.history.last() {
        sqlx::query(
            r#"
            INSERT INTO review_history (song_id, reviewed_at, outcome, latency_seconds)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.song_id)
        .bind(entry.reviewed_at)
        .bind(entry.outcome.as_str())
        .bind(entry.latency_seconds)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
