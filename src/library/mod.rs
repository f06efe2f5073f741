//! Library maintenance on top of the record store.
//!
//! The scanner and metadata provider are external collaborators: they hand
//! over ready-made [`NewSong`] values and this module owns getting them
//! into the store with the mastery invariants intact, translating SQLite
//! constraint failures into domain errors along the way.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{self, NewSong};
use crate::error::{Error, Result};

/// Outcome of a batch import.
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Songs added, each with a fresh mastery record
    pub added: usize,
    /// Paths skipped because they were already in the library
    pub skipped: Vec<String>,
}

/// Add one song, creating its mastery record in the same transaction.
///
/// Fails with [`Error::DuplicateSong`] when the path or Spotify ID is
/// already in the library.
pub async fn add_song(pool: &SqlitePool, song: &NewSong, today: NaiveDate) -> Result<i64> {
    match db::insert_song(pool, song, today).await {
        Ok(id) => {
            info!(song_id = id, path = %song.path, "Added song to library");
            Ok(id)
        }
        Err(e) if is_unique_violation(&e) => Err(Error::duplicate_song(&song.path)),
        Err(e) => Err(e.into()),
    }
}

/// Import a batch of songs, skipping duplicates instead of aborting.
///
/// Any other database failure stops the import; songs added before the
/// failure stay added (each insert is its own transaction).
pub async fn import_songs(
    pool: &SqlitePool,
    songs: &[NewSong],
    today: NaiveDate,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for song in songs {
        match add_song(pool, song, today).await {
            Ok(_) => summary.added += 1,
            Err(Error::DuplicateSong(path)) => {
                warn!(path = %path, "Skipping duplicate during import");
                summary.skipped.push(path);
            }
            Err(e) => return Err(e),
        }
    }
    info!(
        added = summary.added,
        skipped = summary.skipped.len(),
        "Import finished"
    );
    Ok(summary)
}

/// Remove a song from the library, cascading to its mastery record and
/// history.
pub async fn remove_song(pool: &SqlitePool, song_id: i64) -> Result<()> {
    if db::get_song(pool, song_id).await?.is_none() {
        return Err(Error::RecordNotFound(song_id));
    }
    db::delete_song(pool, song_id).await?;
    info!(song_id, "Removed song and its mastery history");
    Ok(())
}

/// Refresh a song's metadata from the external provider.
pub async fn refresh_metadata(
    pool: &SqlitePool,
    song_id: i64,
    title: &str,
    artist: &str,
    release_year: Option<i64>,
    album_art: Option<&str>,
) -> Result<()> {
    if db::get_song(pool, song_id).await?.is_none() {
        return Err(Error::RecordNotFound(song_id));
    }
    db::update_song_metadata(pool, song_id, title, artist, release_year, album_art).await?;
    Ok(())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
