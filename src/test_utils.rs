//! Test utilities and fixtures for tune-recall tests.
//!
//! This module provides common test helpers, mock factories, and
//! database utilities to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use tune_recall::test_utils::{temp_db, mock_new_song};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let id = crate::db::insert_song(&pool, &mock_new_song("/m/a.mp3"), today).await?;
//! }
//! ```

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::db::NewSong;

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// # Returns
///
/// A tuple of (connection pool, temp directory handle).
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Creates a mock NewSong keyed by path.
///
/// Title and artist are derived from the path so two mocks with different
/// paths never collide on any unique column. `spotify_id` stays None for
/// the same reason.
pub fn mock_new_song(path: &str) -> NewSong {
    NewSong {
        title: format!("Title of {path}"),
        artist: format!("Artist of {path}"),
        release_year: Some(1999),
        path: path.to_string(),
        album_art: None,
        spotify_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;

        // Should be able to query
        let songs = crate::db::get_all_songs(&pool).await.unwrap();
        assert!(songs.is_empty());
    }

    #[tokio::test]
    async fn test_mock_new_song_inserts_cleanly() {
        let (pool, _dir) = temp_db().await;
        let today = Utc::now().date_naive();

        crate::db::insert_song(&pool, &mock_new_song("/a.mp3"), today)
            .await
            .unwrap();
        crate::db::insert_song(&pool, &mock_new_song("/b.mp3"), today)
            .await
            .unwrap();

        let songs = crate::db::get_all_songs(&pool).await.unwrap();
        assert_eq!(songs.len(), 2);
        assert_ne!(songs[0].title, songs[1].title);
    }
}
