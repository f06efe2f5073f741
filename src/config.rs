//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\tune-recall\config.toml
//! - macOS: ~/Library/Application Support/tune-recall/config.toml
//! - Linux: ~/.config/tune-recall/config.toml
//!
//! The config file is human-readable and editable. The scheduler bounds,
//! per-mode session sizes, and grading thresholds all live here; the core
//! modules take these structs as arguments rather than reading the file
//! themselves.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::grader::GraderConfig;
use crate::session::SessionConfig;
use crate::srs::SrsTuning;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Playback settings passed through to the audio layer
    pub playback: PlaybackConfig,

    /// Per-mode session sizes
    pub session: SessionConfig,

    /// Scheduler bounds and nudge sizes
    pub srs: SrsTuning,

    /// Answer matching thresholds
    pub grader: GraderConfig,

    /// Library settings
    pub library: LibraryConfig,
}

/// Playback settings.
///
/// The scheduling core never reads these; they ride along for the
/// playback layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Length of the quiz snippet in seconds
    pub snippet_duration_seconds: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            snippet_duration_seconds: 15,
        }
    }
}

/// Library management settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Music folder the import scanner feeds from
    pub music_folder: Option<PathBuf>,

    /// Database file override (default: tune_recall.db in the working dir)
    pub database_path: Option<PathBuf>,
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tune-recall"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    let path = dir.join("config.toml");

    // Ensure directory exists
    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::CreateDir(dir.clone(), e))?;

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, &path)
        .map_err(|e| ConfigError::Rename(temp_path, path.clone(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[playback]"));
        assert!(toml.contains("[session]"));
        assert!(toml.contains("[srs]"));
        assert!(toml.contains("[grader]"));
        assert!(toml.contains("[library]"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.session.challenge_song_count = 30;
        config.srs.max_interval_days = 180;
        config.library.music_folder = Some(PathBuf::from("/music"));

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(parsed.session.challenge_song_count, 30);
        assert_eq!(parsed.srs.max_interval_days, 180);
        assert_eq!(parsed.library.music_folder, Some(PathBuf::from("/music")));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        // Config with only some fields
        let toml = r#"
[session]
gauntlet_size = 15
"#;
        let config: Config = toml::from_str(toml).unwrap();

        // Specified field is set
        assert_eq!(config.session.gauntlet_size, 15);

        // Other fields use defaults
        assert_eq!(config.session.challenge_song_count, 20);
        assert_eq!(config.playback.snippet_duration_seconds, 15);
        assert!((config.srs.min_ease - 1.3).abs() < 1e-9);
        assert!((config.grader.fuzzy_threshold - 0.8).abs() < 1e-9);
    }
}
