//! CLI command definitions and dispatch.
//!
//! Each subcommand resolves the database, loads config, calls into the
//! core modules, and prints. The record store is opened per command and
//! closed on every exit path when the pool drops.

use std::path::PathBuf;

use chrono::{Days, Utc};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sqlx::SqlitePool;
use tokio::runtime::Runtime;
use tracing::info;

use crate::config::{self, Config};
use crate::db::{self, NewSong};
use crate::error::Error;
use crate::grader::{self, Answer};
use crate::library;
use crate::session::{self, Mode, Session};
use crate::srs;
use crate::stats;

/// Tune Recall CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Database file (default: tune_recall.db, or library.database_path
    /// from the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Add a song to the training library
    Add {
        /// Song title
        #[arg(long)]
        title: String,
        /// Artist name
        #[arg(long)]
        artist: String,
        /// Release year
        #[arg(long)]
        year: Option<i64>,
        /// Path to the audio file
        path: PathBuf,
        /// Album art reference (URL or path)
        #[arg(long)]
        art: Option<String>,
        /// Spotify track ID
        #[arg(long)]
        spotify_id: Option<String>,
    },
    /// Remove a song (and its mastery history) from the library
    Remove {
        /// Database ID of the song
        song_id: i64,
    },
    /// List all songs in the library
    List,
    /// Show songs due for review today
    Due,
    /// Build a quiz session plan
    Session {
        /// Game mode
        #[arg(long, value_enum, default_value = "standard")]
        mode: Mode,
        /// Override the configured session size for this mode
        #[arg(long)]
        count: Option<usize>,
        /// Seed for Challenge-mode selection (reproducible sessions)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Grade an answer for a song and reschedule it
    Review {
        /// Database ID of the song that was played
        song_id: i64,
        /// Title the user answered (omit both fields for a timeout)
        #[arg(long)]
        title: Option<String>,
        /// Artist the user answered
        #[arg(long)]
        artist: Option<String>,
        /// Response latency in seconds
        #[arg(long)]
        latency: Option<f64>,
    },
    /// Show the mastery dashboard
    Stats {
        /// Days of practice history to show
        #[arg(long, default_value = "30")]
        days: u32,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let config = config::load();

    match &cli.command {
        Some(Commands::Add {
            title,
            artist,
            year,
            path,
            art,
            spotify_id,
        }) => {
            let song = NewSong {
                title: title.clone(),
                artist: artist.clone(),
                release_year: *year,
                path: path.display().to_string(),
                album_art: art.clone(),
                spotify_id: spotify_id.clone(),
            };
            cmd_add(&rt, cli.db.as_ref(), &config, &song)
        }
        Some(Commands::Remove { song_id }) => cmd_remove(&rt, cli.db.as_ref(), &config, *song_id),
        Some(Commands::List) => cmd_list(&rt, cli.db.as_ref(), &config),
        Some(Commands::Due) => cmd_due(&rt, cli.db.as_ref(), &config),
        Some(Commands::Session { mode, count, seed }) => {
            cmd_session(&rt, cli.db.as_ref(), &config, *mode, *count, *seed)
        }
        Some(Commands::Review {
            song_id,
            title,
            artist,
            latency,
        }) => cmd_review(
            &rt,
            cli.db.as_ref(),
            &config,
            *song_id,
            title.as_deref(),
            artist.as_deref(),
            *latency,
        ),
        Some(Commands::Stats { days }) => cmd_stats(&rt, cli.db.as_ref(), &config, *days),
        None => Ok(()),
    }
}

/// Resolve the database URL: CLI flag, then config, then the default file.
fn resolve_db_url(db: Option<&PathBuf>, config: &Config) -> String {
    db::db_url(
        db.map(PathBuf::as_path)
            .or(config.library.database_path.as_deref()),
    )
}

async fn open(db: Option<&PathBuf>, config: &Config) -> anyhow::Result<SqlitePool> {
    let url = resolve_db_url(db, config);
    let pool = db::init_db(&url).await?;
    info!(url = %url, "Database connected");
    Ok(pool)
}

fn cmd_add(
    rt: &Runtime,
    db_path: Option<&PathBuf>,
    config: &Config,
    song: &NewSong,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open(db_path, config).await?;
        let id = library::add_song(&pool, song, Utc::now().date_naive()).await?;
        println!("Added #{id}: {} - {}", song.title, song.artist);
        Ok(())
    })
}

fn cmd_remove(
    rt: &Runtime,
    db_path: Option<&PathBuf>,
    config: &Config,
    song_id: i64,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open(db_path, config).await?;
        library::remove_song(&pool, song_id).await?;
        println!("Removed song #{song_id}");
        Ok(())
    })
}

fn cmd_list(rt: &Runtime, db_path: Option<&PathBuf>, config: &Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open(db_path, config).await?;
        let songs = db::get_all_songs(&pool).await?;
        if songs.is_empty() {
            println!("Library is empty.");
            return Ok(());
        }
        for song in songs {
            let year = song
                .release_year
                .map_or_else(|| "----".to_string(), |y| y.to_string());
            println!("#{:<4} {} - {} ({})", song.id, song.title, song.artist, year);
        }
        Ok(())
    })
}

fn cmd_due(rt: &Runtime, db_path: Option<&PathBuf>, config: &Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open(db_path, config).await?;
        let today = Utc::now().date_naive();
        let records = db::list_records(&pool).await?;
        let due: Vec<_> = records.iter().filter(|r| srs::is_due(r, today)).collect();

        if due.is_empty() {
            println!("No songs due for review today. Great job!");
            return Ok(());
        }
        println!("{} song(s) due:", due.len());
        for record in due {
            if let Some(song) = db::get_song(&pool, record.song_id).await? {
                println!(
                    "#{:<4} {} - {} (due {})",
                    song.id, song.title, song.artist, record.due_date
                );
            }
        }
        Ok(())
    })
}

fn cmd_session(
    rt: &Runtime,
    db_path: Option<&PathBuf>,
    config: &Config,
    mode: Mode,
    count: Option<usize>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open(db_path, config).await?;
        let records = db::list_records(&pool).await?;

        let mut session_config = config.session.clone();
        if let Some(count) = count {
            match mode {
                Mode::Standard => session_config.standard_cap = count,
                Mode::Challenge => session_config.challenge_song_count = count,
                Mode::Gauntlet => session_config.gauntlet_size = count,
                Mode::LearningLab => session_config.learning_lab_size = count,
            }
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let today = Utc::now().date_naive();
        let plan = match session::build_session(mode, &records, today, &session_config, &mut rng) {
            Ok(plan) if plan.is_empty() => {
                match mode {
                    Mode::Standard => println!("No songs due for review today. Great job!"),
                    _ => println!("Library is empty. Add songs before starting a session."),
                }
                return Ok(());
            }
            Ok(plan) => plan,
            Err(Error::InsufficientLibrary { needed, available }) => {
                println!(
                    "Not enough songs for this mode: need {needed}, library has {available}."
                );
                println!("Add more songs or retry with --count {available}.");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut session = Session::new(mode, plan)?;
        let (_, total) = session.progress();
        println!("Session plan ({total} songs):");
        while let Some(song_id) = session.current_song() {
            let (current, total) = session.progress();
            if let Some(song) = db::get_song(&pool, song_id).await? {
                println!("{current:>3}/{total} #{:<4} {} - {}", song.id, song.title, song.artist);
            }
            session.advance();
        }
        if session.mode() == Mode::LearningLab {
            println!("Passive listen-through: no grading for this session.");
        } else {
            println!("Play each snippet, then grade with: tune-recall review <id> ...");
        }
        Ok(())
    })
}

fn cmd_review(
    rt: &Runtime,
    db_path: Option<&PathBuf>,
    config: &Config,
    song_id: i64,
    title: Option<&str>,
    artist: Option<&str>,
    latency: Option<f64>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open(db_path, config).await?;

        let song = db::get_song(&pool, song_id)
            .await?
            .ok_or(Error::RecordNotFound(song_id))?;
        let record = db::get_record(&pool, song_id)
            .await?
            .ok_or(Error::RecordNotFound(song_id))?;

        // No answer at all means the round timed out.
        let answer = (title.is_some() || artist.is_some()).then(|| Answer {
            title: title.unwrap_or_default().to_string(),
            artist: artist.unwrap_or_default().to_string(),
        });

        let outcome = grader::grade(&song, answer.as_ref(), latency, &config.grader);
        let now = Utc::now();
        let updated = srs::schedule(&record, outcome, latency, now, &config.srs);
        db::save_review(&pool, &updated).await?;

        info!(song_id, %outcome, interval = updated.interval_days, "Review saved");
        println!("{} - {}: {outcome}", song.title, song.artist);
        println!(
            "Next review in {} day(s), on {}.",
            updated.interval_days, updated.due_date
        );
        Ok(())
    })
}

fn cmd_stats(
    rt: &Runtime,
    db_path: Option<&PathBuf>,
    config: &Config,
    days: u32,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open(db_path, config).await?;
        let records = db::list_records(&pool).await?;

        let dist = stats::mastery_distribution(&records);
        println!("Mastery distribution ({} songs):", dist.total());
        println!("  New      {:>4}", dist.new);
        println!("  Learning {:>4}", dist.learning);
        println!("  Young    {:>4}", dist.young);
        println!("  Mature   {:>4}", dist.mature);

        let today = Utc::now().date_naive();
        let from = today - Days::new(u64::from(days.saturating_sub(1)));
        let history = stats::practice_history(&records, from, today);

        let practiced: Vec<_> = history.iter().filter(|d| d.attempts > 0).collect();
        println!("\nPractice over the last {days} day(s):");
        if practiced.is_empty() {
            println!("  (no attempts recorded)");
        }
        for day in practiced {
            println!(
                "  {}  {:>3} attempt(s), {:>3.0}% correct",
                day.date,
                day.attempts,
                day.correct_ratio() * 100.0
            );
        }
        Ok(())
    })
}
