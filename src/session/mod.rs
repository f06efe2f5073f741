//! Session composition for the four game modes.
//!
//! Every selection policy is a pure function over a slice of
//! [`MasteryRecord`]s: the caller passes the record set, the query date,
//! and (for Challenge) the random source explicitly. Nothing here reads
//! ambient state or mutates records, so a session build can be abandoned
//! at any point without cleanup.
//!
//! - Standard: due songs, most overdue first, capped
//! - Challenge: uniform sample without replacement from the whole library
//! - Gauntlet: the top problem songs by lapse count
//! - Learning Lab: Gauntlet ranking, served as a passive listen-through

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{MasteryRecord, Outcome};
use crate::srs;

/// Game mode for a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Due songs scheduled by the SRS
    Standard,
    /// Random selection from the whole library, scored
    Challenge,
    /// The hardest songs, by lapse count
    Gauntlet,
    /// Passive listen-through of the hardest songs
    LearningLab,
}

/// Per-mode selection sizes, from the `[session]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum songs per Standard session (fewer when fewer are due)
    pub standard_cap: usize,
    /// Songs per Challenge session
    pub challenge_song_count: usize,
    /// Songs per Gauntlet session
    pub gauntlet_size: usize,
    /// Songs per Learning Lab session
    pub learning_lab_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            standard_cap: 20,
            challenge_song_count: 20,
            gauntlet_size: 10,
            learning_lab_size: 10,
        }
    }
}

/// Build the ordered song-id plan for a session.
///
/// Deterministic for every mode except Challenge, whose randomness comes
/// entirely from `rng` (seed it for reproducible sessions).
pub fn build_session<R: Rng + ?Sized>(
    mode: Mode,
    records: &[MasteryRecord],
    as_of: NaiveDate,
    config: &SessionConfig,
    rng: &mut R,
) -> Result<Vec<i64>> {
    match mode {
        Mode::Standard => Ok(standard_plan(records, as_of, config.standard_cap)),
        Mode::Challenge => challenge_plan(records, config.challenge_song_count, rng),
        Mode::Gauntlet => gauntlet_plan(records, config.gauntlet_size),
        Mode::LearningLab => Ok(learning_lab_plan(records, config.learning_lab_size)),
    }
}

/// Due songs ordered most-overdue first, capped at `cap`.
///
/// Never pads with non-due songs; a short plan (or an empty one) is a
/// valid result.
pub fn standard_plan(records: &[MasteryRecord], as_of: NaiveDate, cap: usize) -> Vec<i64> {
    let mut due: Vec<&MasteryRecord> = records
        .iter()
        .filter(|r| srs::is_due(r, as_of))
        .collect();
    // Song id as tie-break keeps equal due dates deterministic.
    due.sort_by_key(|r| (r.due_date, r.song_id));
    due.into_iter().take(cap).map(|r| r.song_id).collect()
}

/// Uniform sample of `count` songs without replacement.
///
/// The whole library is fair game regardless of due status. Fails with
/// [`Error::InsufficientLibrary`] when the library is smaller than the
/// request; the caller decides whether to retry with fewer.
pub fn challenge_plan<R: Rng + ?Sized>(
    records: &[MasteryRecord],
    count: usize,
    rng: &mut R,
) -> Result<Vec<i64>> {
    if records.len() < count {
        return Err(Error::insufficient_library(count, records.len()));
    }
    let picks = rand::seq::index::sample(rng, records.len(), count);
    Ok(picks.iter().map(|i| records[i].song_id).collect())
}

/// Rank by problem score: lapse count descending, then ease ascending
/// (lower ease = harder), then song id for determinism.
fn problem_ranking(records: &[MasteryRecord]) -> Vec<&MasteryRecord> {
    let mut ranked: Vec<&MasteryRecord> = records.iter().collect();
    ranked.sort_by(|a, b| {
        b.lapse_count
            .cmp(&a.lapse_count)
            .then(a.ease_factor.total_cmp(&b.ease_factor))
            .then(a.song_id.cmp(&b.song_id))
    });
    ranked
}

/// The `size` most problematic songs, for a graded drill.
///
/// Fails with [`Error::InsufficientLibrary`] when fewer than `size` songs
/// exist.
pub fn gauntlet_plan(records: &[MasteryRecord], size: usize) -> Result<Vec<i64>> {
    if records.len() < size {
        return Err(Error::insufficient_library(size, records.len()));
    }
    Ok(problem_ranking(records)
        .into_iter()
        .take(size)
        .map(|r| r.song_id)
        .collect())
}

/// Gauntlet ranking served as a passive listen-through.
///
/// No grading loop follows, so a short library just yields a shorter
/// playlist instead of an error.
pub fn learning_lab_plan(records: &[MasteryRecord], size: usize) -> Vec<i64> {
    problem_ranking(records)
        .into_iter()
        .take(size)
        .map(|r| r.song_id)
        .collect()
}

/// Runtime state of one quiz session: the plan plus a cursor and score.
///
/// Selection is done up front; this only walks the plan. Building a
/// session mutates nothing, so dropping a `Session` before grading starts
/// aborts it cleanly.
#[derive(Debug, Clone)]
pub struct Session {
    mode: Mode,
    song_ids: Vec<i64>,
    position: usize,
    score: u32,
}

impl Session {
    /// Start a session over a non-empty plan.
    pub fn new(mode: Mode, song_ids: Vec<i64>) -> Result<Self> {
        if song_ids.is_empty() {
            return Err(Error::insufficient_library(1, 0));
        }
        Ok(Self {
            mode,
            song_ids,
            position: 0,
            score: 0,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The song currently being asked, or None when the session is over.
    pub fn current_song(&self) -> Option<i64> {
        self.song_ids.get(self.position).copied()
    }

    /// `(current question number, total questions)`, 1-based.
    pub fn progress(&self) -> (usize, usize) {
        ((self.position + 1).min(self.song_ids.len()), self.song_ids.len())
    }

    /// Count the graded outcome toward the session score.
    pub fn record_result(&mut self, outcome: Outcome) {
        if outcome == Outcome::Correct {
            self.score += 1;
        }
    }

    /// Advance past the current song.
    pub fn advance(&mut self) {
        if !self.is_finished() {
            self.position += 1;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.song_ids.len()
    }

    /// Correct answers so far.
    pub fn score(&self) -> u32 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Record that has been reviewed once, due on the given date.
    fn reviewed_record(song_id: i64, due: NaiveDate) -> MasteryRecord {
        let mut record = MasteryRecord::new(song_id, due);
        record.last_reviewed_at = Some(chrono::Utc::now());
        record.due_date = due;
        record
    }

    fn library(n: i64, due: NaiveDate) -> Vec<MasteryRecord> {
        (1..=n).map(|id| reviewed_record(id, due)).collect()
    }

    #[test]
    fn test_standard_excludes_records_not_yet_due() {
        let today = date(2024, 6, 10);
        let mut records = library(3, today - Days::new(1));
        records.push(reviewed_record(99, today + Days::new(5)));

        let plan = standard_plan(&records, today, 20);
        assert_eq!(plan.len(), 3);
        assert!(!plan.contains(&99));
    }

    #[test]
    fn test_standard_orders_most_overdue_first() {
        let today = date(2024, 6, 10);
        let records = vec![
            reviewed_record(1, today),
            reviewed_record(2, today - Days::new(7)),
            reviewed_record(3, today - Days::new(2)),
        ];
        let plan = standard_plan(&records, today, 20);
        assert_eq!(plan, vec![2, 3, 1]);
    }

    #[test]
    fn test_standard_caps_but_never_pads() {
        let today = date(2024, 6, 10);
        let records = library(30, today);
        assert_eq!(standard_plan(&records, today, 5).len(), 5);

        let few_due = library(2, today);
        assert_eq!(standard_plan(&few_due, today, 5).len(), 2);
    }

    #[test]
    fn test_standard_includes_never_reviewed_regardless_of_due_date() {
        let today = date(2024, 6, 10);
        // Fresh import: no last_reviewed_at, due date in the future.
        let mut record = MasteryRecord::new(1, today + Days::new(3));
        record.last_reviewed_at = None;
        let plan = standard_plan(&[record], today, 10);
        assert_eq!(plan, vec![1]);
    }

    #[test]
    fn test_challenge_fails_on_small_library() {
        let today = date(2024, 6, 10);
        let records = library(5, today);
        let mut rng = StdRng::seed_from_u64(1);
        let err = challenge_plan(&records, 20, &mut rng).unwrap_err();
        match err {
            Error::InsufficientLibrary { needed, available } => {
                assert_eq!(needed, 20);
                assert_eq!(available, 5);
            }
            other => panic!("expected InsufficientLibrary, got {other}"),
        }
    }

    #[test]
    fn test_challenge_same_seed_same_plan() {
        let today = date(2024, 6, 10);
        let records = library(50, today);

        let plan_a =
            challenge_plan(&records, 20, &mut StdRng::seed_from_u64(42)).unwrap();
        let plan_b =
            challenge_plan(&records, 20, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(plan_a, plan_b);

        let plan_c =
            challenge_plan(&records, 20, &mut StdRng::seed_from_u64(43)).unwrap();
        assert_ne!(plan_a, plan_c, "different seeds should diverge");
    }

    #[test]
    fn test_challenge_samples_without_replacement() {
        let today = date(2024, 6, 10);
        let records = library(25, today);
        let plan = challenge_plan(&records, 25, &mut StdRng::seed_from_u64(7)).unwrap();
        let mut sorted = plan.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 25, "every song exactly once");
    }

    #[test]
    fn test_challenge_ignores_due_status() {
        let today = date(2024, 6, 10);
        // Nothing is due, yet Challenge still fills the session.
        let records = library(10, today + Days::new(30));
        let plan = challenge_plan(&records, 10, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(plan.len(), 10);
    }

    #[test]
    fn test_gauntlet_ranks_by_lapses_then_ease() {
        let today = date(2024, 6, 10);
        let mut records = library(10, today);
        records[4].lapse_count = 9; // song 5: worst
        records[7].lapse_count = 4; // song 8
        records[2].lapse_count = 4; // song 3, lower ease than song 8
        records[2].ease_factor = 1.5;
        records[7].ease_factor = 2.0;

        let plan = gauntlet_plan(&records, 10).unwrap();
        assert_eq!(plan.len(), 10);
        assert_eq!(plan[0], 5);
        assert_eq!(plan[1], 3, "equal lapses: lower ease ranks first");
        assert_eq!(plan[2], 8);

        // Exactly the whole library, once each.
        let mut sorted = plan.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_gauntlet_fails_below_minimum() {
        let today = date(2024, 6, 10);
        let records = library(9, today);
        assert!(matches!(
            gauntlet_plan(&records, 10),
            Err(Error::InsufficientLibrary {
                needed: 10,
                available: 9
            })
        ));
    }

    #[test]
    fn test_learning_lab_truncates_instead_of_failing() {
        let today = date(2024, 6, 10);
        let mut records = library(4, today);
        records[1].lapse_count = 3;
        let plan = learning_lab_plan(&records, 10);
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[0], 2);
    }

    #[test]
    fn test_build_session_dispatches_by_mode() {
        let today = date(2024, 6, 10);
        let records = library(30, today - Days::new(1));
        let config = SessionConfig::default();
        let mut rng = StdRng::seed_from_u64(5);

        let standard =
            build_session(Mode::Standard, &records, today, &config, &mut rng).unwrap();
        assert_eq!(standard.len(), config.standard_cap);

        let gauntlet =
            build_session(Mode::Gauntlet, &records, today, &config, &mut rng).unwrap();
        assert_eq!(gauntlet.len(), config.gauntlet_size);

        let lab =
            build_session(Mode::LearningLab, &records, today, &config, &mut rng).unwrap();
        assert_eq!(lab.len(), config.learning_lab_size);
    }

    #[test]
    fn test_session_walks_plan_and_scores() {
        let mut session = Session::new(Mode::Challenge, vec![3, 1, 2]).unwrap();
        assert_eq!(session.progress(), (1, 3));
        assert_eq!(session.current_song(), Some(3));

        session.record_result(Outcome::Correct);
        session.advance();
        session.record_result(Outcome::Partial);
        session.advance();
        assert_eq!(session.current_song(), Some(2));
        session.record_result(Outcome::Correct);
        session.advance();

        assert!(session.is_finished());
        assert_eq!(session.current_song(), None);
        assert_eq!(session.score(), 2);
    }

    #[test]
    fn test_session_rejects_empty_plan() {
        assert!(Session::new(Mode::Standard, vec![]).is_err());
    }
}
