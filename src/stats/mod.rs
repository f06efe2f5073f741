//! Read-only statistics views for the dashboard.
//!
//! Everything here is derived from a slice of [`MasteryRecord`]s passed in
//! by the caller; nothing reads ambient state or touches the store. An
//! empty library yields empty or zeroed views, never an error.

use chrono::{Days, NaiveDate};

use crate::model::{MasteryRecord, Outcome};

/// Mastery tier for the dashboard's distribution chart.
///
/// Derived from the current streak and lapse history:
/// - `New`: never attempted
/// - `Learning`: streak shorter than 3
/// - `Young`: streak of 3-5, or a long streak on a song that has lapsed
///   at least as often as it has succeeded
/// - `Mature`: streak of 6+ with lapses clearly behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MasteryTier {
    New,
    Learning,
    Young,
    Mature,
}

/// Classify one record into its tier.
pub fn tier_for(record: &MasteryRecord) -> MasteryTier {
    if record.history.is_empty() {
        MasteryTier::New
    } else if record.repetition_count < 3 {
        MasteryTier::Learning
    } else if record.repetition_count < 6 || record.lapse_count >= record.repetition_count {
        MasteryTier::Young
    } else {
        MasteryTier::Mature
    }
}

/// Counts per mastery tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MasteryDistribution {
    pub new: usize,
    pub learning: usize,
    pub young: usize,
    pub mature: usize,
}

impl MasteryDistribution {
    /// Total records counted.
    pub fn total(&self) -> usize {
        self.new + self.learning + self.young + self.mature
    }
}

/// Bucket all records by tier.
pub fn mastery_distribution(records: &[MasteryRecord]) -> MasteryDistribution {
    let mut dist = MasteryDistribution::default();
    for record in records {
        match tier_for(record) {
            MasteryTier::New => dist.new += 1,
            MasteryTier::Learning => dist.learning += 1,
            MasteryTier::Young => dist.young += 1,
            MasteryTier::Mature => dist.mature += 1,
        }
    }
    dist
}

/// Attempt counts for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPractice {
    pub date: NaiveDate,
    pub attempts: usize,
    pub correct: usize,
}

impl DailyPractice {
    /// Fraction of attempts graded `Correct`; 0.0 on an idle day.
    pub fn correct_ratio(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.correct as f64 / self.attempts as f64
        }
    }
}

/// Attempts and correct-ratio per calendar day over `from..=to`.
///
/// Every day in the range appears, zero-filled when idle, so the dashboard
/// can plot a continuous axis. An inverted range yields an empty view.
pub fn practice_history(
    records: &[MasteryRecord],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<DailyPractice> {
    let mut days: Vec<DailyPractice> = Vec::new();
    let mut day = from;
    while day <= to {
        days.push(DailyPractice {
            date: day,
            attempts: 0,
            correct: 0,
        });
        day = day + Days::new(1);
    }

    for record in records {
        for entry in &record.history {
            let date = entry.reviewed_at.date_naive();
            if date < from || date > to {
                continue;
            }
            let idx = (date - from).num_days() as usize;
            days[idx].attempts += 1;
            if entry.outcome == Outcome::Correct {
                days[idx].correct += 1;
            }
        }
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReviewEntry;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record_with(reps: u32, lapses: u32, attempts: usize) -> MasteryRecord {
        let today = date(2024, 6, 1);
        let mut record = MasteryRecord::new(1, today);
        record.repetition_count = reps;
        record.lapse_count = lapses;
        for i in 0..attempts {
            record.history.push(ReviewEntry {
                reviewed_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
                    + chrono::Duration::hours(i as i64),
                outcome: Outcome::Correct,
                latency_seconds: Some(2.0),
            });
        }
        record
    }

    #[test]
    fn test_tier_classification() {
        assert_eq!(tier_for(&record_with(0, 0, 0)), MasteryTier::New);
        assert_eq!(tier_for(&record_with(0, 1, 1)), MasteryTier::Learning);
        assert_eq!(tier_for(&record_with(2, 0, 2)), MasteryTier::Learning);
        assert_eq!(tier_for(&record_with(3, 0, 3)), MasteryTier::Young);
        assert_eq!(tier_for(&record_with(5, 2, 8)), MasteryTier::Young);
        assert_eq!(tier_for(&record_with(6, 0, 6)), MasteryTier::Mature);
        assert_eq!(
            tier_for(&record_with(6, 9, 20)),
            MasteryTier::Young,
            "lapse-heavy songs do not count as mature"
        );
    }

    #[test]
    fn test_distribution_on_empty_library_is_zeroed() {
        let dist = mastery_distribution(&[]);
        assert_eq!(dist, MasteryDistribution::default());
        assert_eq!(dist.total(), 0);
    }

    #[test]
    fn test_distribution_counts_every_record_once() {
        let records = vec![
            record_with(0, 0, 0),
            record_with(1, 0, 1),
            record_with(4, 0, 4),
            record_with(7, 0, 7),
            record_with(7, 1, 9),
        ];
        let dist = mastery_distribution(&records);
        assert_eq!(dist.new, 1);
        assert_eq!(dist.learning, 1);
        assert_eq!(dist.young, 1);
        assert_eq!(dist.mature, 2);
        assert_eq!(dist.total(), records.len());
    }

    #[test]
    fn test_practice_history_empty_library() {
        let days = practice_history(&[], date(2024, 5, 1), date(2024, 5, 3));
        assert_eq!(days.len(), 3);
        assert!(days.iter().all(|d| d.attempts == 0 && d.correct == 0));
        assert_eq!(days[0].correct_ratio(), 0.0);
    }

    #[test]
    fn test_practice_history_groups_by_day() {
        let mut record = MasteryRecord::new(1, date(2024, 5, 1));
        for (day, hour, outcome) in [
            (1, 9, Outcome::Correct),
            (1, 18, Outcome::Incorrect),
            (3, 12, Outcome::Correct),
        ] {
            record.history.push(ReviewEntry {
                reviewed_at: Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap(),
                outcome,
                latency_seconds: None,
            });
        }

        let days = practice_history(&[record], date(2024, 5, 1), date(2024, 5, 3));
        assert_eq!(days.len(), 3);
        assert_eq!((days[0].attempts, days[0].correct), (2, 1));
        assert_eq!((days[1].attempts, days[1].correct), (0, 0));
        assert_eq!((days[2].attempts, days[2].correct), (1, 1));
        assert!((days[0].correct_ratio() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_practice_history_clips_to_range() {
        let mut record = MasteryRecord::new(1, date(2024, 5, 1));
        for day in [1u32, 10, 20] {
            record.history.push(ReviewEntry {
                reviewed_at: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
                outcome: Outcome::Correct,
                latency_seconds: Some(1.0),
            });
        }
        let days = practice_history(&[record], date(2024, 5, 9), date(2024, 5, 11));
        let total: usize = days.iter().map(|d| d.attempts).sum();
        assert_eq!(total, 1, "entries outside the range are ignored");
    }

    #[test]
    fn test_practice_history_inverted_range_is_empty() {
        let days = practice_history(&[], date(2024, 5, 10), date(2024, 5, 1));
        assert!(days.is_empty());
    }
}
