//! Grading of quiz responses.
//!
//! [`grade`] classifies a user's answer against the expected song as
//! `Correct`, `Partial`, or `Incorrect`. The classification is the sole
//! input to the scheduler; the grader itself keeps no state.
//!
//! Matching is case- and diacritic-insensitive with a configurable fuzzy
//! threshold, so "Deja Vu" passes for "Déjà Vu" and a one-letter typo in
//! a long title still counts. Both fields right is `Correct`, exactly one
//! is `Partial` (right artist, wrong title, or vice versa), neither — or
//! no response before the timeout — is `Incorrect`.

use serde::{Deserialize, Serialize};

use crate::model::{Outcome, Song};

/// Grading thresholds, from the `[grader]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraderConfig {
    /// Minimum normalized similarity (0.0-1.0) for a field to match
    pub fuzzy_threshold: f64,
    /// Responses slower than this are graded as timeouts
    pub response_timeout_seconds: f64,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.8,
            response_timeout_seconds: 30.0,
        }
    }
}

/// A user's typed answer for one round.
#[derive(Debug, Clone, Default)]
pub struct Answer {
    pub title: String,
    pub artist: String,
}

/// Classify a response against the expected song.
///
/// `response` is `None` when the round ended without an answer.
/// `latency_seconds` is the time the user took when known; an answer with
/// unknown latency is graded on content alone.
pub fn grade(
    expected: &Song,
    response: Option<&Answer>,
    latency_seconds: Option<f64>,
    config: &GraderConfig,
) -> Outcome {
    let Some(answer) = response else {
        return Outcome::Incorrect;
    };
    if latency_seconds.is_some_and(|l| l > config.response_timeout_seconds) {
        return Outcome::Incorrect;
    }

    let title_ok = fields_match(&expected.title, &answer.title, config.fuzzy_threshold);
    let artist_ok = fields_match(&expected.artist, &answer.artist, config.fuzzy_threshold);

    match (title_ok, artist_ok) {
        (true, true) => Outcome::Correct,
        (false, false) => Outcome::Incorrect,
        _ => Outcome::Partial,
    }
}

/// Whether two metadata fields match after normalization, exactly or
/// within the fuzzy threshold.
fn fields_match(expected: &str, given: &str, threshold: f64) -> bool {
    let expected = normalize(expected);
    let given = normalize(given);
    if expected.is_empty() || given.is_empty() {
        // An empty answer never matches a non-empty field.
        return false;
    }
    similarity(&expected, &given) >= threshold
}

/// Normalize for comparison: lowercase, fold diacritics, drop punctuation,
/// collapse whitespace.
fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    let mut push = |out: &mut String, pending_space: &mut bool, c: char| {
        if c.is_alphanumeric() {
            if *pending_space && !out.is_empty() {
                out.push(' ');
            }
            *pending_space = false;
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() {
            *pending_space = true;
        }
        // Punctuation is dropped entirely.
    };

    for c in s.chars() {
        let mapped = fold_char(c);
        if mapped.is_empty() {
            push(&mut out, &mut pending_space, c);
        } else {
            for &f in mapped {
                push(&mut out, &mut pending_space, f);
            }
        }
    }
    out
}

/// Map accented Latin characters onto their base letters.
///
/// Covers the Latin-1 and Latin Extended-A ranges that show up in song
/// metadata; returns an empty slice for characters without a mapping.
fn fold_char(c: char) -> &'static [char] {
    match c {
        'à'..='å' | 'À'..='Å' | 'ā' | 'ă' | 'ą' | 'Ā' | 'Ă' | 'Ą' => &['a'],
        'è'..='ë' | 'È'..='Ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => &['e'],
        'ì'..='ï' | 'Ì'..='Ï' | 'ī' | 'ĭ' | 'į' | 'ı' => &['i'],
        'ò'..='ö' | 'Ò'..='Ö' | 'ø' | 'Ø' | 'ō' | 'ŏ' | 'ő' => &['o'],
        'ù'..='ü' | 'Ù'..='Ü' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => &['u'],
        'ý' | 'ÿ' | 'Ý' => &['y'],
        'ñ' | 'Ñ' | 'ń' | 'ņ' | 'ň' => &['n'],
        'ç' | 'Ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => &['c'],
        'ś' | 'ŝ' | 'ş' | 'š' => &['s'],
        'ź' | 'ż' | 'ž' => &['z'],
        'ł' | 'Ł' => &['l'],
        'ð' => &['d'],
        'ß' => &['s', 's'],
        'æ' | 'Æ' => &['a', 'e'],
        'œ' | 'Œ' => &['o', 'e'],
        _ => &[],
    }
}

/// Normalized similarity in 0.0-1.0 (1.0 = identical).
fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let len = a.chars().count().max(b.chars().count());
    if len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / len as f64
}

/// Standard two-row Levenshtein distance over chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
