use serde::{Deserialize, Serialize};

use super::session::{LetterStatus, Mode, SessionSnapshot};

/// Characters per standardized word.
const CHARS_PER_WORD: f64 = 5.0;

/// Letter tallies over the words a test reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterCounts {
    pub correct: usize,
    pub incorrect: usize,
    pub extra: usize,
    /// Untyped letters of words that were committed before being finished
    pub missed: usize,
    /// One per committed word boundary
    pub spaces: usize,
}

impl LetterCounts {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let mut counts = LetterCounts {
            spaces: snapshot.word_cursor,
            ..Default::default()
        };

        for (index, word) in snapshot.words.iter().enumerate() {
            if index > snapshot.word_cursor {
                break;
            }
            counts.correct += word.count(LetterStatus::Correct);
            counts.incorrect += word.count(LetterStatus::Incorrect);
            counts.extra += word.count(LetterStatus::Extra);
            if index < snapshot.word_cursor {
                counts.missed += word.count(LetterStatus::Untyped);
            }
        }

        counts
    }

    pub fn total_possible(&self) -> usize {
        self.correct + self.incorrect + self.extra + self.missed + self.spaces
    }
}

/// Final statistics for one test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
}

/// Test length in minutes. Timed tests use the configured duration since the
/// timer is what ended them.
pub fn duration_minutes(snapshot: &SessionSnapshot) -> f64 {
    let seconds = match snapshot.config.mode {
        Mode::Time => f64::from(snapshot.config.target),
        Mode::Words => {
            (snapshot.ended_at - snapshot.started_at).num_milliseconds() as f64 / 1000.0
        }
    };
    seconds / 60.0
}

fn per_minute(chars: usize, minutes: f64) -> u32 {
    if minutes <= 0.0 {
        return 0;
    }
    (chars as f64 / CHARS_PER_WORD / minutes).round() as u32
}

pub fn score(snapshot: &SessionSnapshot) -> TestResult {
    let counts = LetterCounts::from_snapshot(snapshot);
    score_counts(&counts, duration_minutes(snapshot))
}

pub fn score_counts(counts: &LetterCounts, minutes: f64) -> TestResult {
    let typed_correctly = counts.correct + counts.spaces;
    let typed_total = counts.correct + counts.incorrect + counts.extra + counts.spaces;
    let total_possible = counts.total_possible();

    let accuracy = if total_possible > 0 {
        (typed_correctly as f64 / total_possible as f64 * 100.0).round() as u32
    } else {
        0
    };

    TestResult {
        wpm: per_minute(typed_correctly, minutes),
        raw_wpm: per_minute(typed_total, minutes),
        accuracy,
    }
}
