use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumString};

use super::keymap::KeyMapper;
use super::words::WordPool;

/// Words generated up front for a timed test.
pub const TIME_MODE_INITIAL_WORDS: usize = 50;
/// A timed test is topped up once fewer than this many words remain.
pub const REFILL_LOW_WATER: usize = 20;
pub const REFILL_BATCH: usize = 50;

/// How a test ends: after a fixed duration or after a fixed number of words.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Time,
    Words,
}

/// Mode plus its target: seconds for `Time`, word count for `Words`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestConfig {
    pub mode: Mode,
    pub target: u32,
}

impl TestConfig {
    pub fn time(seconds: u32) -> Self {
        Self {
            mode: Mode::Time,
            target: seconds,
        }
    }

    pub fn words(count: u32) -> Self {
        Self {
            mode: Mode::Words,
            target: count,
        }
    }

    fn initial_word_count(&self) -> usize {
        match self.mode {
            Mode::Time => TIME_MODE_INITIAL_WORDS,
            Mode::Words => (self.target as usize).max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterStatus {
    /// Not attempted yet
    #[serde(rename = "none")]
    Untyped,
    Correct,
    Incorrect,
    /// Typed past the end of the word
    Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letter {
    pub ch: char,
    pub status: LetterStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    original: Vec<char>,
    letters: Vec<Letter>,
    typed: Vec<char>,
}

impl Word {
    pub fn new(text: &str) -> Self {
        let original: Vec<char> = text.chars().collect();
        let letters = original
            .iter()
            .map(|&ch| Letter {
                ch,
                status: LetterStatus::Untyped,
            })
            .collect();

        Self {
            original,
            letters,
            typed: Vec::new(),
        }
    }

    pub fn original(&self) -> String {
        self.original.iter().collect()
    }

    pub fn letters(&self) -> &[Letter] {
        &self.letters
    }

    pub fn typed(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn typed_len(&self) -> usize {
        self.typed.len()
    }

    pub fn is_untouched(&self) -> bool {
        self.typed.is_empty()
    }

    pub fn matches_original(&self) -> bool {
        self.typed == self.original
    }

    pub fn count(&self, status: LetterStatus) -> usize {
        self.letters.iter().filter(|l| l.status == status).count()
    }

    fn push(&mut self, ch: char) -> LetterStatus {
        let index = self.typed.len();
        let status = match self.original.get(index) {
            Some(&expected) => {
                let status = if expected == ch {
                    LetterStatus::Correct
                } else {
                    LetterStatus::Incorrect
                };
                self.letters[index].status = status;
                status
            }
            None => {
                self.letters.push(Letter {
                    ch,
                    status: LetterStatus::Extra,
                });
                LetterStatus::Extra
            }
        };

        self.typed.push(ch);
        status
    }

    fn pop(&mut self) -> bool {
        let typed_before = self.typed.len();
        if typed_before == 0 {
            return false;
        }

        self.typed.pop();
        if typed_before > self.original.len() {
            self.letters.pop();
        } else {
            self.letters[typed_before - 1].status = LetterStatus::Untyped;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

/// Input delivered to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Char(char),
    Space,
    Backspace,
    Tab,
    /// Once-per-second countdown tick
    Tick,
}

impl KeyEvent {
    /// Translates a browser-style key name. Keys that are neither a single
    /// character nor one of the control keys the trainer reacts to yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Tab" => Some(KeyEvent::Tab),
            "Backspace" => Some(KeyEvent::Backspace),
            " " | "Space" => Some(KeyEvent::Space),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Some(KeyEvent::Char(ch)),
                    _ => None,
                }
            }
        }
    }
}

/// What an event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ignored,
    /// First printable key: `Idle -> Running`
    Started,
    Typed(LetterStatus),
    Backspaced,
    WordCommitted { refilled: bool },
    Ticked { seconds_remaining: u32 },
    Finished,
    Restarted,
}

/// Data the scoring engine needs from a finished test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Words up to and including the cursor word
    pub words: Vec<Word>,
    pub word_cursor: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub config: TestConfig,
}

/// One typing test. Owned by whoever drives it; every change goes through
/// [`TypingSession::apply`].
#[derive(Clone)]
pub struct TypingSession {
    config: TestConfig,
    words: Vec<Word>,
    word_cursor: usize,
    letter_cursor: usize,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    state: SessionState,
    pool: Arc<WordPool>,
    mapper: Arc<dyn KeyMapper>,
}

impl TypingSession {
    pub fn new(config: TestConfig, pool: Arc<WordPool>, mapper: Arc<dyn KeyMapper>) -> Self {
        let words = pool.sample(config.initial_word_count());
        Self::with_words(config, words, pool, mapper)
    }

    /// Starts a session over a fixed word list instead of a fresh sample.
    pub fn with_words(
        config: TestConfig,
        words: Vec<String>,
        pool: Arc<WordPool>,
        mapper: Arc<dyn KeyMapper>,
    ) -> Self {
        Self {
            config,
            words: words.iter().map(|w| Word::new(w)).collect(),
            word_cursor: 0,
            letter_cursor: 0,
            started_at: None,
            ended_at: None,
            state: SessionState::Idle,
            pool,
            mapper,
        }
    }

    /// Applies one event at time `now` and reports the resulting transition.
    pub fn apply(&mut self, event: KeyEvent, now: DateTime<Utc>) -> Transition {
        if event == KeyEvent::Tab {
            self.restart();
            return Transition::Restarted;
        }

        if self.state == SessionState::Finished {
            return Transition::Ignored;
        }

        match event {
            KeyEvent::Char(' ') | KeyEvent::Space => self.commit_word(now),
            KeyEvent::Char(ch) => self.type_char(ch, now),
            KeyEvent::Backspace => self.backspace(),
            KeyEvent::Tick => self.tick(now),
            KeyEvent::Tab => Transition::Restarted,
        }
    }

    /// Replaces this test with a fresh one under the same config.
    pub fn restart(&mut self) {
        self.restart_with(self.config);
    }

    /// Replaces this test with a fresh one under `config`.
    pub fn restart_with(&mut self, config: TestConfig) {
        let pool = Arc::clone(&self.pool);
        let mapper = Arc::clone(&self.mapper);
        *self = Self::new(config, pool, mapper);
    }

    fn type_char(&mut self, ch: char, now: DateTime<Utc>) -> Transition {
        if self.word_cursor >= self.words.len() {
            return Transition::Ignored;
        }

        let started = self.state == SessionState::Idle;
        if started {
            self.started_at = Some(now);
            self.state = SessionState::Running;
        }

        let mapped = self.mapper.map(ch);
        let is_last = self.is_last_word();
        let word = &mut self.words[self.word_cursor];
        let status = word.push(mapped);
        let completed_last = is_last && word.matches_original();
        self.letter_cursor += 1;

        if self.config.mode == Mode::Words && completed_last {
            self.finish(now);
            return Transition::Finished;
        }

        if started {
            Transition::Started
        } else {
            Transition::Typed(status)
        }
    }

    fn backspace(&mut self) -> Transition {
        match self.words.get_mut(self.word_cursor).map(Word::pop) {
            Some(true) => {
                self.letter_cursor -= 1;
                Transition::Backspaced
            }
            _ => Transition::Ignored,
        }
    }

    fn commit_word(&mut self, now: DateTime<Utc>) -> Transition {
        match self.words.get(self.word_cursor) {
            Some(word) if !word.is_untouched() => {}
            _ => return Transition::Ignored,
        }

        if self.config.mode == Mode::Words && self.is_last_word() {
            self.finish(now);
            return Transition::Finished;
        }

        self.word_cursor += 1;
        self.letter_cursor = 0;

        let refilled = self.config.mode == Mode::Time && self.refill();
        Transition::WordCommitted { refilled }
    }

    fn tick(&mut self, now: DateTime<Utc>) -> Transition {
        if self.config.mode != Mode::Time || self.state != SessionState::Running {
            return Transition::Ignored;
        }

        match self.seconds_remaining(now) {
            0 => {
                self.finish(now);
                Transition::Finished
            }
            seconds_remaining => Transition::Ticked { seconds_remaining },
        }
    }

    fn refill(&mut self) -> bool {
        let remaining = self.words.len().saturating_sub(self.word_cursor);
        if remaining >= REFILL_LOW_WATER {
            return false;
        }

        self.words
            .extend(self.pool.sample(REFILL_BATCH).iter().map(|w| Word::new(w)));
        true
    }

    fn finish(&mut self, now: DateTime<Utc>) {
        self.state = SessionState::Finished;
        self.ended_at = Some(now);
    }

    /// In words mode the configured target ends the test even when the word
    /// list is longer.
    fn is_last_word(&self) -> bool {
        let last = match self.config.mode {
            Mode::Words => (self.config.target as usize).min(self.words.len()),
            Mode::Time => self.words.len(),
        };
        self.word_cursor + 1 >= last
    }

    /// Whole seconds left in a timed test; the full target before the first
    /// keystroke. Always 0 in words mode and once finished.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> u32 {
        if self.config.mode != Mode::Time {
            return 0;
        }

        match (self.state, self.started_at) {
            (SessionState::Idle, _) | (_, None) => self.config.target,
            (SessionState::Finished, _) => 0,
            (SessionState::Running, Some(started_at)) => {
                let elapsed_ms = (now - started_at).num_milliseconds().max(0) as u64;
                let target_ms = u64::from(self.config.target) * 1000;
                let left_ms = target_ms.saturating_sub(elapsed_ms);
                left_ms.div_ceil(1000) as u32
            }
        }
    }

    /// Returns the data for scoring once the test is finished.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        if self.state != SessionState::Finished {
            return None;
        }

        let upto = (self.word_cursor + 1).min(self.words.len());
        Some(SessionSnapshot {
            words: self.words[..upto].to_vec(),
            word_cursor: self.word_cursor,
            started_at: self.started_at?,
            ended_at: self.ended_at?,
            config: self.config,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    pub fn config(&self) -> TestConfig {
        self.config
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn current_word(&self) -> Option<&Word> {
        self.words.get(self.word_cursor)
    }

    pub fn word_cursor(&self) -> usize {
        self.word_cursor
    }

    pub fn letter_cursor(&self) -> usize {
        self.letter_cursor
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }
}
