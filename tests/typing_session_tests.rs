use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use thaana_typer::{
    client::{BoardView, LeaderboardBoard, ScoreSubmission},
    typing::{
        score, KeyEvent, LetterCounts, PhoneticKeyMapper, SessionDriver, SessionState,
        Transition,
    },
    TestConfig, TypingSession, WordPool,
};

mod utils;

use utils::*;

fn phonetic_session(config: TestConfig, words: &[&str]) -> TypingSession {
    TypingSession::with_words(
        config,
        words.iter().map(|w| w.to_string()).collect(),
        Arc::new(WordPool::builtin()),
        Arc::new(PhoneticKeyMapper::new()),
    )
}

#[test]
fn test_phonetic_words_test_scores_thaana_example() {
    let mut session = phonetic_session(TestConfig::words(2), &["ހިތް", "ވަށް"]);
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

    let events = keys("hitq vaSq");
    let (last, rest) = events.split_last().unwrap();
    for event in rest {
        session.apply(*event, start);
    }
    assert_eq!(session.state(), SessionState::Running);

    // Matching the last word finishes without a trailing space
    let transition = session.apply(*last, start + Duration::seconds(6));
    assert_eq!(transition, Transition::Finished);

    let snapshot = session.snapshot().unwrap();
    let counts = LetterCounts::from_snapshot(&snapshot);
    assert_eq!(counts.correct, 8);
    assert_eq!(counts.spaces, 1);

    let result = score(&snapshot);
    assert_eq!(result.wpm, 18);
    assert_eq!(result.raw_wpm, 18);
    assert_eq!(result.accuracy, 100);
}

#[test]
fn test_corrected_typo_leaves_no_error() {
    let mut session = phonetic_session(TestConfig::words(1), &["ހިތް"]);
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

    for event in keys("hiv") {
        session.apply(event, start);
    }
    assert_eq!(session.apply(KeyEvent::Backspace, start), Transition::Backspaced);
    for event in keys("t") {
        session.apply(event, start);
    }
    let transition = session.apply(KeyEvent::Char('q'), start + Duration::seconds(3));
    assert_eq!(transition, Transition::Finished);

    let counts = LetterCounts::from_snapshot(&session.snapshot().unwrap());
    assert_eq!(counts.correct, 4);
    assert_eq!(counts.incorrect, 0);
    assert_eq!(score(&session.snapshot().unwrap()).accuracy, 100);
}

#[test]
fn test_events_after_finish_are_ignored_until_tab() {
    let mut session = phonetic_session(TestConfig::words(1), &["ގެ"]);
    let now = Utc::now();

    for event in keys("ge") {
        session.apply(event, now);
    }
    assert!(session.is_finished());
    assert_eq!(session.apply(KeyEvent::Char('h'), now), Transition::Ignored);
    assert_eq!(session.apply(KeyEvent::Backspace, now), Transition::Ignored);

    assert_eq!(session.apply(KeyEvent::Tab, now), Transition::Restarted);
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.snapshot().is_none());
}

#[tokio::test]
async fn test_finished_test_is_saved_to_leaderboard() {
    let server = TestServerBuilder::new().build().await;
    let client = server.session_client().await;

    let words = ["ހިތް", "ވަށް"].repeat(5);
    let driver = SessionDriver::new(phonetic_session(TestConfig::words(10), &words));
    let mut finished = driver.subscribe();

    let input = vec!["hitq vaSq"; 5].join(" ");
    for event in keys(&input) {
        driver.handle(event).await;
    }
    assert_eq!(driver.state().await, SessionState::Finished);

    let test = finished.recv().await.unwrap();
    assert_eq!(test.snapshot.config, TestConfig::words(10));
    assert_eq!(test.result.accuracy, 100);

    let mut submission = ScoreSubmission::new(test.result, test.snapshot.config);
    let id = submission.save(&client, "ޢާއިޝާ", None).await.unwrap();
    assert!(submission.has_saved());

    let mut board = LeaderboardBoard::new(TestConfig::words(10));
    match board.refresh(&client).await {
        BoardView::Ready(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].id, id);
            assert_eq!(entries[0].name, "ޢާއިޝާ");
            assert_eq!(entries[0].wpm, test.result.wpm);
            assert_eq!(entries[0].accuracy, 100);
        }
        other => panic!("expected a loaded board, got {other:?}"),
    }
}
