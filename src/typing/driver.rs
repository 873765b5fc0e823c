use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, info, instrument};

use super::scoring::{score, TestResult};
use super::session::{KeyEvent, Mode, SessionSnapshot, SessionState, TestConfig, Transition, TypingSession};

/// Published once per test when it reaches `Finished`.
#[derive(Debug, Clone)]
pub struct FinishedTest {
    pub snapshot: SessionSnapshot,
    pub result: TestResult,
}

struct DriverState {
    session: TypingSession,
    /// Bumped whenever the session is replaced so stale ticks can be dropped
    generation: u64,
    countdown: Option<JoinHandle<()>>,
    focused: bool,
}

impl DriverState {
    fn cancel_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
            debug!(generation = self.generation, "Countdown cancelled");
        }
    }
}

/// Runs a [`TypingSession`] against the wall clock.
///
/// Keystrokes go through [`SessionDriver::handle`]; the countdown for timed
/// tests runs as a background task that is cancelled on every path out of
/// `Running`. Finished tests are published on a broadcast channel so scoring
/// uploads never sit on the keystroke path.
#[derive(Clone)]
pub struct SessionDriver {
    inner: Arc<Mutex<DriverState>>,
    finished_tx: broadcast::Sender<FinishedTest>,
    epoch: (DateTime<Utc>, Instant),
}

impl SessionDriver {
    pub fn new(session: TypingSession) -> Self {
        let (finished_tx, _) = broadcast::channel(16);

        Self {
            inner: Arc::new(Mutex::new(DriverState {
                session,
                generation: 0,
                countdown: None,
                focused: true,
            })),
            finished_tx,
            epoch: (Utc::now(), Instant::now()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FinishedTest> {
        self.finished_tx.subscribe()
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.epoch.1.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.epoch.0 + elapsed
    }

    #[instrument(skip(self))]
    pub async fn handle(&self, event: KeyEvent) -> Transition {
        let mut state = self.inner.lock().await;

        if !state.focused {
            debug!("Input dropped while unfocused");
            return Transition::Ignored;
        }

        let transition = state.session.apply(event, self.now());
        self.react(&mut state, transition);
        transition
    }

    /// Switches mode or target. Always starts a fresh test.
    #[instrument(skip(self))]
    pub async fn change_config(&self, config: TestConfig) {
        let mut state = self.inner.lock().await;
        state.cancel_countdown();
        state.generation += 1;
        state.session.restart_with(config);
        info!(mode = %config.mode, target = config.target, "Test config changed");
    }

    pub async fn set_focused(&self, focused: bool) {
        self.inner.lock().await.focused = focused;
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.session.state()
    }

    pub async fn config(&self) -> TestConfig {
        self.inner.lock().await.session.config()
    }

    pub async fn seconds_remaining(&self) -> u32 {
        self.inner.lock().await.session.seconds_remaining(self.now())
    }

    /// Clone of the current session, for rendering.
    pub async fn session(&self) -> TypingSession {
        self.inner.lock().await.session.clone()
    }

    fn react(&self, state: &mut DriverState, transition: Transition) {
        match transition {
            Transition::Started if state.session.config().mode == Mode::Time => {
                state.cancel_countdown();
                state.countdown = Some(self.spawn_countdown(state.generation));
            }
            Transition::Finished => {
                state.cancel_countdown();
                self.publish(&state.session);
            }
            Transition::Restarted => {
                state.cancel_countdown();
                state.generation += 1;
            }
            _ => {}
        }
    }

    fn publish(&self, session: &TypingSession) {
        if let Some(snapshot) = session.snapshot() {
            let result = score(&snapshot);
            info!(
                wpm = result.wpm,
                raw_wpm = result.raw_wpm,
                accuracy = result.accuracy,
                "Test finished"
            );
            // No subscribers is fine
            let _ = self.finished_tx.send(FinishedTest { snapshot, result });
        }
    }

    fn spawn_countdown(&self, generation: u64) -> JoinHandle<()> {
        let driver = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let mut state = driver.inner.lock().await;
                if state.generation != generation {
                    debug!(generation, "Stale countdown stopped");
                    break;
                }

                let transition = state.session.apply(KeyEvent::Tick, driver.now());
                if transition == Transition::Finished {
                    // Dropping our own handle detaches it; this task ends below
                    state.countdown = None;
                    driver.publish(&state.session);
                    break;
                }
            }
        })
    }
}
