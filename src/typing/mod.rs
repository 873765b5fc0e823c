// Client-side typing test: key mapping, word generation, the session state
// machine and scoring. Nothing here touches the network.

pub mod driver;
pub mod keymap;
pub mod scoring;
pub mod session;
pub mod words;

pub use driver::{FinishedTest, SessionDriver};
pub use keymap::{IdentityKeyMapper, KeyMapper, PhoneticKeyMapper};
pub use scoring::{score, LetterCounts, TestResult};
pub use session::{
    KeyEvent, Letter, LetterStatus, Mode, SessionSnapshot, SessionState, TestConfig, Transition,
    TypingSession, Word,
};
pub use words::{WordPool, WordPoolError};
