//! Tool-calling orchestration loop

mod sanitize;
mod session;

pub use sanitize::sanitize;
pub use session::{ChatSession, SessionSettings, TurnOutcome, TurnState};
