//! UI-agnostic chat state types
//!
//! These are shared by every front end and don't depend on any UI framework.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// A message in the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Formatted markup
    pub text: String,
    /// Wall-clock time of the submission, `HH:MM`
    pub time: String,
    pub sender: Sender,
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn display_name(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "lifGPT",
        }
    }
}

/// Zero-padded 24-hour `HH:MM` for any time-of-day value.
pub fn clock_time<T: Timelike>(t: &T) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

/// Current local time as `HH:MM`.
pub fn now_hhmm() -> String {
    clock_time(&chrono::Local::now())
}
