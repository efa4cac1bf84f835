//! Chat session controller
//!
//! A [`ChatSession`] owns the transcript, the pending and error flags, and the
//! input buffer. Submitting is split in two so a UI can keep rendering while
//! the request is in flight: [`ChatSession::begin`] records the user message
//! and hands back an [`Exchange`], and [`ChatSession::complete`] applies the
//! result once the request finishes. [`ChatSession::submit`] runs both halves
//! in one call.

use chrono::Timelike;

use crate::ai::{ClientError, InferenceClient};
use crate::format::Formatter;
use crate::state::{clock_time, now_hhmm, ChatMessage, Sender};

/// Shown when a request fails for any reason.
pub const RESPONSE_ERROR: &str = "Error fetching GPT response";

/// A submission whose request has not finished yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Raw, unformatted user text. This is what goes over the wire.
    pub prompt: String,
    /// Time recorded when the submission started. The reply reuses it.
    pub time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Pending,
    Error,
}

/// How a completed exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Answered,
    Failed,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    pending: bool,
    last_error: Option<String>,
    input: String,
    formatter: Formatter,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formatter(formatter: Formatter) -> Self {
        Self {
            formatter,
            ..Self::default()
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn status(&self) -> Status {
        if self.pending {
            Status::Pending
        } else if self.last_error.is_some() {
            Status::Error
        } else {
            Status::Idle
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn formatter(&self) -> Formatter {
        self.formatter
    }

    /// Start a submission stamped with the local wall clock.
    pub fn begin(&mut self, raw: &str) -> Option<Exchange> {
        self.begin_with_time(raw, now_hhmm())
    }

    /// Start a submission stamped with `at`.
    pub fn begin_at<T: Timelike>(&mut self, raw: &str, at: &T) -> Option<Exchange> {
        self.begin_with_time(raw, clock_time(at))
    }

    fn begin_with_time(&mut self, raw: &str, time: String) -> Option<Exchange> {
        if raw.trim().is_empty() {
            return None;
        }

        self.transcript.push(ChatMessage {
            text: self.formatter.format(raw),
            time: time.clone(),
            sender: Sender::User,
        });
        self.pending = true;
        self.last_error = None;

        tracing::debug!(%time, transcript_len = self.transcript.len(), "submission started");

        Some(Exchange {
            prompt: raw.to_string(),
            time,
        })
    }

    /// Apply the result of the request started by `exchange`.
    pub fn complete(&mut self, exchange: Exchange, result: Result<String, ClientError>) -> Outcome {
        let outcome = match result {
            Ok(response) => {
                self.transcript.push(ChatMessage {
                    text: self.formatter.format(&response),
                    time: exchange.time,
                    sender: Sender::Assistant,
                });
                Outcome::Answered
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch lifGPT response");
                self.last_error = Some(RESPONSE_ERROR.to_string());
                Outcome::Failed
            }
        };

        self.pending = false;
        self.input.clear();
        outcome
    }

    /// Submit `raw` and wait for the reply.
    ///
    /// Returns `None` when `raw` is blank and nothing was sent.
    pub async fn submit<C>(&mut self, client: &C, raw: &str) -> Option<Outcome>
    where
        C: InferenceClient + ?Sized,
    {
        let exchange = self.begin(raw)?;
        let result = client.ask(&exchange.prompt).await;
        Some(self.complete(exchange, result))
    }
}
