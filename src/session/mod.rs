//! In-memory chat session state
//!
//! A [`Session`] is the local representation of one widget instance: the
//! remote thread id (once created), the ordered message transcript shown to
//! the user, and transient UI state. Sessions live for the lifetime of the
//! widget and are never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a transcript message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The visitor typing into the widget
    User,

    /// The remote assistant (including synthetic error replies)
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

/// One immutable entry in the session transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Sender of the message
    pub sender: Sender,

    /// Message text
    pub text: String,
}

impl Message {
    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
        }
    }
}

/// Local state for one chat widget instance.
///
/// The transcript is append-only: messages are never edited or removed, and
/// ordering is insertion order. `thread_id` starts empty and is set exactly
/// once, on the first successful thread creation; every later turn reuses it.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Remote thread id, absent until the first turn creates one
    pub thread_id: Option<String>,

    /// Ordered transcript
    log: Vec<Message>,

    /// True while a turn is in flight; submissions are rejected meanwhile
    pub busy: bool,

    /// Pending input buffer owned by the presentation layer
    #[serde(skip)]
    input: String,
}

impl Session {
    /// Create a session seeded with the assistant greeting.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            thread_id: None,
            log: vec![Message::assistant(greeting)],
            busy: false,
            input: String::new(),
        }
    }

    /// Append a message to the transcript.
    pub fn push(&mut self, message: Message) {
        self.log.push(message);
    }

    /// The full transcript, oldest first.
    pub fn log(&self) -> &[Message] {
        &self.log
    }

    /// The most recent transcript entry, if any.
    pub fn last(&self) -> Option<&Message> {
        self.log.last()
    }

    /// Replace the pending input buffer.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Take and clear the pending input buffer.
    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }
}
