//! UI-agnostic conversation state
//!
//! These types are shared by every front end (the terminal client, tests,
//! anything else that renders a conversation) and don't depend on any UI
//! framework.

use serde::{Deserialize, Serialize};

/// Who wrote a message in the conversation log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

/// A single entry in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    sender: Sender,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Agent,
            text: text.into(),
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Lifecycle of the single request a session may have in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Failed,
}

/// In-memory conversation for one visit. Never persisted.
///
/// The log is append-only: entries are never removed or reordered once
/// pushed. Mutation is crate-private so only the coordinator can change it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    messages: Vec<Message>,
    state: RequestState,
    last_outcome: Option<RequestState>,
    last_reply: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// `Fulfilled` or `Failed` for the most recently settled request
    pub fn last_outcome(&self) -> Option<RequestState> {
        self.last_outcome
    }

    /// Reply text of the most recent request, if it was fulfilled with the
    /// reply field present. Fallback and error texts never land here.
    pub fn last_reply(&self) -> Option<&str> {
        self.last_reply.as_deref()
    }

    /// Text of the newest agent message, if any
    pub fn last_agent_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Agent)
            .map(|m| m.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn set_last_reply(&mut self, reply: Option<String>) {
        self.last_reply = reply;
    }

    pub(crate) fn set_state(&mut self, state: RequestState) {
        tracing::debug!(from = ?self.state, to = ?state, "request state transition");
        if matches!(state, RequestState::Fulfilled | RequestState::Failed) {
            self.last_outcome = Some(state);
        }
        self.state = state;
    }
}
