//! View state for the two features.
//!
//! Each feature owns an independent state machine with no shared data; they
//! compose only at the screen-selection layer. The transition methods here
//! are pure (no I/O), so every guard and ordering rule is testable without a
//! network. [`crate::app::App`] drives them: a `begin_submit` that returns
//! `Some` is the only path that dispatches a remote call.

use crate::models::{ChatMessage, Citation};

/// Greeting seeded into an enabled chat log.
pub const CHAT_GREETING: &str =
    "Hello! I'm your Gemini assistant, ready to chat. How can I assist you today?";

/// Fallback reply text when the API returns success with no text.
pub const EMPTY_REPLY_FALLBACK: &str = "Sorry, I couldn't generate a response.";

/// Where the chat coordinator is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatPhase {
    #[default]
    Idle,
    AwaitingReply,
}

/// Chat view state: the append-only message log plus request bookkeeping.
#[derive(Debug, Default)]
pub struct ChatState {
    /// Ordered conversation log; append-only, never reordered.
    pub messages: Vec<ChatMessage>,
    /// Current position in the submit/reply cycle.
    pub phase: ChatPhase,
    /// Error from the most recent failed send, cleared on resubmit.
    pub last_error: Option<String>,
    /// When set, the feature is permanently disabled for this session and
    /// the view shows this message instead of the log.
    pub disabled_reason: Option<String>,
}

impl ChatState {
    /// Create an enabled chat state seeded with the assistant greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(CHAT_GREETING, Vec::new())],
            ..Self::default()
        }
    }

    /// Create a permanently-disabled chat state (missing credential).
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            disabled_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_reason.is_some()
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.phase == ChatPhase::AwaitingReply
    }

    /// Try to start a send.
    ///
    /// Refused (returning `None`, with no state change at all) when the text
    /// is blank, a reply is still outstanding, or the feature is disabled.
    /// On acceptance the user message is appended optimistically, the last
    /// error is cleared, and the text to send is returned.
    pub fn begin_submit(&mut self, text: &str) -> Option<String> {
        if text.trim().is_empty() || self.is_awaiting_reply() || self.is_disabled() {
            return None;
        }
        self.messages.push(ChatMessage::user(text));
        self.last_error = None;
        self.phase = ChatPhase::AwaitingReply;
        Some(text.to_string())
    }

    /// Apply a successful reply: append the assistant message and go idle.
    pub fn apply_reply(&mut self, text: String, citations: Vec<Citation>) {
        let text = if text.trim().is_empty() {
            EMPTY_REPLY_FALLBACK.to_string()
        } else {
            text
        };
        self.messages.push(ChatMessage::assistant(text, citations));
        self.phase = ChatPhase::Idle;
    }

    /// Apply a failed send: record the error, append an error-marked reply
    /// so the failure is visible inline, and go idle.
    pub fn apply_failure(&mut self, message: String) {
        self.messages.push(ChatMessage::error_reply(&message));
        self.last_error = Some(message);
        self.phase = ChatPhase::Idle;
    }
}

/// Status of the single in-flight image generation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageStatus {
    #[default]
    Idle,
    Pending,
    Success {
        url: String,
    },
    Failed {
        message: String,
    },
}

/// Image view state, keyed by the current prompt text.
///
/// Fully replaced on each submission; a stale result URL and an error never
/// coexist.
#[derive(Debug, Default)]
pub struct ImageState {
    /// Prompt text being edited/submitted.
    pub prompt: String,
    /// State of the current (or last) generation.
    pub status: ImageStatus,
    /// When set, the feature is permanently disabled for this session.
    pub disabled_reason: Option<String>,
}

impl ImageState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a permanently-disabled image state (missing credential).
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            disabled_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_reason.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.status == ImageStatus::Pending
    }

    /// Try to start a generation for the current prompt.
    ///
    /// Refused when the prompt is blank, one is already pending, or the
    /// feature is disabled. On acceptance any previous result or error is
    /// cleared and the prompt to submit is returned.
    pub fn begin_submit(&mut self) -> Option<String> {
        if self.prompt.trim().is_empty() || self.is_pending() || self.is_disabled() {
            return None;
        }
        self.status = ImageStatus::Pending;
        Some(self.prompt.clone())
    }

    pub fn apply_success(&mut self, url: String) {
        self.status = ImageStatus::Success { url };
    }

    pub fn apply_failure(&mut self, message: String) {
        self.status = ImageStatus::Failed { message };
    }

    /// The result URL, if the last generation succeeded.
    pub fn result_url(&self) -> Option<&str> {
        match &self.status {
            ImageStatus::Success { url } => Some(url),
            _ => None,
        }
    }

    /// The error message, if the last generation failed.
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            ImageStatus::Failed { message } => Some(message),
            _ => None,
        }
    }
}
