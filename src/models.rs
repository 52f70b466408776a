use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker prepended to assistant messages that carry an error instead of a
/// reply, so the failure is visible inline in the log.
pub const ERROR_PREFIX: &str = "⚠ ";

/// Who produced a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A source reference attached to an assistant reply when the model used
/// external retrieval (grounding).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

impl Citation {
    /// Build a citation, falling back to the URI when no title is provided.
    pub fn new(uri: String, title: Option<String>) -> Self {
        let title = match title {
            Some(t) if !t.trim().is_empty() => t,
            _ => uri.clone(),
        };
        Self { uri, title }
    }
}

/// A single entry in the conversation log.
///
/// Immutable once created; the log is append-only and messages are never
/// edited or removed. Error replies are ordinary assistant messages whose
/// text starts with [`ERROR_PREFIX`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl ChatMessage {
    fn new(text: String, sender: Sender, citations: Vec<Citation>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            sender,
            timestamp: Utc::now(),
            citations,
        }
    }

    /// Create a message entered by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text.into(), Sender::User, Vec::new())
    }

    /// Create an assistant reply with its grounding citations.
    pub fn assistant(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self::new(text.into(), Sender::Assistant, citations)
    }

    /// Create an error-marked assistant message for a failed send.
    pub fn error_reply(message: impl AsRef<str>) -> Self {
        Self::new(
            format!("{}{}", ERROR_PREFIX, message.as_ref()),
            Sender::Assistant,
            Vec::new(),
        )
    }

    /// Whether this message records a failed send rather than a reply.
    pub fn is_error(&self) -> bool {
        self.sender == Sender::Assistant && self.text.starts_with(ERROR_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_title_falls_back_to_uri() {
        let citation = Citation::new("https://example.com/a".to_string(), None);
        assert_eq!(citation.title, "https://example.com/a");

        let citation = Citation::new("https://example.com/a".to_string(), Some("  ".to_string()));
        assert_eq!(citation.title, "https://example.com/a");

        let citation = Citation::new(
            "https://example.com/a".to_string(),
            Some("Example".to_string()),
        );
        assert_eq!(citation.title, "Example");
    }

    #[test]
    fn test_user_message() {
        let msg = ChatMessage::user("hello");
        assert_eq!(msg.sender, Sender::User);
        assert_eq!(msg.text, "hello");
        assert!(msg.citations.is_empty());
        assert!(!msg.is_error());
    }

    #[test]
    fn test_error_reply_is_marked() {
        let msg = ChatMessage::error_reply("network down");
        assert_eq!(msg.sender, Sender::Assistant);
        assert!(msg.text.starts_with(ERROR_PREFIX));
        assert!(msg.text.contains("network down"));
        assert!(msg.is_error());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = ChatMessage::user("one");
        let b = ChatMessage::user("one");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_message_serialization_round_trip() {
        let msg = ChatMessage::assistant(
            "reply",
            vec![Citation::new(
                "https://example.com".to_string(),
                Some("Example".to_string()),
            )],
        );
        let json = serde_json::to_string(&msg).expect("serialize");
        let back: ChatMessage = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(msg, back);
    }
}
