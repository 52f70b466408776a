//! Gemini chat client.
//!
//! Wraps one remote conversation behind a session handle. The REST API is
//! stateless, so the session carries the running turn history and replays it
//! with every request; the coordinator never sees that detail. Replies expose
//! the model text plus any grounding citations.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::Citation;

/// Message shown when the Gemini credential is not configured.
pub const GEMINI_KEY_MISSING: &str =
    "Gemini API key is not configured. Set the GEMINI_API_KEY environment variable.";

/// Message shown when the remote service rejects the credential.
pub const GEMINI_KEY_INVALID: &str =
    "Gemini API key is invalid. Please check the configuration.";

// Wire types for the generateContent endpoint.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn new(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// A successful chat exchange: the reply text and its grounding citations.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Handle to one ongoing remote conversation.
///
/// Created once by the chat coordinator and owned explicitly; there is no
/// process-wide instance. Turn history only grows on successful exchanges,
/// so a failed send leaves the remote conversation untouched.
pub struct ChatSession {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    history: Vec<Content>,
}

impl ChatSession {
    /// Open a session against the configured model.
    ///
    /// Fails with [`ApiError::Configuration`] when no credential is
    /// configured; nothing is sent over the network here.
    pub fn initialize(config: &Config) -> Result<Self, ApiError> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or_else(|| ApiError::Configuration(GEMINI_KEY_MISSING.to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.gemini_base_url.clone(),
            model: config.chat_model.clone(),
            api_key,
            history: Vec::new(),
        })
    }

    /// The model this session talks to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of turns (user and model) recorded so far.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Send one user message and wait for the reply.
    ///
    /// Blank input fails with [`ApiError::Validation`] before any network
    /// call. Remote failures are classified into [`ApiError::Auth`] or
    /// [`ApiError::Remote`]; no retry is performed.
    pub async fn send(&mut self, message: &str) -> Result<ChatReply, ApiError> {
        if message.trim().is_empty() {
            return Err(ApiError::Validation("Message cannot be empty.".to_string()));
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let mut contents = self.history.clone();
        contents.push(Content::new("user", message));

        debug!(model = %self.model, turns = contents.len(), "sending chat message");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest {
                contents: &contents,
            })
            .send()
            .await
            .map_err(|e| ApiError::Remote(format!("Gemini API error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let detail = extract_error_message(&body).unwrap_or(body);
            warn!(status, %detail, "chat request failed");
            return Err(classify_send_failure(status, &detail));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Remote(format!("Gemini API returned a malformed response: {e}")))?;

        let candidate = body.candidates.into_iter().next();
        let text = candidate
            .as_ref()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let citations = candidate
            .and_then(|c| c.grounding_metadata)
            .map(|m| collect_citations(m.grounding_chunks))
            .unwrap_or_default();

        // Record the exchange so the next request carries full context.
        self.history.push(Content::new("user", message));
        self.history.push(Content::new("model", &text));

        Ok(ChatReply { text, citations })
    }
}

/// Classify a failed send into the error taxonomy.
///
/// The remote API reports an invalid credential only through the failure
/// detail text, so this is the one place allowed to sniff it; everything
/// else becomes a remote error carrying the reported message.
fn classify_send_failure(status: u16, detail: &str) -> ApiError {
    if detail.contains("API key not valid") {
        ApiError::Auth(GEMINI_KEY_INVALID.to_string())
    } else if detail.trim().is_empty() {
        ApiError::Remote(format!("Gemini API error: HTTP {status}"))
    } else {
        ApiError::Remote(format!("Gemini API error: {detail}"))
    }
}

/// Pull the `error.message` field out of an error body, if it parses.
fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
}

/// Map grounding chunks to citations, dropping entries without a usable URI.
fn collect_citations(chunks: Vec<GroundingChunk>) -> Vec<Citation> {
    chunks
        .into_iter()
        .filter_map(|chunk| chunk.web)
        .filter_map(|web| {
            let uri = web.uri?;
            if uri.trim().is_empty() {
                return None;
            }
            Some(Citation::new(uri, web.title))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> Config {
        Config::default().with_gemini_api_key("test-key")
    }

    #[test]
    fn test_initialize_without_key_is_configuration_error() {
        let result = ChatSession::initialize(&Config::default());
        assert_eq!(
            result.err(),
            Some(ApiError::Configuration(GEMINI_KEY_MISSING.to_string()))
        );
    }

    #[test]
    fn test_initialize_with_key_succeeds() {
        let session = ChatSession::initialize(&config_with_key()).expect("session");
        assert_eq!(session.model(), crate::config::DEFAULT_CHAT_MODEL);
        assert_eq!(session.history_len(), 0);
    }

    #[tokio::test]
    async fn test_send_blank_message_is_validation_error() {
        let mut session = ChatSession::initialize(&config_with_key()).expect("session");
        let result = session.send("   \n").await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert_eq!(session.history_len(), 0);
    }

    #[test]
    fn test_classify_auth_failure_by_detail_substring() {
        let err = classify_send_failure(400, "API key not valid. Please pass a valid API key.");
        assert_eq!(err, ApiError::Auth(GEMINI_KEY_INVALID.to_string()));
    }

    #[test]
    fn test_classify_other_failures_as_remote() {
        let err = classify_send_failure(429, "Resource has been exhausted");
        assert_eq!(
            err,
            ApiError::Remote("Gemini API error: Resource has been exhausted".to_string())
        );

        let err = classify_send_failure(503, "");
        assert_eq!(err, ApiError::Remote("Gemini API error: HTTP 503".to_string()));
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error":{"code":400,"message":"boom","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(extract_error_message(body), Some("boom".to_string()));
        assert_eq!(extract_error_message("not json"), None);
        assert_eq!(extract_error_message("{}"), None);
    }

    #[test]
    fn test_collect_citations_drops_chunks_without_uri() {
        let chunks = vec![
            GroundingChunk {
                web: Some(WebSource {
                    uri: Some("https://example.com/a".to_string()),
                    title: Some("A".to_string()),
                }),
            },
            GroundingChunk {
                web: Some(WebSource {
                    uri: None,
                    title: Some("no uri".to_string()),
                }),
            },
            GroundingChunk { web: None },
            GroundingChunk {
                web: Some(WebSource {
                    uri: Some("https://example.com/b".to_string()),
                    title: None,
                }),
            },
        ];

        let citations = collect_citations(chunks);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].title, "A");
        // Title falls back to the URI when absent.
        assert_eq!(citations[1].title, "https://example.com/b");
    }
}
