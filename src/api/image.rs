//! DeepAI text-to-image client.
//!
//! One request per generation: the prompt goes up as multipart form data and
//! the result comes back as a URL. Failure bodies have no fixed shape, so
//! error extraction probes a few known layouts before falling back to the
//! raw status line.

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ApiError;

/// Message shown when the DeepAI credential is not configured.
pub const DEEPAI_KEY_MISSING: &str =
    "DeepAI API key is not configured. Set the DEEPAI_API_KEY environment variable.";

/// A successfully generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// URL where the rendered image can be fetched.
    pub output_url: String,
}

/// Client for the text-to-image endpoint.
pub struct ImageClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ImageClient {
    /// Build a client from configuration.
    ///
    /// Fails with [`ApiError::Configuration`] when no credential is
    /// configured; there is no fallback value.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let api_key = config
            .deepai_api_key
            .clone()
            .ok_or_else(|| ApiError::Configuration(DEEPAI_KEY_MISSING.to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.image_endpoint.clone(),
            api_key,
        })
    }

    /// Submit a prompt and wait for the generated image URL.
    ///
    /// Blank prompts fail with [`ApiError::Validation`] before any network
    /// call. A 200 response without an `output_url` field still fails, so a
    /// degraded success never reaches the coordinator as a result.
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ApiError> {
        if prompt.trim().is_empty() {
            return Err(ApiError::Validation("Prompt cannot be empty.".to_string()));
        }

        debug!(endpoint = %self.endpoint, "submitting image prompt");

        let form = reqwest::multipart::Form::new().text("text", prompt.to_string());

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Remote(format!("DeepAI API error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let mut message = format!(
                "DeepAI API error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string();

            // The error body shape varies; keep whatever parses.
            if let Ok(body) = response.json::<serde_json::Value>().await {
                if let Some(detail) = error_detail(&body) {
                    message = format!("{message} - {detail}");
                }
            }
            warn!(status = status.as_u16(), %message, "image request failed");
            return Err(ApiError::Remote(message));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            ApiError::Remote(format!("DeepAI API returned a malformed response: {e}"))
        })?;

        match body.get("output_url").and_then(|v| v.as_str()) {
            Some(url) if !url.is_empty() => Ok(GeneratedImage {
                output_url: url.to_string(),
            }),
            _ => Err(ApiError::Remote(
                "DeepAI API did not return an output URL.".to_string(),
            )),
        }
    }
}

/// Extract the richest error description a failure body offers.
///
/// Checks, in order: an `err` field, a raw string body, a `message` field,
/// and finally the full serialized body.
fn error_detail(body: &serde_json::Value) -> Option<String> {
    if let Some(err) = body.get("err") {
        return Some(match err.as_str() {
            Some(s) => s.to_string(),
            None => err.to_string(),
        });
    }
    if let Some(s) = body.as_str() {
        return Some(s.to_string());
    }
    if let Some(message) = body.get("message").and_then(|v| v.as_str()) {
        return Some(message.to_string());
    }
    if body.is_null() {
        return None;
    }
    Some(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_without_key_is_configuration_error() {
        let result = ImageClient::new(&Config::default());
        assert_eq!(
            result.err(),
            Some(ApiError::Configuration(DEEPAI_KEY_MISSING.to_string()))
        );
    }

    #[tokio::test]
    async fn test_generate_blank_prompt_is_validation_error() {
        let client =
            ImageClient::new(&Config::default().with_deepai_api_key("key")).expect("client");
        let result = client.generate("  \t ").await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_error_detail_prefers_err_field() {
        let body = json!({ "err": "Invalid api key", "message": "ignored" });
        assert_eq!(error_detail(&body), Some("Invalid api key".to_string()));
    }

    #[test]
    fn test_error_detail_raw_string_body() {
        let body = json!("quota exceeded");
        assert_eq!(error_detail(&body), Some("quota exceeded".to_string()));
    }

    #[test]
    fn test_error_detail_message_field() {
        let body = json!({ "message": "try later" });
        assert_eq!(error_detail(&body), Some("try later".to_string()));
    }

    #[test]
    fn test_error_detail_falls_back_to_serialized_body() {
        let body = json!({ "unexpected": true });
        assert_eq!(error_detail(&body), Some(r#"{"unexpected":true}"#.to_string()));
    }

    #[test]
    fn test_error_detail_non_string_err_is_serialized() {
        let body = json!({ "err": { "code": 401 } });
        assert_eq!(error_detail(&body), Some(r#"{"code":401}"#.to_string()));
    }
}
