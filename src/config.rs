//! Application configuration.
//!
//! Both credentials come from the process environment at startup; neither has
//! a baked-in fallback. A missing credential does not abort the process; it
//! puts the corresponding view into a permanently-disabled mode with an
//! explanatory message. Endpoints and the chat model are overridable through
//! the builder, which the integration tests use to point the clients at a
//! local mock server.

/// Environment variable holding the Gemini API credential.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Environment variable holding the DeepAI API credential.
pub const DEEPAI_API_KEY_VAR: &str = "DEEPAI_API_KEY";

/// Default base URL for the Gemini API.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Gemini chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";

/// Default DeepAI text-to-image endpoint.
pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://api.deepai.org/api/text2img";

/// Runtime configuration for both remote clients.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API credential, if configured.
    pub gemini_api_key: Option<String>,
    /// DeepAI API credential, if configured.
    pub deepai_api_key: Option<String>,
    /// Gemini chat model identifier.
    pub chat_model: String,
    /// Base URL for the Gemini API.
    pub gemini_base_url: String,
    /// Full URL of the text-to-image endpoint.
    pub image_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            deepai_api_key: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            image_endpoint: DEFAULT_IMAGE_ENDPOINT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Empty or whitespace-only values count as missing.
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: read_env(GEMINI_API_KEY_VAR),
            deepai_api_key: read_env(DEEPAI_API_KEY_VAR),
            ..Self::default()
        }
    }

    /// Set the Gemini API credential.
    pub fn with_gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    /// Set the DeepAI API credential.
    pub fn with_deepai_api_key(mut self, key: impl Into<String>) -> Self {
        self.deepai_api_key = Some(key.into());
        self
    }

    /// Set the chat model identifier.
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    /// Override the Gemini base URL (no trailing slash).
    pub fn with_gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.gemini_base_url = url.into();
        self
    }

    /// Override the text-to-image endpoint URL.
    pub fn with_image_endpoint(mut self, url: impl Into<String>) -> Self {
        self.image_endpoint = url.into();
        self
    }
}

fn read_env(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}
