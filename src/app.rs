//! Application state and orchestration.
//!
//! `App` composes the two independent feature coordinators and the screen
//! selector. Remote calls run on spawned tasks; their outcomes come back as
//! [`AppMessage`]s over an unbounded channel and are folded into view state
//! on the event loop thread. A submission is only dispatched when the
//! feature's `begin_submit` accepts it, which is what enforces the
//! one-outstanding-request rule.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::api::{ChatSession, ImageClient};
use crate::config::Config;
use crate::state::{ChatState, ImageState};
use crate::widgets::InputBox;

/// Messages delivered from spawned remote calls back to the event loop.
#[derive(Debug, Clone)]
pub enum AppMessage {
    /// Chat reply arrived.
    ChatReply {
        text: String,
        citations: Vec<crate::models::Citation>,
    },
    /// Chat send failed.
    ChatFailed { error: String },
    /// Image generation finished with a result URL.
    ImageReady { url: String },
    /// Image generation failed.
    ImageFailed { error: String },
}

/// Which feature's view is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Chat,
    ImageGen,
}

/// Main application state.
pub struct App {
    /// Currently displayed view.
    pub screen: Screen,
    /// Chat feature state.
    pub chat: ChatState,
    /// Image feature state.
    pub image: ImageState,
    /// Input buffer for the chat view.
    pub chat_input: InputBox,
    /// Input buffer for the image view.
    pub image_input: InputBox,
    /// Scroll offset from the bottom of the chat log, in lines.
    pub chat_scroll: u16,
    /// Flag to track if the app should quit.
    pub should_quit: bool,
    /// Tick counter for animations (spinner frames).
    pub tick_count: u64,
    /// Whether the UI needs to be redrawn.
    pub needs_redraw: bool,
    /// Receiver for async messages (taken by the event loop).
    pub message_rx: Option<mpsc::UnboundedReceiver<AppMessage>>,
    /// Sender for async messages (cloned into spawned tasks).
    pub message_tx: mpsc::UnboundedSender<AppMessage>,
    /// Remote chat session; `None` exactly when chat is disabled.
    chat_session: Option<Arc<Mutex<ChatSession>>>,
    /// Remote image client; `None` exactly when image generation is disabled.
    image_client: Option<Arc<ImageClient>>,
}

impl App {
    /// Build the app from configuration.
    ///
    /// A missing credential disables the corresponding feature for the whole
    /// session instead of failing startup; the view explains what to set.
    pub fn new(config: &Config) -> Self {
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        let (chat_session, chat) = match ChatSession::initialize(config) {
            Ok(session) => (Some(Arc::new(Mutex::new(session))), ChatState::new()),
            Err(err) => {
                warn!(%err, "chat disabled");
                (None, ChatState::disabled(err.to_string()))
            }
        };

        let (image_client, image) = match ImageClient::new(config) {
            Ok(client) => (Some(Arc::new(client)), ImageState::new()),
            Err(err) => {
                warn!(%err, "image generation disabled");
                (None, ImageState::disabled(err.to_string()))
            }
        };

        Self {
            screen: Screen::default(),
            chat,
            image,
            chat_input: InputBox::new(),
            image_input: InputBox::new(),
            chat_scroll: 0,
            should_quit: false,
            tick_count: 0,
            needs_redraw: true,
            message_rx: Some(message_rx),
            message_tx,
            chat_session,
            image_client,
        }
    }

    /// Switch between the chat and image views.
    pub fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Chat => Screen::ImageGen,
            Screen::ImageGen => Screen::Chat,
        };
        self.mark_dirty();
    }

    /// Advance the animation tick.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
        if self.is_loading() {
            self.mark_dirty();
        }
    }

    /// Request a redraw on the next loop iteration.
    pub fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    /// Whether either feature has a request in flight.
    pub fn is_loading(&self) -> bool {
        self.chat.is_awaiting_reply() || self.image.is_pending()
    }

    /// Submit the current chat input, if the coordinator accepts it.
    pub fn submit_chat(&mut self) {
        let text = self.chat_input.value().to_string();
        let Some(outgoing) = self.chat.begin_submit(&text) else {
            return;
        };
        self.chat_input.clear();
        self.chat_scroll = 0;
        self.mark_dirty();

        // begin_submit only accepts while a session exists.
        let Some(session) = self.chat_session.clone() else {
            return;
        };
        info!(chars = outgoing.len(), "chat message submitted");

        let tx = self.message_tx.clone();
        tokio::spawn(async move {
            let mut session = session.lock().await;
            match session.send(&outgoing).await {
                Ok(reply) => {
                    let _ = tx.send(AppMessage::ChatReply {
                        text: reply.text,
                        citations: reply.citations,
                    });
                }
                Err(err) => {
                    let _ = tx.send(AppMessage::ChatFailed {
                        error: err.to_string(),
                    });
                }
            }
        });
    }

    /// Submit the current image prompt, if the coordinator accepts it.
    pub fn submit_image(&mut self) {
        self.image.prompt = self.image_input.value().to_string();
        let Some(prompt) = self.image.begin_submit() else {
            return;
        };
        self.mark_dirty();

        let Some(client) = self.image_client.clone() else {
            return;
        };
        info!(chars = prompt.len(), "image prompt submitted");

        let tx = self.message_tx.clone();
        tokio::spawn(async move {
            match client.generate(&prompt).await {
                Ok(image) => {
                    let _ = tx.send(AppMessage::ImageReady {
                        url: image.output_url,
                    });
                }
                Err(err) => {
                    let _ = tx.send(AppMessage::ImageFailed {
                        error: err.to_string(),
                    });
                }
            }
        });
    }

    /// Fold an async outcome into view state.
    pub fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::ChatReply { text, citations } => {
                info!(citations = citations.len(), "chat reply received");
                self.chat.apply_reply(text, citations);
                self.chat_scroll = 0;
            }
            AppMessage::ChatFailed { error } => {
                warn!(%error, "chat send failed");
                self.chat.apply_failure(error);
                self.chat_scroll = 0;
            }
            AppMessage::ImageReady { url } => {
                info!(%url, "image generated");
                self.image.apply_success(url);
            }
            AppMessage::ImageFailed { error } => {
                warn!(%error, "image generation failed");
                self.image.apply_failure(error);
            }
        }
        self.mark_dirty();
    }

    /// Scroll the chat log up (towards older messages).
    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
        self.mark_dirty();
    }

    /// Scroll the chat log down (towards the latest message).
    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.mark_dirty();
    }

    /// Open the generated image URL in the system browser.
    pub fn open_image_result(&self) {
        if let Some(url) = self.image.result_url() {
            if let Err(err) = open::that(url) {
                warn!(%err, "failed to open image URL");
            }
        }
    }

    /// Whether a chat session exists (used by tests).
    pub fn has_chat_session(&self) -> bool {
        self.chat_session.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ImageStatus;

    fn app_with_keys() -> App {
        // Local endpoints so a spawned task never reaches a real service.
        App::new(
            &Config::default()
                .with_gemini_api_key("g")
                .with_deepai_api_key("d")
                .with_gemini_base_url("http://127.0.0.1:9")
                .with_image_endpoint("http://127.0.0.1:9/text2img"),
        )
    }

    #[test]
    fn test_default_screen_is_chat() {
        let app = app_with_keys();
        assert_eq!(app.screen, Screen::Chat);
    }

    #[test]
    fn test_toggle_screen_round_trip() {
        let mut app = app_with_keys();
        app.toggle_screen();
        assert_eq!(app.screen, Screen::ImageGen);
        app.toggle_screen();
        assert_eq!(app.screen, Screen::Chat);
    }

    #[test]
    fn test_missing_credentials_disable_features() {
        let app = App::new(&Config::default());
        assert!(app.chat.is_disabled());
        assert!(app.image.is_disabled());
        assert!(!app.has_chat_session());
    }

    #[tokio::test]
    async fn test_blank_chat_input_submits_nothing() {
        let mut app = app_with_keys();
        let log_len = app.chat.messages.len();
        app.chat_input.set_value("   ");

        app.submit_chat();

        assert_eq!(app.chat.messages.len(), log_len);
        assert!(!app.chat.is_awaiting_reply());
    }

    #[tokio::test]
    async fn test_submit_clears_input_and_enters_awaiting() {
        let mut app = app_with_keys();
        app.chat_input.set_value("hello");

        app.submit_chat();

        assert!(app.chat_input.is_empty());
        assert!(app.chat.is_awaiting_reply());
        // Submitting again while awaiting leaves the input untouched.
        app.chat_input.set_value("second");
        app.submit_chat();
        assert_eq!(app.chat_input.value(), "second");
    }

    #[test]
    fn test_handle_chat_reply_appends_and_goes_idle() {
        let mut app = app_with_keys();
        app.chat.begin_submit("hi");
        let len = app.chat.messages.len();

        app.handle_message(AppMessage::ChatReply {
            text: "hello back".to_string(),
            citations: Vec::new(),
        });

        assert_eq!(app.chat.messages.len(), len + 1);
        assert!(!app.chat.is_awaiting_reply());
    }

    #[test]
    fn test_handle_chat_failure_records_error() {
        let mut app = app_with_keys();
        app.chat.begin_submit("hi");

        app.handle_message(AppMessage::ChatFailed {
            error: "boom".to_string(),
        });

        assert_eq!(app.chat.last_error.as_deref(), Some("boom"));
        assert!(app.chat.messages.last().expect("message").is_error());
    }

    #[tokio::test]
    async fn test_image_submit_flow() {
        let mut app = app_with_keys();
        app.image_input.set_value("a cat");

        app.submit_image();
        assert!(app.image.is_pending());

        app.handle_message(AppMessage::ImageReady {
            url: "http://x/y.png".to_string(),
        });
        assert_eq!(app.image.result_url(), Some("http://x/y.png"));
    }

    #[tokio::test]
    async fn test_image_failure_then_resubmit() {
        let mut app = app_with_keys();
        app.image_input.set_value("a cat");
        app.submit_image();
        app.handle_message(AppMessage::ImageFailed {
            error: "busy".to_string(),
        });
        assert_eq!(app.image.error_message(), Some("busy"));

        app.submit_image();
        assert_eq!(app.image.status, ImageStatus::Pending);
        assert!(app.image.error_message().is_none());
    }

    #[test]
    fn test_is_loading_reflects_both_features() {
        let mut app = app_with_keys();
        assert!(!app.is_loading());
        app.chat.begin_submit("hi");
        assert!(app.is_loading());
    }
}
