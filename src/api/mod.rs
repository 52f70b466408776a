//! HTTP clients for the two remote services.
//!
//! One client per service, each a thin wrapper over a reusable
//! `reqwest::Client`. Neither retries; failures are translated into the
//! [`ApiError`](crate::error::ApiError) taxonomy and surfaced to the
//! coordinators.

pub mod chat;
pub mod image;

pub use chat::{ChatReply, ChatSession};
pub use image::{GeneratedImage, ImageClient};
