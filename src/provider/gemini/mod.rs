//! Google Gemini `generateContent` adapter.

mod error;
mod provider;
mod request;
mod response;
mod types;

pub use provider::{DEFAULT_CHAT_MODEL, DEFAULT_VISION_MODEL, GeminiAdapter, SUPPORTED_MODELS};
