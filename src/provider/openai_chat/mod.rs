//! OpenAI Chat Completions adapter, also used for Azure OpenAI deployments.

mod error;
mod provider;
mod request;
mod response;
mod types;

pub use provider::{
    DEFAULT_AZURE_API_VERSION, DEFAULT_CHAT_MODEL, DEFAULT_VISION_MODEL, OpenAiChatAdapter,
    SUPPORTED_MODELS,
};
