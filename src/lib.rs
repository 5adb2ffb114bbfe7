//! Provider-agnostic LLM gateway for MCP clients.
//!
//! A [`GatewayRequest`] names a client token (`MCP_CLIENT_GEMINI`, `MCP_CLIENT_OPENAI`,
//! `MCP_CLIENT_AZURE_AI`) and a loose `client_details` map. The matching adapter
//! resolves defaults, builds the provider payload, performs one POST and answers with a
//! [`ResultEnvelope`], whether the call succeeded or not.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod provider;
pub mod resolve;
pub mod types;

pub use client::LlmGateway;
pub use config::{GatewayConfig, build_gateway_from_config};
pub use error::{GatewayError, TransportError};
pub use provider::{DynAdapter, LlmAdapter};
pub use types::*;
