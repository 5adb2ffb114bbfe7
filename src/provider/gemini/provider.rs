use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::config::ClientConfig;
use crate::error::GatewayError;
use crate::http::{DEFAULT_TIMEOUT, DynHttpTransport, decode_json_success, post_json_with_headers};
use crate::provider::LlmAdapter;
use crate::resolve::{ModelPolicy, resolve_request};
use crate::types::{ClientKind, GatewayRequest, SuccessPayload};

use super::error::describe_gemini_error;
use super::request::build_gemini_body;
use super::response::normalize_response;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_VISION_MODEL: &str = "gemini-1.5-pro-vision";
pub const SUPPORTED_MODELS: [&str; 3] = ["gemini-1.5-flash", "gemini-1.5-pro", "gemini-1.5-pro-vision"];

/// Google Gemini `generateContent` adapter, answering to `MCP_CLIENT_GEMINI`.
pub struct GeminiAdapter {
    pub(crate) transport: DynHttpTransport,
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) policy: ModelPolicy,
}

impl GeminiAdapter {
    /// Creates an adapter that targets the public Generative Language endpoint.
    pub fn new(transport: DynHttpTransport) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            policy: ModelPolicy::new(
                ClientKind::Gemini,
                DEFAULT_CHAT_MODEL,
                DEFAULT_VISION_MODEL,
                &SUPPORTED_MODELS,
            ),
        }
    }

    /// Overrides the base URL, e.g. to point at a proxy or a test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the 60 second request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the model allow-list.
    pub fn with_allowed_models(mut self, models: Vec<String>) -> Self {
        self.policy = self.policy.with_allowed_models(models);
        self
    }

    /// Constructs an adapter from a [`ClientConfig`] entry.
    pub fn from_client_config(config: &ClientConfig, transport: DynHttpTransport) -> Self {
        let mut adapter = Self::new(transport);
        if let Some(base_url) = &config.base_url {
            adapter = adapter.with_base_url(base_url.clone());
        }
        if let Some(timeout) = config.timeout() {
            adapter = adapter.with_timeout(timeout);
        }
        if let Some(models) = &config.models {
            adapter = adapter.with_allowed_models(models.clone());
        }
        adapter
    }

    /// Builds the endpoint URL for a model.
    pub(crate) fn endpoint(&self, model: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let model_path = normalize_model(model);
        if base.ends_with("/v1beta") {
            format!("{base}/{model_path}:generateContent")
        } else {
            format!("{base}/v1beta/{model_path}:generateContent")
        }
    }

    fn build_headers(api_key: &str) -> HashMap<String, String> {
        HashMap::from([
            ("x-goog-api-key".to_string(), api_key.to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ])
    }
}

fn normalize_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[async_trait]
impl LlmAdapter for GeminiAdapter {
    fn name(&self) -> &'static str {
        "google_gemini"
    }

    fn policy(&self) -> &ModelPolicy {
        &self.policy
    }

    async fn complete(&self, request: &GatewayRequest) -> Result<SuccessPayload, GatewayError> {
        let resolved = resolve_request(request, &self.policy)?;
        let body = build_gemini_body(&resolved.params);
        let endpoint = self.endpoint(&resolved.model);
        debug!(adapter = self.name(), model = %resolved.model, %endpoint, "sending request");
        trace!(adapter = self.name(), payload = %body, "request payload");

        let response = post_json_with_headers(
            self.transport.as_ref(),
            endpoint,
            Self::build_headers(&resolved.params.api_key),
            &body,
            self.timeout,
        )
        .await?;
        let status = response.status;
        let raw = decode_json_success(response, describe_gemini_error)?;
        debug!(adapter = self.name(), status, "received response");
        trace!(adapter = self.name(), response = %raw, "raw response");

        Ok(normalize_response(raw))
    }
}
