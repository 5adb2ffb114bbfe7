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

use super::error::describe_openai_error;
use super::request::build_openai_body;
use super::response::normalize_response;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const SUPPORTED_MODELS: [&str; 5] = [
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
];
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";

/// Which flavour of the Chat Completions API is targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Deployment {
    /// `POST {base}/v1/chat/completions`, bearer auth, model in the body.
    OpenAi,
    /// `POST {endpoint}/openai/deployments/{model}/chat/completions`, `api-key` auth.
    Azure { api_version: String },
}

/// Chat Completions adapter serving `MCP_CLIENT_OPENAI` and `MCP_CLIENT_AZURE_AI`.
pub struct OpenAiChatAdapter {
    pub(crate) transport: DynHttpTransport,
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) policy: ModelPolicy,
    deployment: Deployment,
}

impl OpenAiChatAdapter {
    /// Adapter for the public OpenAI API.
    pub fn openai(transport: DynHttpTransport) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            policy: ModelPolicy::new(
                ClientKind::OpenAi,
                DEFAULT_CHAT_MODEL,
                DEFAULT_VISION_MODEL,
                &SUPPORTED_MODELS,
            ),
            deployment: Deployment::OpenAi,
        }
    }

    /// Adapter for an Azure OpenAI resource such as `https://name.openai.azure.com`.
    ///
    /// Model names are treated as deployment names.
    pub fn azure(transport: DynHttpTransport, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            policy: ModelPolicy::new(
                ClientKind::AzureAi,
                DEFAULT_CHAT_MODEL,
                DEFAULT_VISION_MODEL,
                &SUPPORTED_MODELS,
            ),
            deployment: Deployment::Azure {
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            },
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_allowed_models(mut self, models: Vec<String>) -> Self {
        self.policy = self.policy.with_allowed_models(models);
        self
    }

    /// Sets the Azure `api-version` query parameter; ignored for OpenAI.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        if let Deployment::Azure { api_version } = &mut self.deployment {
            *api_version = version.into();
        }
        self
    }

    /// Constructs an adapter from a [`ClientConfig`] entry.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] when an Azure entry has no `base_url` or
    /// the entry names a client this adapter does not serve.
    pub fn from_client_config(
        config: &ClientConfig,
        transport: DynHttpTransport,
    ) -> Result<Self, GatewayError> {
        let mut adapter = match config.client {
            ClientKind::OpenAi => {
                let mut adapter = Self::openai(transport);
                if let Some(base_url) = &config.base_url {
                    adapter = adapter.with_base_url(base_url.clone());
                }
                adapter
            }
            ClientKind::AzureAi => {
                let endpoint = config.base_url.clone().ok_or_else(|| {
                    GatewayError::invalid_config(
                        "base_url",
                        "MCP_CLIENT_AZURE_AI requires the resource endpoint",
                    )
                })?;
                let mut adapter = Self::azure(transport, endpoint);
                if let Some(version) = &config.api_version {
                    adapter = adapter.with_api_version(version.clone());
                }
                adapter
            }
            other => {
                return Err(GatewayError::invalid_config(
                    "client",
                    format!("{other} is not served by the chat completions adapter"),
                ));
            }
        };
        if let Some(timeout) = config.timeout() {
            adapter = adapter.with_timeout(timeout);
        }
        if let Some(models) = &config.models {
            adapter = adapter.with_allowed_models(models.clone());
        }
        Ok(adapter)
    }

    pub(crate) fn endpoint(&self, model: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        match &self.deployment {
            Deployment::OpenAi => {
                if base.ends_with("/v1") {
                    format!("{base}/chat/completions")
                } else {
                    format!("{base}/v1/chat/completions")
                }
            }
            Deployment::Azure { api_version } => format!(
                "{base}/openai/deployments/{model}/chat/completions?api-version={api_version}"
            ),
        }
    }

    fn build_headers(&self, api_key: &str) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        match self.deployment {
            Deployment::OpenAi => {
                headers.insert("Authorization".to_string(), format!("Bearer {api_key}"));
            }
            Deployment::Azure { .. } => {
                headers.insert("api-key".to_string(), api_key.to_string());
            }
        }
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers
    }
}

#[async_trait]
impl LlmAdapter for OpenAiChatAdapter {
    fn name(&self) -> &'static str {
        match self.deployment {
            Deployment::OpenAi => "openai_chat",
            Deployment::Azure { .. } => "azure_openai",
        }
    }

    fn policy(&self) -> &ModelPolicy {
        &self.policy
    }

    async fn complete(&self, request: &GatewayRequest) -> Result<SuccessPayload, GatewayError> {
        let resolved = resolve_request(request, &self.policy)?;
        let body_model = match self.deployment {
            Deployment::OpenAi => Some(resolved.model.as_str()),
            Deployment::Azure { .. } => None,
        };
        let body = build_openai_body(&resolved.params, body_model);
        let endpoint = self.endpoint(&resolved.model);
        debug!(adapter = self.name(), model = %resolved.model, %endpoint, "sending request");
        trace!(adapter = self.name(), payload = %body, "request payload");

        let response = post_json_with_headers(
            self.transport.as_ref(),
            endpoint,
            self.build_headers(&resolved.params.api_key),
            &body,
            self.timeout,
        )
        .await?;
        let status = response.status;
        let raw = decode_json_success(response, describe_openai_error)?;
        debug!(adapter = self.name(), status, "received response");
        trace!(adapter = self.name(), response = %raw, "raw response");

        Ok(normalize_response(raw))
    }
}
