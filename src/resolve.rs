//! Parameter resolution: turns a loosely-typed [`GatewayRequest`] into a fully-defaulted
//! [`RequestParameters`] and runs the validation gates in a fixed order.

use serde_json::Value;
use tracing::debug;

use crate::error::GatewayError;
use crate::types::{
    ClientDetails, ClientKind, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOOL_CHOICE,
    GatewayRequest, RequestParameters,
};

/// Per-adapter model defaults and allow-list. Read-only once the adapter is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPolicy {
    pub client: ClientKind,
    pub default_chat_model: String,
    pub default_vision_model: String,
    pub allowed_models: Vec<String>,
}

impl ModelPolicy {
    pub fn new(
        client: ClientKind,
        default_chat_model: impl Into<String>,
        default_vision_model: impl Into<String>,
        allowed_models: &[&str],
    ) -> Self {
        Self {
            client,
            default_chat_model: default_chat_model.into(),
            default_vision_model: default_vision_model.into(),
            allowed_models: allowed_models.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Replaces the allow-list, e.g. with Azure deployment names from configuration.
    pub fn with_allowed_models(mut self, models: Vec<String>) -> Self {
        self.allowed_models = models;
        self
    }

    fn allows(&self, model: &str) -> bool {
        self.allowed_models.iter().any(|allowed| allowed == model)
    }
}

/// Output of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub params: RequestParameters,
    /// Chat or vision model, depending on `input_type`.
    pub model: String,
}

/// Validates a request for the adapter described by `policy`.
///
/// Gates run in order and the first failure wins: client selection, API key, prompt/input
/// presence, model allow-list. The key and content gates read the raw `client_details`,
/// so they hold even when another field is mistyped.
///
/// # Errors
///
/// Returns the [`GatewayError`] of the first failing gate, or an internal `ParseError`
/// when `client_details` passes the key and content gates but cannot be decoded.
pub fn resolve_request(
    request: &GatewayRequest,
    policy: &ModelPolicy,
) -> Result<Resolved, GatewayError> {
    let expected = policy.client.token();
    if request.selected_client.as_deref() != Some(expected) {
        return Err(GatewayError::SelectionMismatch {
            expected: expected.to_string(),
            received: request.selected_client.clone(),
        });
    }

    let raw = &request.client_details;
    if raw_text(raw, "api_key").is_empty() {
        return Err(GatewayError::MissingCredential { field: "api_key" });
    }
    if raw_text(raw, "prompt").is_empty() && raw_text(raw, "input").is_empty() {
        return Err(GatewayError::MissingContent);
    }

    let details: ClientDetails = serde_json::from_value(raw.clone())
        .map_err(|err| GatewayError::internal("ParseError", err.to_string()))?;
    let params = apply_defaults(details, policy);

    debug!(
        client = %policy.client,
        input_type = ?params.input_type,
        history = params.chat_history.len(),
        tools = params.tools.len(),
        images = params.images_arr.len(),
        temperature = params.temperature,
        max_tokens = params.max_tokens,
        "resolved request parameters"
    );
    if params.is_stream {
        debug!(client = %policy.client, "is_stream requested; responses are returned whole");
    }
    if !params.speech_model.is_empty() {
        debug!(client = %policy.client, speech_model = %params.speech_model, "speech_model is not used");
    }

    let model = params.selected_model().to_string();
    if !policy.allows(&model) {
        return Err(GatewayError::UnsupportedModel {
            received: model,
            valid_models: policy.allowed_models.clone(),
        });
    }

    Ok(Resolved { params, model })
}

/// String value of `key`; absent, `null` and non-string values count as empty.
fn raw_text<'a>(details: &'a Value, key: &str) -> &'a str {
    details.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Fills every absent field with its documented default.
pub fn apply_defaults(details: ClientDetails, policy: &ModelPolicy) -> RequestParameters {
    RequestParameters {
        input: details.input.unwrap_or_default(),
        images_arr: details.images_arr.unwrap_or_default(),
        input_type: details.input_type.unwrap_or_default(),
        is_stream: details.is_stream.unwrap_or(false),
        prompt: details.prompt.unwrap_or_default(),
        api_key: details.api_key.unwrap_or_default(),
        chat_model: details
            .chat_model
            .unwrap_or_else(|| policy.default_chat_model.clone()),
        vision_model: details
            .vision_model
            .unwrap_or_else(|| policy.default_vision_model.clone()),
        speech_model: details.speech_model.unwrap_or_default(),
        chat_history: details.chat_history.unwrap_or_default(),
        tools: details.tools.unwrap_or_default(),
        temperature: details.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        max_tokens: details.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        forced_tool_calls: details.forced_tool_calls,
        tool_choice: details
            .tool_choice
            .unwrap_or_else(|| Value::from(DEFAULT_TOOL_CHOICE)),
    }
}
