use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::types::ErrorBody;

/// Message carried by every transport failure envelope.
const TRANSPORT_FAILURE_MESSAGE: &str = "API request failed";

/// Failure raised while talking to an upstream provider.
///
/// Network failures, timeouts and non-2xx responses all fold into this one shape. The
/// status code and body are only present when a response was actually received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}: {error}")]
pub struct TransportError {
    /// Human-readable summary.
    pub message: String,
    /// Text of the underlying failure.
    pub error: String,
    /// HTTP status, when the provider answered.
    pub status_code: Option<u16>,
    /// Raw response body, when the provider answered.
    pub response: Option<String>,
}

impl TransportError {
    /// Builds a failure that happened before any response existed.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_llm_gateway::error::TransportError;
    ///
    /// let err = TransportError::network("connection refused");
    /// assert_eq!(err.status_code, None);
    /// assert_eq!(err.response, None);
    /// ```
    pub fn network<T: Into<String>>(error: T) -> Self {
        Self {
            message: TRANSPORT_FAILURE_MESSAGE.to_string(),
            error: error.into(),
            status_code: None,
            response: None,
        }
    }

    /// Builds a failure for a response that came back with a non-success status.
    pub fn status<T: Into<String>>(status: u16, body: impl Into<String>, error: T) -> Self {
        Self {
            message: TRANSPORT_FAILURE_MESSAGE.to_string(),
            error: error.into(),
            status_code: Some(status),
            response: Some(body.into()),
        }
    }
}

/// Every failure an adapter invocation can end with.
///
/// Request-time variants are converted into an error envelope at the adapter boundary
/// and never surface as a Rust error to callers of [`crate::LlmGateway::dispatch`].
/// [`GatewayError::InvalidConfig`] only appears while building adapters.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request names a different client than the adapter it reached.
    #[error("invalid client selection: expected {expected}, received {received:?}")]
    SelectionMismatch {
        /// Identity token(s) the adapter or registry accepts.
        expected: String,
        /// Value sent by the caller, absent when the key was missing.
        received: Option<String>,
    },
    /// No API key was supplied.
    #[error("API key required: {field}")]
    MissingCredential { field: &'static str },
    /// Neither a system prompt nor user input was supplied.
    #[error("either prompt or input must be provided")]
    MissingContent,
    /// The selected model is not in the adapter's allow-list.
    #[error("unsupported model: {received}")]
    UnsupportedModel {
        received: String,
        valid_models: Vec<String>,
    },
    /// Network, timeout or HTTP status failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Anything else that went wrong while handling the request.
    #[error("internal fault ({kind}): {message}")]
    Internal {
        /// Classification of the fault, e.g. `ParseError` or `Panic`.
        kind: String,
        message: String,
    },
    /// Raised when building adapters from configuration fails.
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl GatewayError {
    /// Creates an [`GatewayError::Internal`] with the given classification.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_llm_gateway::error::GatewayError;
    ///
    /// let err = GatewayError::internal("ParseError", "missing field `content`");
    /// assert!(matches!(err, GatewayError::Internal { .. }));
    /// ```
    pub fn internal<K: Into<String>, M: Into<String>>(kind: K, message: M) -> Self {
        Self::Internal {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Creates an [`GatewayError::InvalidConfig`].
    pub fn invalid_config<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable snake_case discriminator, also written into the envelope as `code`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SelectionMismatch { .. } => "selection_mismatch",
            Self::MissingCredential { .. } => "missing_credential",
            Self::MissingContent => "missing_content",
            Self::UnsupportedModel { .. } => "unsupported_model",
            Self::Transport(_) => "transport_error",
            Self::Internal { .. } => "internal_fault",
            Self::InvalidConfig { .. } => "invalid_config",
        }
    }

    /// Renders the structured error object placed in a failed envelope.
    pub fn to_error_body(&self) -> ErrorBody {
        let mut context = Map::new();
        let message = match self {
            Self::SelectionMismatch { expected, received } => {
                context.insert("expected".into(), json!(expected));
                context.insert("received".into(), json!(received));
                context.insert(
                    "solution".into(),
                    json!(format!("Set selected_client to '{expected}'")),
                );
                "Invalid client selection".to_string()
            }
            Self::MissingCredential { field } => {
                context.insert("field".into(), json!(field));
                context.insert("location".into(), json!("client_details"));
                "API key required".to_string()
            }
            Self::MissingContent => {
                context.insert("fields".into(), json!(["prompt", "input"]));
                context.insert("location".into(), json!("client_details"));
                "Either prompt or input must be provided".to_string()
            }
            Self::UnsupportedModel {
                received,
                valid_models,
            } => {
                context.insert("received".into(), json!(received));
                context.insert("valid_models".into(), json!(valid_models));
                "Unsupported model".to_string()
            }
            Self::Transport(err) => {
                context.insert("error".into(), json!(err.error));
                context.insert("status_code".into(), json!(err.status_code));
                context.insert("response".into(), json!(err.response));
                err.message.clone()
            }
            Self::Internal { kind, message } => {
                context.insert("error".into(), json!(message));
                context.insert("type".into(), json!(kind));
                "Unexpected processing error".to_string()
            }
            Self::InvalidConfig { field, reason } => {
                context.insert("field".into(), json!(field));
                context.insert("error".into(), Value::String(reason.clone()));
                "Invalid configuration".to_string()
            }
        };

        ErrorBody {
            message,
            code: self.code().to_string(),
            context,
        }
    }
}
