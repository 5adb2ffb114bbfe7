use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::{error, warn};

use crate::error::GatewayError;
use crate::resolve::ModelPolicy;
use crate::types::{ClientKind, GatewayRequest, ResultEnvelope, SuccessPayload};

pub mod gemini;
pub mod openai_chat;

/// Contract every provider adapter implements.
///
/// `complete` runs the pipeline and may fail; `process` is the boundary that callers use
/// and always answers with a [`ResultEnvelope`], including when `complete` panics.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Adapter name used in logs, such as `google_gemini`.
    fn name(&self) -> &'static str;

    /// Model defaults and allow-list.
    fn policy(&self) -> &ModelPolicy;

    /// Identity token this adapter answers to.
    fn client(&self) -> ClientKind {
        self.policy().client
    }

    /// Resolves, builds, sends and normalizes one request.
    async fn complete(&self, request: &GatewayRequest) -> Result<SuccessPayload, GatewayError>;

    /// Runs [`LlmAdapter::complete`] and folds every outcome into an envelope.
    async fn process(&self, request: &GatewayRequest) -> ResultEnvelope {
        let outcome = AssertUnwindSafe(self.complete(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(GatewayError::internal("Panic", panic_message(&*panic))));

        if let Err(err) = &outcome {
            match err {
                GatewayError::Internal { .. } => {
                    error!(adapter = self.name(), code = err.code(), error = %err, "adapter fault")
                }
                _ => warn!(adapter = self.name(), code = err.code(), error = %err, "request failed"),
            }
        }

        ResultEnvelope::from_result(outcome)
    }
}

/// Thread-safe adapter handle.
pub type DynAdapter = Arc<dyn LlmAdapter>;

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "adapter panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct PanickingAdapter {
        policy: ModelPolicy,
    }

    #[async_trait]
    impl LlmAdapter for PanickingAdapter {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn policy(&self) -> &ModelPolicy {
            &self.policy
        }

        async fn complete(
            &self,
            _request: &GatewayRequest,
        ) -> Result<SuccessPayload, GatewayError> {
            panic!("index out of bounds");
        }
    }

    #[tokio::test]
    async fn panics_become_internal_fault_envelopes() {
        let adapter = PanickingAdapter {
            policy: ModelPolicy::new(ClientKind::Gemini, "m", "m", &["m"]),
        };
        let envelope = adapter
            .process(&GatewayRequest::new(ClientKind::Gemini, json!({})))
            .await;

        assert!(!envelope.status());
        let error = envelope.error().expect("error body");
        assert_eq!(error.message, "Unexpected processing error");
        assert_eq!(error.context["type"], json!("Panic"));
        assert_eq!(error.context["error"], json!("index out of bounds"));
    }
}
