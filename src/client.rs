use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::provider::DynAdapter;
use crate::types::{ClientKind, GatewayRequest, ResultEnvelope};

/// Gateway entry point: routes each request to the adapter registered for its
/// `selected_client`.
pub struct LlmGateway {
    adapters: HashMap<ClientKind, DynAdapter>,
}

impl LlmGateway {
    /// Creates a builder for registering adapters.
    pub fn builder() -> LlmGatewayBuilder {
        LlmGatewayBuilder {
            adapters: HashMap::new(),
        }
    }

    /// Processes a request and always answers with an envelope.
    ///
    /// A missing or unregistered `selected_client` yields a SelectionMismatch whose
    /// `expected` lists the registered tokens.
    pub async fn dispatch(&self, request: &GatewayRequest) -> ResultEnvelope {
        match self.adapter_for(request) {
            Ok(adapter) => {
                debug!(adapter = adapter.name(), client = %adapter.client(), "dispatching request");
                adapter.process(request).await
            }
            Err(err) => {
                warn!(code = err.code(), error = %err, "no adapter for request");
                ResultEnvelope::failure(&err)
            }
        }
    }

    /// Registered clients in a stable order.
    pub fn clients(&self) -> Vec<ClientKind> {
        ClientKind::ALL
            .into_iter()
            .filter(|kind| self.adapters.contains_key(kind))
            .collect()
    }

    /// Returns the adapter registered for `client`, if any.
    pub fn adapter(&self, client: ClientKind) -> Option<DynAdapter> {
        self.adapters.get(&client).cloned()
    }

    fn adapter_for(&self, request: &GatewayRequest) -> Result<DynAdapter, GatewayError> {
        request
            .selected_client
            .as_deref()
            .and_then(ClientKind::from_token)
            .and_then(|kind| self.adapter(kind))
            .ok_or_else(|| GatewayError::SelectionMismatch {
                expected: self
                    .clients()
                    .iter()
                    .map(|kind| kind.token())
                    .collect::<Vec<_>>()
                    .join(", "),
                received: request.selected_client.clone(),
            })
    }
}

/// Builder collecting adapters by the client they answer to.
pub struct LlmGatewayBuilder {
    adapters: HashMap<ClientKind, DynAdapter>,
}

impl LlmGatewayBuilder {
    /// Registers an adapter under [`LlmAdapter::client`](crate::provider::LlmAdapter::client).
    /// A later registration for the same client replaces the earlier one.
    pub fn register(mut self, adapter: DynAdapter) -> Self {
        self.adapters.insert(adapter.client(), adapter);
        self
    }

    pub fn build(self) -> LlmGateway {
        LlmGateway {
            adapters: self.adapters,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::provider::LlmAdapter;
    use crate::resolve::{ModelPolicy, resolve_request};
    use crate::types::{SuccessPayload, Usage};

    /// Adapter that answers with its own name after resolving the request.
    struct EchoAdapter {
        name: &'static str,
        policy: ModelPolicy,
    }

    impl EchoAdapter {
        fn new(name: &'static str, client: ClientKind) -> DynAdapter {
            Arc::new(Self {
                name,
                policy: ModelPolicy::new(client, "chat", "vision", &["chat", "vision"]),
            })
        }
    }

    #[async_trait]
    impl LlmAdapter for EchoAdapter {
        fn name(&self) -> &'static str {
            self.name
        }

        fn policy(&self) -> &ModelPolicy {
            &self.policy
        }

        async fn complete(
            &self,
            request: &GatewayRequest,
        ) -> Result<SuccessPayload, GatewayError> {
            resolve_request(request, &self.policy)?;
            Ok(SuccessPayload::single_call(
                json!({}),
                Usage::default(),
                self.name.to_string(),
                Vec::new(),
            ))
        }
    }

    fn gateway() -> LlmGateway {
        LlmGateway::builder()
            .register(EchoAdapter::new("gemini", ClientKind::Gemini))
            .register(EchoAdapter::new("openai", ClientKind::OpenAi))
            .build()
    }

    #[tokio::test]
    async fn dispatch_routes_by_selected_client() {
        let gateway = gateway();
        let details = json!({ "api_key": "k", "input": "hi" });

        let envelope = gateway
            .dispatch(&GatewayRequest::new(ClientKind::OpenAi, details.clone()))
            .await;
        assert_eq!(envelope.data().expect("data").messages, vec!["openai".to_string()]);

        let envelope = gateway
            .dispatch(&GatewayRequest::new(ClientKind::Gemini, details))
            .await;
        assert_eq!(envelope.data().expect("data").messages, vec!["gemini".to_string()]);
    }

    #[tokio::test]
    async fn unregistered_client_is_a_selection_mismatch() {
        let gateway = gateway();
        let envelope = gateway
            .dispatch(&GatewayRequest::new(
                ClientKind::AzureAi,
                json!({ "api_key": "k", "input": "hi" }),
            ))
            .await;

        assert!(!envelope.status());
        let error = envelope.error().expect("error");
        assert_eq!(error.message, "Invalid client selection");
        assert_eq!(
            error.context["expected"],
            json!("MCP_CLIENT_OPENAI, MCP_CLIENT_GEMINI")
        );
        assert_eq!(error.context["received"], json!("MCP_CLIENT_AZURE_AI"));
    }

    #[tokio::test]
    async fn unknown_or_missing_token_is_a_selection_mismatch() {
        let gateway = gateway();
        for selected in [Some("MCP_CLIENT_CLAUDE".to_string()), None] {
            let request = GatewayRequest {
                selected_client: selected.clone(),
                client_details: json!({ "api_key": "k", "input": "hi" }),
            };
            let envelope = gateway.dispatch(&request).await;
            let error = envelope.error().expect("error");
            assert_eq!(error.code, "selection_mismatch");
            assert_eq!(error.context["received"], json!(selected));
        }
    }

    #[test]
    fn clients_lists_registered_kinds_in_stable_order() {
        let gateway = gateway();
        assert_eq!(gateway.clients(), vec![ClientKind::OpenAi, ClientKind::Gemini]);
        assert!(gateway.adapter(ClientKind::AzureAi).is_none());
    }

    #[test]
    fn later_registration_replaces_earlier_one() {
        let gateway = LlmGateway::builder()
            .register(EchoAdapter::new("first", ClientKind::Gemini))
            .register(EchoAdapter::new("second", ClientKind::Gemini))
            .build();
        let adapter = gateway.adapter(ClientKind::Gemini).expect("adapter");
        assert_eq!(adapter.name(), "second");
    }
}
