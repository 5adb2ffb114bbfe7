use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::LlmGateway;
use crate::error::GatewayError;
use crate::http::DynHttpTransport;
use crate::provider::DynAdapter;
use crate::provider::gemini::GeminiAdapter;
use crate::provider::openai_chat::OpenAiChatAdapter;
use crate::types::ClientKind;

/// Gateway configuration: which clients to register and which tool servers are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
    /// Tool-server launch descriptors. Carried as data, never spawned by this crate.
    #[serde(default)]
    pub servers: Vec<ServerLaunchConfig>,
}

/// Settings for one registered client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client: ClientKind,
    /// Base URL override; required for `MCP_CLIENT_AZURE_AI` (the resource endpoint).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Azure `api-version`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Replaces the adapter's model allow-list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
}

/// How to launch a tool server: program, arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerLaunchConfig {
    pub server_name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Entry with stock settings for `client`.
    pub fn new(client: ClientKind) -> Self {
        Self {
            client,
            base_url: None,
            timeout_secs: None,
            api_version: None,
            models: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            clients: vec![
                ClientConfig::new(ClientKind::OpenAi),
                ClientConfig::new(ClientKind::Gemini),
            ],
            servers: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] when the text is not a valid configuration.
    pub fn from_json_str(text: &str) -> Result<Self, GatewayError> {
        serde_json::from_str(text)
            .map_err(|err| GatewayError::invalid_config("config", err.to_string()))
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] when the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            GatewayError::invalid_config("path", format!("{}: {err}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Looks up a tool-server descriptor by `server_name`.
    pub fn server(&self, name: &str) -> Option<&ServerLaunchConfig> {
        self.servers.iter().find(|server| server.server_name == name)
    }
}

/// Builds an [`LlmGateway`] with one adapter per configured client.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidConfig`] when a client entry cannot be turned into an
/// adapter, for example Azure without an endpoint.
pub fn build_gateway_from_config(
    config: &GatewayConfig,
    transport: DynHttpTransport,
) -> Result<LlmGateway, GatewayError> {
    let mut builder = LlmGateway::builder();

    for client in &config.clients {
        let adapter = build_adapter_from_config(client, transport.clone())?;
        debug!(client = %client.client, adapter = adapter.name(), "registered adapter");
        builder = builder.register(adapter);
    }

    Ok(builder.build())
}

fn build_adapter_from_config(
    config: &ClientConfig,
    transport: DynHttpTransport,
) -> Result<DynAdapter, GatewayError> {
    let adapter: DynAdapter = match config.client {
        ClientKind::Gemini => Arc::new(GeminiAdapter::from_client_config(config, transport)),
        ClientKind::OpenAi | ClientKind::AzureAi => {
            Arc::new(OpenAiChatAdapter::from_client_config(config, transport)?)
        }
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::reqwest::default_dyn_transport;

    #[test]
    fn default_config_registers_gemini_and_openai() {
        let transport = default_dyn_transport().expect("transport");
        let gateway = build_gateway_from_config(&GatewayConfig::default(), transport)
            .expect("gateway");
        assert_eq!(gateway.clients(), vec![ClientKind::OpenAi, ClientKind::Gemini]);
    }

    #[test]
    fn parses_clients_and_servers_from_json() {
        let config = GatewayConfig::from_json_str(
            r#"{
                "clients": [
                    { "client": "MCP_CLIENT_GEMINI", "timeout_secs": 30 },
                    {
                        "client": "MCP_CLIENT_AZURE_AI",
                        "base_url": "https://res.openai.azure.com",
                        "api_version": "2024-10-21",
                        "models": ["chat-prod"]
                    }
                ],
                "servers": [
                    {
                        "server_name": "coinstats-mcp",
                        "command": "npx",
                        "args": ["-y", "@coinstats/coinstats-mcp"],
                        "env": { "COINSTATS_API_KEY": "placeholder" }
                    },
                    { "server_name": "mcp-mermaid", "command": "npx" }
                ]
            }"#,
        )
        .expect("config");

        assert_eq!(config.clients[0].timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.clients[1].models.as_deref(), Some(&["chat-prod".to_string()][..]));

        let coinstats = config.server("coinstats-mcp").expect("server");
        assert_eq!(coinstats.args, vec!["-y", "@coinstats/coinstats-mcp"]);
        assert_eq!(coinstats.env.get("COINSTATS_API_KEY").map(String::as_str), Some("placeholder"));

        let mermaid = config.server("mcp-mermaid").expect("server");
        assert!(mermaid.args.is_empty());
        assert!(mermaid.env.is_empty());
        assert!(config.server("blender-mcp").is_none());

        let transport = default_dyn_transport().expect("transport");
        let gateway = build_gateway_from_config(&config, transport).expect("gateway");
        assert_eq!(gateway.clients(), vec![ClientKind::AzureAi, ClientKind::Gemini]);

        let azure = gateway.adapter(ClientKind::AzureAi).expect("azure adapter");
        assert_eq!(azure.client(), ClientKind::AzureAi);
        assert_eq!(azure.policy().allowed_models, vec!["chat-prod".to_string()]);
        let gemini = gateway.adapter(ClientKind::Gemini).expect("gemini adapter");
        assert_eq!(gemini.policy().default_chat_model, "gemini-1.5-flash");
        assert_eq!(gemini.policy().allowed_models.len(), 3);
    }

    #[test]
    fn azure_without_endpoint_is_rejected() {
        let transport = default_dyn_transport().expect("transport");
        let config = GatewayConfig {
            clients: vec![ClientConfig::new(ClientKind::AzureAi)],
            servers: Vec::new(),
        };

        let err = match build_gateway_from_config(&config, transport) {
            Ok(_) => panic!("expected invalid config"),
            Err(err) => err,
        };
        match err {
            GatewayError::InvalidConfig { field, .. } => assert_eq!(field, "base_url"),
            other => panic!("unexpected error type: {other:?}"),
        }
    }

    #[test]
    fn unknown_client_token_fails_to_parse() {
        let err = GatewayConfig::from_json_str(r#"{ "clients": [ { "client": "MCP_CLIENT_X" } ] }"#)
            .expect_err("should fail");
        assert_eq!(err.code(), "invalid_config");
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let err = GatewayConfig::from_path("/nonexistent/gateway.json").expect_err("should fail");
        assert!(err.to_string().contains("/nonexistent/gateway.json"), "{err}");
    }
}
