//! OpenAI and Azure OpenAI chat completions against a mock server.

use std::sync::Arc;

use mcp_llm_gateway::http::reqwest::ReqwestTransport;
use mcp_llm_gateway::provider::openai_chat::OpenAiChatAdapter;
use mcp_llm_gateway::{ClientKind, GatewayRequest, LlmAdapter, OutputType};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> Arc<ReqwestTransport> {
    Arc::new(ReqwestTransport::default_client().expect("transport"))
}

fn chat_completion(content: Value, tool_calls: Option<Value>) -> Value {
    let mut message = json!({ "role": "assistant", "content": content });
    if let Some(calls) = tool_calls {
        message["tool_calls"] = calls;
    }
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [ { "index": 0, "message": message, "finish_reason": "stop" } ],
        "usage": { "prompt_tokens": 9, "completion_tokens": 12, "total_tokens": 21 }
    })
}

#[tokio::test]
async fn openai_text_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [
                { "role": "system", "content": "You are terse." },
                { "role": "user", "content": "Hello" }
            ],
            "temperature": 0.1,
            "max_tokens": 1000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            json!("Hello! How can I help you today?"),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = OpenAiChatAdapter::openai(transport()).with_base_url(server.uri());
    let envelope = adapter
        .process(&GatewayRequest::new(
            ClientKind::OpenAi,
            json!({ "api_key": "test-api-key", "prompt": "You are terse.", "input": "Hello" }),
        ))
        .await;

    let data = envelope.data().expect("data");
    assert_eq!(data.messages, vec!["Hello! How can I help you today?".to_string()]);
    assert_eq!(data.usage.total_tokens, 21);
    assert_eq!(data.usage.total_input_tokens, 9);
    assert_eq!(data.usage.total_output_tokens, 12);
    assert_eq!(data.output_type, OutputType::Text);
}

#[tokio::test]
async fn forced_tool_call_is_requested_and_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "tool_choice": { "type": "function", "function": { "name": "lookup" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            Value::Null,
            Some(json!([{
                "id": "call_abc",
                "type": "function",
                "function": { "name": "lookup", "arguments": "{\"q\":\"rust\"}" }
            }])),
        )))
        .mount(&server)
        .await;

    let adapter = OpenAiChatAdapter::openai(transport()).with_base_url(server.uri());
    let envelope = adapter
        .process(&GatewayRequest::new(
            ClientKind::OpenAi,
            json!({
                "api_key": "test-api-key",
                "input": "Search for rust",
                "forced_tool_calls": ["lookup"],
                "tools": [ { "function": { "name": "lookup", "parameters": { "properties": { "q": {} } } } } ]
            }),
        ))
        .await;

    let data = envelope.data().expect("data");
    assert_eq!(data.output_type, OutputType::ToolCall);
    assert_eq!(data.tool_calls[0].id.as_deref(), Some("call_abc"));
    assert_eq!(data.tool_calls[0].arguments, json!({ "q": "rust" }));
}

#[tokio::test]
async fn azure_uses_deployment_path_and_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o-mini/chat/completions"))
        .and(query_param("api-version", "2024-06-01"))
        .and(header("api-key", "azure-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(json!("hi"), None)))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = OpenAiChatAdapter::azure(transport(), server.uri());
    let envelope = adapter
        .process(&GatewayRequest::new(
            ClientKind::AzureAi,
            json!({ "api_key": "azure-key", "input": "hello" }),
        ))
        .await;

    assert_eq!(envelope.data().expect("data").messages, vec!["hi".to_string()]);
}

#[tokio::test]
async fn rate_limit_is_reported_with_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "message": "Rate limit reached",
                "type": "requests",
                "param": null,
                "code": "rate_limit_exceeded"
            }
        })))
        .mount(&server)
        .await;

    let adapter = OpenAiChatAdapter::openai(transport()).with_base_url(server.uri());
    let envelope = adapter
        .process(&GatewayRequest::new(
            ClientKind::OpenAi,
            json!({ "api_key": "test-api-key", "input": "hello" }),
        ))
        .await;

    let error = envelope.error().expect("error");
    assert_eq!(error.code, "transport_error");
    assert_eq!(error.context["status_code"], json!(429));
    assert_eq!(
        error.context["error"],
        json!("HTTP 429: Rate limit reached (rate_limit_exceeded)")
    );
}

#[tokio::test]
async fn non_json_success_body_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let adapter = OpenAiChatAdapter::openai(transport()).with_base_url(server.uri());
    let envelope = adapter
        .process(&GatewayRequest::new(
            ClientKind::OpenAi,
            json!({ "api_key": "test-api-key", "input": "hello" }),
        ))
        .await;

    let error = envelope.error().expect("error");
    assert_eq!(error.message, "API request failed");
    assert_eq!(error.context["status_code"], json!(200));
    assert_eq!(error.context["response"], json!("<html>gateway</html>"));
}
