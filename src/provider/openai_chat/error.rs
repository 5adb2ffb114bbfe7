use serde_json::Value;

use super::types::OpenAiErrorBody;

/// Summarizes a failed Chat Completions response.
///
/// OpenAI and Azure share the `{"error": {"message", "type", "code"}}` shape.
pub(crate) fn describe_openai_error(status: u16, body: &str) -> String {
    if let Ok(OpenAiErrorBody { error: Some(error) }) = serde_json::from_str(body) {
        let message = error.message.unwrap_or_else(|| "unknown error".to_string());
        return match error.code {
            Some(Value::String(code)) => format!("HTTP {status}: {message} ({code})"),
            Some(Value::Number(code)) => format!("HTTP {status}: {message} ({code})"),
            _ => format!("HTTP {status}: {message}"),
        };
    }
    format!("HTTP {status}")
}
