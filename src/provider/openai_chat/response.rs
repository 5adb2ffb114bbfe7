use serde_json::Value;

use crate::types::{SuccessPayload, ToolCall, Usage};

use super::types::{OpenAiToolCallResponse, OpenAiUsage};

/// Maps a raw Chat Completions response into the uniform success payload.
///
/// The first choice's message decides the outcome: a non-empty `tool_calls` makes it a
/// tool-call answer. Missing or ill-typed fields degrade to empty values.
pub(crate) fn normalize_response(raw: Value) -> SuccessPayload {
    let message = raw.pointer("/choices/0/message");

    let text = match message.and_then(|m| m.get("content")) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    };

    let tool_calls = message
        .and_then(|m| m.get("tool_calls"))
        .and_then(Value::as_array)
        .map(|calls| calls.iter().map(convert_tool_call).collect())
        .unwrap_or_default();

    let usage = convert_usage(raw.get("usage"));
    SuccessPayload::single_call(raw, usage, text, tool_calls)
}

fn convert_tool_call(call: &Value) -> ToolCall {
    let call: OpenAiToolCallResponse = serde_json::from_value(call.clone()).unwrap_or_default();
    let function = call.function.unwrap_or_default();
    let arguments = match function.arguments {
        Some(args) => serde_json::from_str(&args).unwrap_or(Value::String(args)),
        None => Value::Null,
    };
    ToolCall {
        id: call.id,
        name: function.name.unwrap_or_default(),
        arguments,
    }
}

fn convert_usage(usage: Option<&Value>) -> Usage {
    let usage: OpenAiUsage = usage
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default();
    Usage {
        total_tokens: usage.total_tokens.unwrap_or(0),
        total_input_tokens: usage.prompt_tokens.unwrap_or(0),
        total_output_tokens: usage.completion_tokens.unwrap_or(0),
    }
}
