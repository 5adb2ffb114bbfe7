use serde_json::Value;

use crate::types::{SuccessPayload, ToolCall, Usage};

use super::types::{GeminiFunctionCall, GeminiUsageMetadata};

/// Maps a raw GenerateContent response into the uniform success payload.
///
/// Only the first candidate's first part decides the outcome: a `functionCall` there
/// makes it a tool-call answer, otherwise its `text` is the message. Missing or
/// ill-typed fields degrade to empty values instead of failing.
pub(crate) fn normalize_response(raw: Value) -> SuccessPayload {
    let parts = raw
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let first = parts.first();

    let message = first
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let is_tool_call = first
        .and_then(|part| part.get("functionCall"))
        .is_some_and(|call| !call.is_null());
    // Parallel calls arrive as sibling parts of the same candidate.
    let tool_calls = if is_tool_call {
        parts
            .iter()
            .filter_map(|part| part.get("functionCall"))
            .filter(|call| !call.is_null())
            .map(convert_function_call)
            .collect()
    } else {
        Vec::new()
    };

    let usage = convert_usage(raw.get("usageMetadata"));
    SuccessPayload::single_call(raw, usage, message, tool_calls)
}

fn convert_function_call(call: &Value) -> ToolCall {
    let call: GeminiFunctionCall = serde_json::from_value(call.clone()).unwrap_or_default();
    ToolCall {
        id: call.id,
        name: call.name,
        arguments: call.args,
    }
}

/// UsageMetadata -> Usage, zero for anything absent.
fn convert_usage(usage: Option<&Value>) -> Usage {
    let usage: GeminiUsageMetadata = usage
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default();
    Usage {
        total_tokens: usage.total_token_count.unwrap_or(0),
        total_input_tokens: usage.prompt_token_count.unwrap_or(0),
        total_output_tokens: usage.candidates_token_count.unwrap_or(0),
    }
}
