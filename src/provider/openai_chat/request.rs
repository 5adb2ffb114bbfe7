use serde_json::{Map, Value, json};

use crate::types::{DEFAULT_TOOL_CHOICE, InputType, RequestParameters, ToolDefinition};

/// Builds a Chat Completions request body.
///
/// `model` is `None` for Azure, where the deployment is part of the URL.
pub(crate) fn build_openai_body(params: &RequestParameters, model: Option<&str>) -> Value {
    let mut body = Map::new();
    if let Some(model) = model {
        body.insert("model".to_string(), Value::String(model.to_string()));
    }
    body.insert("messages".to_string(), Value::Array(convert_messages(params)));
    body.insert("temperature".to_string(), Value::from(params.temperature));
    body.insert("max_tokens".to_string(), Value::from(params.max_tokens));

    if !params.tools.is_empty() {
        body.insert("tools".to_string(), Value::Array(convert_tools(&params.tools)));
        body.insert("tool_choice".to_string(), convert_tool_choice(params));
    }

    Value::Object(body)
}

/// System prompt, filtered history, then the current user turn.
fn convert_messages(params: &RequestParameters) -> Vec<Value> {
    let mut messages = Vec::with_capacity(params.chat_history.len() + 2);
    if !params.prompt.is_empty() {
        messages.push(json!({ "role": "system", "content": params.prompt }));
    }
    messages.extend(params.chat_history.iter().filter_map(|message| {
        openai_role(message.role.as_str()).map(|role| {
            json!({ "role": role, "content": message.content })
        })
    }));
    messages.push(json!({ "role": "user", "content": current_turn_content(params) }));
    messages
}

/// Gemini-style `model` turns are accepted as `assistant`; unknown roles are dropped.
fn openai_role(role: &str) -> Option<&'static str> {
    match role {
        "user" => Some("user"),
        "assistant" | "model" => Some("assistant"),
        "system" => Some("system"),
        _ => None,
    }
}

fn current_turn_content(params: &RequestParameters) -> Value {
    if params.input_type != InputType::Image || params.images_arr.is_empty() {
        return Value::String(params.input.clone());
    }
    let mut parts = vec![json!({ "type": "text", "text": params.input })];
    parts.extend(params.images_arr.iter().map(|image| {
        json!({
            "type": "image_url",
            "image_url": { "url": image.source().to_url() }
        })
    }));
    Value::Array(parts)
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            let function = &tool.function;
            let mut decl = Map::new();
            decl.insert("name".to_string(), Value::String(function.name.clone()));
            if let Some(description) = &function.description {
                decl.insert(
                    "description".to_string(),
                    Value::String(description.clone()),
                );
            }
            decl.insert("parameters".to_string(), function.parameters.normalized());
            json!({ "type": "function", "function": decl })
        })
        .collect()
}

/// Forced calls pin a single function or require any tool; otherwise the caller's
/// `tool_choice` is sent as is, with `any` spelled the OpenAI way. Values that are
/// neither a string nor an object fall back to `auto`.
fn convert_tool_choice(params: &RequestParameters) -> Value {
    let forced = params.forced_tool_names();
    match forced.as_slice() {
        [name] => json!({ "type": "function", "function": { "name": name } }),
        [_, _, ..] => json!("required"),
        [] => match &params.tool_choice {
            Value::String(mode) if mode == "any" => json!("required"),
            choice @ (Value::String(_) | Value::Object(_)) => choice.clone(),
            _ => json!(DEFAULT_TOOL_CHOICE),
        },
    }
}
