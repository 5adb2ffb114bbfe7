use serde_json::{Map, Value, json};

use crate::types::{ImageSource, InputType, RequestParameters, ToolDefinition};

/// Builds the Gemini `generateContent` request body.
///
/// The model is carried in the URL path, so it does not appear here. The function is
/// pure: the same parameters always produce the same body.
pub(crate) fn build_gemini_body(params: &RequestParameters) -> Value {
    let mut body = Map::new();

    if !params.prompt.is_empty() {
        body.insert(
            "system_instruction".to_string(),
            json!({ "parts": [ { "text": params.prompt } ] }),
        );
    }

    let mut contents: Vec<Value> = params
        .chat_history
        .iter()
        .filter_map(|message| {
            gemini_role(message.role.as_str()).map(|role| {
                json!({
                    "role": role,
                    "parts": [ { "text": message.content } ]
                })
            })
        })
        .collect();
    contents.push(json!({
        "role": "user",
        "parts": current_turn_parts(params),
    }));
    body.insert("contents".to_string(), Value::Array(contents));

    body.insert(
        "generationConfig".to_string(),
        json!({
            "temperature": params.temperature,
            "maxOutputTokens": params.max_tokens,
        }),
    );

    if !params.tools.is_empty() {
        body.insert("tools".to_string(), convert_tools(&params.tools));
        if let Some(config) = convert_tool_choice(params) {
            body.insert("toolConfig".to_string(), config);
        }
    }

    Value::Object(body)
}

/// Maps a history role onto Gemini's two turn roles; anything else is dropped.
fn gemini_role(role: &str) -> Option<&'static str> {
    match role {
        "user" => Some("user"),
        "model" | "assistant" => Some("model"),
        _ => None,
    }
}

/// Text of the current input followed by any image attachments.
fn current_turn_parts(params: &RequestParameters) -> Vec<Value> {
    let mut parts = vec![json!({ "text": params.input })];
    if params.input_type == InputType::Image {
        parts.extend(params.images_arr.iter().map(|image| match image.source() {
            ImageSource::Inline { mime_type, data } => json!({
                "inlineData": { "mimeType": mime_type, "data": data }
            }),
            ImageSource::Url(url) => json!({
                "fileData": { "mimeType": guess_image_mime(&url), "fileUri": url }
            }),
        }));
    }
    parts
}

fn guess_image_mime(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else if path.ends_with(".heic") {
        "image/heic"
    } else {
        "image/jpeg"
    }
}

/// All tools go into a single `functionDeclarations` entry.
fn convert_tools(tools: &[ToolDefinition]) -> Value {
    let declarations: Vec<Value> = tools
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
            Value::Object(decl)
        })
        .collect();
    json!([ { "functionDeclarations": declarations } ])
}

/// `tool_choice` / `forced_tool_calls` -> `toolConfig.functionCallingConfig`.
///
/// The default `auto` with nothing forced leaves the provider default in place.
fn convert_tool_choice(params: &RequestParameters) -> Option<Value> {
    let forced = params.forced_tool_names();
    if !forced.is_empty() {
        return Some(json!({
            "functionCallingConfig": {
                "mode": "ANY",
                "allowedFunctionNames": forced
            }
        }));
    }
    if let Some(name) = params.tool_choice_function() {
        return Some(json!({
            "functionCallingConfig": {
                "mode": "ANY",
                "allowedFunctionNames": [name]
            }
        }));
    }
    let mode = match params.tool_choice_mode().unwrap_or_default() {
        "none" => "NONE",
        "required" | "any" => "ANY",
        _ => return None,
    };
    Some(json!({ "functionCallingConfig": { "mode": mode } }))
}
