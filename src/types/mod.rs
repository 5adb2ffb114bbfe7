//! Shared data structures for the generic request, the resolved parameter set and the
//! uniform result envelope.
//!
//! Nothing here knows about a particular provider; adapters translate to and from these
//! shapes in their own `request` and `response` modules.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};

use crate::error::GatewayError;

/// Identity token of a supported client, as sent in `selected_client`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientKind {
    #[serde(rename = "MCP_CLIENT_GEMINI")]
    Gemini,
    #[serde(rename = "MCP_CLIENT_OPENAI")]
    OpenAi,
    #[serde(rename = "MCP_CLIENT_AZURE_AI")]
    AzureAi,
}

impl ClientKind {
    /// All clients known to the gateway.
    pub const ALL: [ClientKind; 3] = [ClientKind::AzureAi, ClientKind::OpenAi, ClientKind::Gemini];

    /// Wire token, e.g. `MCP_CLIENT_GEMINI`.
    pub fn token(self) -> &'static str {
        match self {
            ClientKind::Gemini => "MCP_CLIENT_GEMINI",
            ClientKind::OpenAi => "MCP_CLIENT_OPENAI",
            ClientKind::AzureAi => "MCP_CLIENT_AZURE_AI",
        }
    }

    /// Parses a wire token; matching is exact.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_llm_gateway::types::ClientKind;
    ///
    /// assert_eq!(ClientKind::from_token("MCP_CLIENT_GEMINI"), Some(ClientKind::Gemini));
    /// assert_eq!(ClientKind::from_token("mcp_client_gemini"), None);
    /// ```
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.token() == token)
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Inbound call: which client to use and the loosely-typed details for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRequest {
    /// Identity token of the target client. Kept as free text so mismatches can be
    /// reported verbatim.
    #[serde(default)]
    pub selected_client: Option<String>,
    /// Raw `client_details` mapping, decoded by the adapter.
    #[serde(default = "empty_object")]
    pub client_details: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl GatewayRequest {
    /// Convenience constructor used by callers that already hold a details object.
    pub fn new(client: ClientKind, client_details: Value) -> Self {
        Self {
            selected_client: Some(client.token().to_string()),
            client_details,
        }
    }
}

/// Chat role string. Unknown roles are kept so the payload builders can drop them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(pub String);

impl Role {
    pub fn system() -> Self {
        Self("system".to_string())
    }

    pub fn user() -> Self {
        Self("user".to_string())
    }

    pub fn assistant() -> Self {
        Self("assistant".to_string())
    }

    pub fn model() -> Self {
        Self("model".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One turn of prior conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Whether the request is plain text or carries images for a vision model.
///
/// Only the string `"image"` selects [`InputType::Image`]; any other value reads as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    #[default]
    Text,
    Image,
}

impl<'de> Deserialize<'de> for InputType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str() {
            Some("image") => InputType::Image,
            _ => InputType::Text,
        })
    }
}

/// Image attached to the current user turn.
///
/// Accepts either a bare string (an `http(s)://` or `gs://` URL, a `data:` URL, or raw
/// base64) or an explicit object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageAttachment {
    Inline {
        data: String,
        #[serde(default)]
        mime_type: Option<String>,
    },
    Url {
        url: String,
    },
    Reference(String),
}

/// Where image bytes come from once an [`ImageAttachment`] has been interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Inline { mime_type: String, data: String },
}

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

impl ImageAttachment {
    /// Interprets the attachment.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_llm_gateway::types::{ImageAttachment, ImageSource};
    ///
    /// let image = ImageAttachment::Reference("data:image/png;base64,AAAA".into());
    /// assert_eq!(
    ///     image.source(),
    ///     ImageSource::Inline { mime_type: "image/png".into(), data: "AAAA".into() }
    /// );
    /// ```
    pub fn source(&self) -> ImageSource {
        match self {
            ImageAttachment::Inline { data, mime_type } => match parse_data_url(data) {
                Some(source) => source,
                None => ImageSource::Inline {
                    mime_type: mime_type
                        .clone()
                        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
                    data: data.clone(),
                },
            },
            ImageAttachment::Url { url } => {
                parse_data_url(url).unwrap_or_else(|| ImageSource::Url(url.clone()))
            }
            ImageAttachment::Reference(value) => {
                if let Some(source) = parse_data_url(value) {
                    source
                } else if is_remote(value) {
                    ImageSource::Url(value.clone())
                } else {
                    ImageSource::Inline {
                        mime_type: DEFAULT_IMAGE_MIME.to_string(),
                        data: value.clone(),
                    }
                }
            }
        }
    }
}

fn is_remote(value: &str) -> bool {
    ["http://", "https://", "gs://"]
        .iter()
        .any(|scheme| value.starts_with(scheme))
}

/// Splits `data:<mime>;base64,<payload>`.
fn parse_data_url(value: &str) -> Option<ImageSource> {
    let rest = value.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64").unwrap_or(header);
    let mime_type = if mime.is_empty() {
        DEFAULT_IMAGE_MIME.to_string()
    } else {
        mime.to_string()
    };
    Some(ImageSource::Inline {
        mime_type,
        data: data.to_string(),
    })
}

impl ImageSource {
    /// Renders the source as a URL, turning inline bytes into a `data:` URL.
    pub fn to_url(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Inline { mime_type, data } => format!("data:{mime_type};base64,{data}"),
        }
    }
}

/// Function-style tool offered to the model, in the OpenAI function format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    #[serde(default)]
    pub function: FunctionDefinition,
}

fn function_kind() -> String {
    "function".to_string()
}

/// Name, description and argument schema of a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: ToolParameters,
}

/// Object schema describing tool arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, ToolProperty>,
    #[serde(default)]
    pub required: Vec<String>,
}

/// A single argument of a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolProperty {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// `None` when the key is absent; an explicit `null` is `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present_value")]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Option<ToolItems>,
}

fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Element type of an array argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolItems {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

const DEFAULT_PROPERTY_TYPE: &str = "string";

impl ToolProperty {
    /// Produces the fully-populated schema for this property.
    ///
    /// Arrays always carry `items.type` and an array default; every other property
    /// carries a type, a default and a description. Missing types become `string`.
    pub fn normalized(&self) -> Value {
        let description = self.description.clone().unwrap_or_default();
        if self.kind.as_deref() == Some("array") {
            let item_type = self
                .items
                .as_ref()
                .and_then(|items| items.kind.clone())
                .unwrap_or_else(|| DEFAULT_PROPERTY_TYPE.to_string());
            json!({
                "type": "array",
                "items": { "type": item_type },
                "default": self.default.clone().unwrap_or_else(|| json!([])),
                "description": description,
            })
        } else {
            json!({
                "type": self.kind.as_deref().unwrap_or(DEFAULT_PROPERTY_TYPE),
                "default": self.default.clone().unwrap_or_else(|| json!("")),
                "description": description,
            })
        }
    }
}

impl ToolParameters {
    /// Normalized object schema with every property filled in.
    pub fn normalized(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, property)| (name.clone(), property.normalized()))
            .collect();
        json!({
            "type": self.kind.as_deref().unwrap_or("object"),
            "properties": properties,
            "required": self.required,
        })
    }
}

/// `client_details` as sent by the caller. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientDetails {
    pub input: Option<String>,
    pub images_arr: Option<Vec<ImageAttachment>>,
    pub input_type: Option<InputType>,
    pub is_stream: Option<bool>,
    pub prompt: Option<String>,
    pub api_key: Option<String>,
    pub chat_model: Option<String>,
    pub vision_model: Option<String>,
    pub speech_model: Option<String>,
    pub chat_history: Option<Vec<ChatMessage>>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "token_limit")]
    pub max_tokens: Option<u32>,
    pub forced_tool_calls: Option<Value>,
    pub tool_choice: Option<Value>,
}

/// Accepts `1000` as well as `1000.0`; fractional or negative limits are rejected.
fn token_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let limit = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.fract() == 0.0 && *n >= 0.0)
            .map(|n| n as u64)
    });
    limit
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid max_tokens: {value}")))
}

/// Fully-defaulted parameter set an adapter works from.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParameters {
    pub input: String,
    pub images_arr: Vec<ImageAttachment>,
    pub input_type: InputType,
    /// Accepted for compatibility; responses are never streamed.
    pub is_stream: bool,
    pub prompt: String,
    pub api_key: String,
    pub chat_model: String,
    pub vision_model: String,
    /// Accepted for compatibility; no speech endpoint is called.
    pub speech_model: String,
    pub chat_history: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub forced_tool_calls: Option<Value>,
    /// A mode string (`auto`, `none`, `required`, `any`) or the object form naming one
    /// function.
    pub tool_choice: Value,
}

pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TOOL_CHOICE: &str = "auto";

impl RequestParameters {
    /// Model the request targets: the vision model for image input, else the chat model.
    pub fn selected_model(&self) -> &str {
        match self.input_type {
            InputType::Image => &self.vision_model,
            InputType::Text => &self.chat_model,
        }
    }

    /// Mode named by a string `tool_choice`.
    pub fn tool_choice_mode(&self) -> Option<&str> {
        self.tool_choice.as_str()
    }

    /// Function pinned by an object `tool_choice` such as
    /// `{"type": "function", "function": {"name": "lookup"}}`.
    pub fn tool_choice_function(&self) -> Option<&str> {
        self.tool_choice
            .get("function")
            .and_then(|function| function.get("name"))
            .or_else(|| self.tool_choice.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Names of the functions the caller insists on, if `forced_tool_calls` lists any.
    ///
    /// Accepts a single name, an array of names, or objects carrying a `name` (either at
    /// the top level or under `function`).
    pub fn forced_tool_names(&self) -> Vec<String> {
        fn name_of(value: &Value) -> Option<String> {
            match value {
                Value::String(name) if !name.is_empty() => Some(name.clone()),
                Value::Object(map) => map
                    .get("name")
                    .or_else(|| map.get("function").and_then(|f| f.get("name")))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            }
        }

        match &self.forced_tool_calls {
            Some(Value::Array(items)) => items.iter().filter_map(name_of).collect(),
            Some(other) => name_of(other).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

/// A tool invocation decoded from a provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Discriminates what kind of answer the model produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    Text,
    ToolCall,
}

/// Token accounting for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub total_tokens: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

/// Normalized success payload shared by every adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessPayload {
    pub total_llm_calls: u32,
    #[serde(flatten)]
    pub usage: Usage,
    pub final_llm_response: Value,
    pub llm_responses_arr: Vec<Value>,
    pub messages: Vec<String>,
    pub output_type: OutputType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl SuccessPayload {
    /// Wraps the result of a single provider call.
    pub fn single_call(
        raw: Value,
        usage: Usage,
        message: String,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        let output_type = if tool_calls.is_empty() {
            OutputType::Text
        } else {
            OutputType::ToolCall
        };
        Self {
            total_llm_calls: 1,
            usage,
            llm_responses_arr: vec![raw.clone()],
            final_llm_response: raw,
            messages: vec![message],
            output_type,
            tool_calls,
        }
    }
}

/// Structured error placed in a failed envelope. Always carries `message`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
    #[serde(flatten)]
    pub context: Map<String, Value>,
}

/// The single return shape of every adapter.
///
/// Exactly one of `Data` and `Error` is populated and `Status` mirrors which one; the
/// fields are private so the two can never disagree.
///
/// # Examples
///
/// ```
/// use mcp_llm_gateway::error::GatewayError;
/// use mcp_llm_gateway::types::ResultEnvelope;
///
/// let envelope = ResultEnvelope::failure(&GatewayError::MissingContent);
/// assert!(!envelope.status());
/// assert!(envelope.data().is_none());
/// assert_eq!(envelope.error().unwrap().message, "Either prompt or input must be provided");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    #[serde(rename = "Data")]
    data: Option<SuccessPayload>,
    #[serde(rename = "Error")]
    error: Option<ErrorBody>,
    #[serde(rename = "Status")]
    status: bool,
}

impl ResultEnvelope {
    pub fn success(payload: SuccessPayload) -> Self {
        Self {
            data: Some(payload),
            error: None,
            status: true,
        }
    }

    pub fn failure(error: &GatewayError) -> Self {
        Self {
            data: None,
            error: Some(error.to_error_body()),
            status: false,
        }
    }

    pub fn from_result(result: Result<SuccessPayload, GatewayError>) -> Self {
        match result {
            Ok(payload) => Self::success(payload),
            Err(err) => Self::failure(&err),
        }
    }

    pub fn status(&self) -> bool {
        self.status
    }

    pub fn data(&self) -> Option<&SuccessPayload> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }

    /// Converts back into a `Result` for callers that prefer `?`.
    pub fn into_result(self) -> Result<SuccessPayload, ErrorBody> {
        match (self.data, self.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(error),
            (None, None) => Err(GatewayError::internal("EmptyEnvelope", "envelope is empty")
                .to_error_body()),
        }
    }
}
