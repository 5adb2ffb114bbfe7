use serde::Deserialize;
use serde_json::Value;

/// `functionCall` part of a GenerateContent candidate.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeminiFunctionCall {
    #[serde(default)]
    pub(crate) name: String,
    /// Function arguments as a JSON object.
    #[serde(default)]
    pub(crate) args: Value,
    #[serde(default)]
    pub(crate) id: Option<String>,
}

/// `usageMetadata` block. Only the three counters the envelope reports are read.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeminiUsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    pub(crate) prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount", default)]
    pub(crate) candidates_token_count: Option<u64>,
    #[serde(rename = "totalTokenCount", default)]
    pub(crate) total_token_count: Option<u64>,
}

/// Error document returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct GeminiErrorBody {
    pub(crate) error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiErrorDetail {
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
}
