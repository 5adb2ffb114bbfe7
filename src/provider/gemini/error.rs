use super::types::GeminiErrorBody;

/// Summarizes a failed Gemini response for the transport error's `error` field.
///
/// Gemini answers failures with `{"error": {"code", "message", "status"}}`; when that
/// shape is present its message and RPC status are used, otherwise only the HTTP status.
pub(crate) fn describe_gemini_error(status: u16, body: &str) -> String {
    if let Ok(GeminiErrorBody { error: Some(error) }) = serde_json::from_str(body) {
        let message = error.message.unwrap_or_else(|| "unknown error".to_string());
        return match error.status.as_deref() {
            Some(rpc_status) if !rpc_status.is_empty() => {
                format!("HTTP {status}: {message} ({rpc_status})")
            }
            _ => format!("HTTP {status}: {message}"),
        };
    }
    format!("HTTP {status}")
}
