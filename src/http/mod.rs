use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::{GatewayError, TransportError};

/// Upper bound on a single provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Minimal POST request representation shared across adapters.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Builds a POST request with a JSON request body.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_llm_gateway::http::HttpRequest;
    ///
    /// let request = HttpRequest::post_json("https://example.com", br"{}".to_vec());
    /// assert_eq!(request.headers.get("Content-Type"), Some(&"application/json".to_string()));
    /// assert!(request.timeout.is_none());
    /// ```
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body,
            timeout: None,
        }
    }

    /// Merges extra headers into the request, replacing same-named entries.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Bounds how long the transport may wait for the full response.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Minimal HTTP response representation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport abstraction used to decouple adapters from the concrete HTTP client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and resolves when the full response is available.
    ///
    /// # Examples
    ///
    /// ```
    /// # use async_trait::async_trait;
    /// # use mcp_llm_gateway::http::{HttpTransport, HttpRequest, HttpResponse};
    /// # use mcp_llm_gateway::error::TransportError;
    /// struct MemoryTransport;
    ///
    /// #[async_trait]
    /// impl HttpTransport for MemoryTransport {
    ///     async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
    ///         Ok(HttpResponse { status: 200, headers: request.headers, body: b"{}".to_vec() })
    ///     }
    /// }
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let response = MemoryTransport
    ///     .send(HttpRequest::post_json("https://example.com", br"{}".to_vec()))
    ///     .await
    ///     .unwrap();
    /// assert_eq!(response.status, 200);
    /// # });
    /// ```
    ///
    /// # Errors
    ///
    /// Implementations return [`TransportError`] when no response could be obtained,
    /// including when the request timeout elapses. Non-2xx responses are returned as
    /// `Ok` and judged by the caller.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Thread-safe handle to a transport implementation.
pub type DynHttpTransport = Arc<dyn HttpTransport>;

/// Serializes a body to JSON, attaches headers and a timeout, and issues a POST request.
///
/// # Errors
///
/// Returns [`GatewayError::Internal`] if serialization fails or a
/// [`GatewayError::Transport`] raised by [`HttpTransport::send`].
pub async fn post_json_with_headers<T: Serialize>(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
    timeout: Duration,
) -> Result<HttpResponse, GatewayError> {
    let payload = serde_json::to_vec(body).map_err(|err| {
        GatewayError::internal("SerializeError", format!("failed to serialize request: {err}"))
    })?;
    let request = HttpRequest::post_json(url, payload)
        .with_headers(headers)
        .with_timeout(timeout);
    Ok(transport.send(request).await?)
}

/// Accepts a 2xx response carrying a JSON document.
///
/// `describe` turns a failed status and its body into the `error` text of the resulting
/// [`TransportError`]; adapters use it to surface the provider's own error message.
///
/// # Errors
///
/// Returns [`TransportError`] for non-2xx statuses and for bodies that are not JSON.
pub fn decode_json_success(
    response: HttpResponse,
    describe: impl Fn(u16, &str) -> String,
) -> Result<Value, TransportError> {
    let text = response.text();
    if !response.is_success() {
        let error = describe(response.status, &text);
        return Err(TransportError::status(response.status, text, error));
    }
    serde_json::from_str(&text).map_err(|err| {
        TransportError::status(
            response.status,
            text.clone(),
            format!("response body is not valid JSON: {err}"),
        )
    })
}

pub mod reqwest;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser;

    /// Transport that panics if `send` is invoked.
    struct PanicTransport;

    #[async_trait]
    impl HttpTransport for PanicTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            panic!("send should not be called");
        }
    }

    /// Body type that intentionally fails serialization.
    struct NonSerializableBody;

    impl Serialize for NonSerializableBody {
        fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            Err(ser::Error::custom(
                "intentional serialization failure for test",
            ))
        }
    }

    #[tokio::test]
    async fn post_json_with_headers_reports_serde_error_before_sending() {
        let result = post_json_with_headers(
            &PanicTransport,
            "http://example.com",
            HashMap::new(),
            &NonSerializableBody,
            DEFAULT_TIMEOUT,
        )
        .await;

        match result {
            Err(GatewayError::Internal { kind, message }) => {
                assert_eq!(kind, "SerializeError");
                assert!(message.contains("failed to serialize request"));
            }
            Ok(_) => panic!("expected error for non serializable body"),
            other => panic!("unexpected error type: {other:?}"),
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn decode_json_success_accepts_2xx_json() {
        let value = decode_json_success(response(200, r#"{"a":1}"#), |_, _| unreachable!())
            .expect("decodes");
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn decode_json_success_keeps_status_and_body_on_failure() {
        let err = decode_json_success(response(429, "slow down"), |status, body| {
            format!("{status}: {body}")
        })
        .expect_err("should fail");
        assert_eq!(err.status_code, Some(429));
        assert_eq!(err.response.as_deref(), Some("slow down"));
        assert_eq!(err.error, "429: slow down");
    }

    #[test]
    fn decode_json_success_rejects_non_json_body() {
        let err = decode_json_success(response(200, "<html>"), |_, _| String::new())
            .expect_err("should fail");
        assert_eq!(err.status_code, Some(200));
        assert!(err.error.contains("not valid JSON"));
    }

    #[test]
    fn with_headers_keeps_content_type() {
        let request = HttpRequest::post_json("https://example.com", Vec::new())
            .with_headers(HashMap::from([("x-goog-api-key".into(), "k".into())]));
        assert_eq!(request.headers.len(), 2);
    }
}
