//! Options for authenticated requests and classification of their responses.

use std::time::Duration;

use reqwest::{
    Method, Response, StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Caller-supplied parts of a resource API request.
///
/// Defaults to a bodiless `GET` without timeout or cancellation.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a query parameter. Values are percent-encoded when sent.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// What the client has to do about a non-2xx resource response.
#[derive(Debug)]
pub(crate) enum Failure {
    /// The session is unusable; tokens must be cleared.
    Unauthorized(Error),
    Other(Error),
}

/// Turns a resource API response into JSON or a classified failure.
pub(crate) async fn classify(response: Response) -> std::result::Result<Value, Failure> {
    let status = response.status();
    if status.is_success() {
        return read_json(response).await.map_err(Failure::Other);
    }

    let retry_after = retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| format!("status {}", status.as_u16()));

    let err = match status {
        StatusCode::UNAUTHORIZED => {
            return Err(Failure::Unauthorized(Error::AuthenticationFailed(message)));
        }
        StatusCode::FORBIDDEN => Error::PermissionDenied(message),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited { retry_after },
        s if s.is_server_error() => Error::UpstreamUnavailable { status: s.as_u16() },
        s => Error::Api {
            status: s.as_u16(),
            message,
        },
    };
    Err(Failure::Other(err))
}

async fn read_json(response: Response) -> Result<Value> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(Error::from_transport)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| Error::Api {
        status,
        message: format!("invalid JSON body: {e}"),
    })
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Extracts a human readable message from an error body.
///
/// Understands the resource API shape (`{"error": {"status", "message"}}`)
/// and the token endpoint shape (`{"error", "error_description"}`).
pub(crate) fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let error = &json["error"];

    error["message"]
        .as_str()
        .or_else(|| json["error_description"].as_str())
        .or_else(|| error.as_str())
        .or_else(|| json["message"].as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_from_resource_api_body() {
        let body = r#"{"error":{"status":404,"message":"Non existing id"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Non existing id"));
    }

    #[test]
    fn error_message_from_token_endpoint_body() {
        let body = r#"{"error":"invalid_grant","error_description":"Refresh token revoked"}"#;
        assert_eq!(error_message(body).as_deref(), Some("Refresh token revoked"));

        let body = r#"{"error":"invalid_client"}"#;
        assert_eq!(error_message(body).as_deref(), Some("invalid_client"));
    }

    #[test]
    fn error_message_ignores_unparseable_bodies() {
        assert_eq!(error_message("<html>Bad Gateway</html>"), None);
        assert_eq!(error_message(""), None);
        assert_eq!(error_message(r#"{"error":{"status":400,"message":""}}"#), None);
    }

    #[test]
    fn retry_after_parses_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(12)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn options_builder() {
        let token = CancellationToken::new();
        let opts = RequestOptions::new()
            .method(Method::PUT)
            .query("ids", "a,b")
            .json(serde_json::json!({"ids": ["a"]}))
            .timeout(Duration::from_secs(3))
            .cancel_on(token.clone());

        assert_eq!(opts.method, Method::PUT);
        assert_eq!(opts.query, vec![("ids".to_string(), "a,b".to_string())]);
        assert!(opts.body.is_some());
        assert_eq!(opts.timeout, Some(Duration::from_secs(3)));
        assert!(opts.cancel.is_some());
        assert_eq!(RequestOptions::new().method, Method::GET);
    }
}
