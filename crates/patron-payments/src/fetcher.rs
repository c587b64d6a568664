//! The HTTP boundary.
//!
//! Components build [`UrlRequest`]s and read typed bodies off the
//! [`UrlResponse`]; the [`UrlFetcher`] implementation decides how bytes
//! move. Tests substitute an in-memory fetcher.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Request headers worth echoing into the log.
const LOGGED_REQUEST_HEADERS: [&str; 4] = ["digest", "signature", "accept", "content-type"];

/// Response bodies are truncated to this many bytes when logged.
const MAX_LOGGED_BODY_BYTES: usize = 1024;

/// An outgoing HTTP request.
#[derive(Clone, Debug)]
pub struct UrlRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub content: String,
    pub content_type: String,
}

impl UrlRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET",
            url: url.into(),
            headers: Vec::new(),
            content: String::new(),
            content_type: String::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: "POST",
            url: url.into(),
            headers: Vec::new(),
            content: String::new(),
            content_type: String::new(),
        }
    }

    /// Attach a JSON body.
    pub fn with_json(mut self, value: &serde_json::Value) -> Self {
        self.content = value.to_string();
        self.content_type = "application/json; charset=utf-8".to_string();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// A completed HTTP exchange.
///
/// Transport failures surface as status code 0 so that callers have a
/// single failure path.
#[derive(Clone, Debug)]
pub struct UrlResponse {
    pub status_code: u16,
    pub body: String,
}

impl UrlResponse {
    pub fn succeeded(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn read_body_json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_str(&self.body).ok()
    }

    pub fn read_body_text(&self) -> &str {
        &self.body
    }
}

/// Per-request logging controls.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchOptions {
    /// Log the response body even on success.
    pub log_response_body: bool,
    /// Suppress request/response logging entirely (credential-bearing
    /// exchanges).
    pub disable_logging: bool,
}

/// Moves bytes for the service clients.
#[async_trait]
pub trait UrlFetcher: Send + Sync {
    async fn fetch(&self, request: UrlRequest, options: FetchOptions) -> UrlResponse;
}

/// The production fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlFetcher for HttpFetcher {
    async fn fetch(&self, request: UrlRequest, options: FetchOptions) -> UrlResponse {
        log_request(&request, options);

        let mut builder = match request.method {
            "POST" => self.client.post(&request.url),
            _ => self.client.get(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.content.is_empty() {
            builder = builder
                .header("content-type", &request.content_type)
                .body(request.content.clone());
        }

        let response = match builder.send().await {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                UrlResponse { status_code, body }
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "request failed");
                UrlResponse {
                    status_code: 0,
                    body: String::new(),
                }
            }
        };

        log_response(&request.url, &response, options);
        response
    }
}

fn log_request(request: &UrlRequest, options: FetchOptions) {
    if options.disable_logging {
        return;
    }

    tracing::debug!(method = request.method, url = %request.url, "request");
    for (name, value) in &request.headers {
        if LOGGED_REQUEST_HEADERS
            .iter()
            .any(|h| name.eq_ignore_ascii_case(h))
        {
            tracing::trace!(header = %name, value = %value, "request header");
        }
    }
}

fn log_response(url: &str, response: &UrlResponse, options: FetchOptions) {
    if options.disable_logging {
        return;
    }

    let failed = !response.succeeded();
    tracing::debug!(
        url,
        status = response.status_code,
        result = if failed { "failure" } else { "success" },
        "response"
    );

    if (failed || options.log_response_body) && !response.body.is_empty() {
        let body = &response.body;
        let mut end = body.len().min(MAX_LOGGED_BODY_BYTES);
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        tracing::trace!(body = %&body[..end], "response body");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeded_is_2xx() {
        for (status, ok) in [(200, true), (204, true), (299, true), (199, false), (400, false), (0, false)] {
            let response = UrlResponse {
                status_code: status,
                body: String::new(),
            };
            assert_eq!(response.succeeded(), ok, "status {status}");
        }
    }

    #[test]
    fn test_read_body_json() {
        let response = UrlResponse {
            status_code: 200,
            body: r#"{"id": "abc"}"#.to_string(),
        };
        #[derive(serde::Deserialize)]
        struct Body {
            id: String,
        }
        let body: Body = response.read_body_json().expect("parse");
        assert_eq!(body.id, "abc");

        let bad = UrlResponse {
            status_code: 200,
            body: "not json".to_string(),
        };
        assert!(bad.read_body_json::<Body>().is_none());
    }

    #[test]
    fn test_with_json_sets_content_type() {
        let request = UrlRequest::post("https://example.test/v1/orders")
            .with_json(&serde_json::json!({"items": []}));
        assert_eq!(request.content, r#"{"items":[]}"#);
        assert!(request.content_type.starts_with("application/json"));
    }
}
