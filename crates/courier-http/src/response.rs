//! HTTP response types

use crate::error::HttpResult;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// HTTP status code wrapper with helper methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpStatus(pub u16);

impl HttpStatus {
    pub const OK: Self = Self(200);
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP response with built-in latency measurement
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status_code: u16,

    /// Response headers
    pub headers: HashMap<String, String>,

    /// Response body as bytes
    pub body: Vec<u8>,

    /// Request latency in milliseconds
    pub latency_ms: u64,

    /// Final URL (may differ from request URL due to redirects)
    pub url: String,

    /// HTTP version
    pub version: String,
}

impl HttpResponse {
    pub fn status(&self) -> HttpStatus {
        HttpStatus(self.status_code)
    }

    /// Exactly 200. Other 2xx codes do not count.
    pub fn is_ok(&self) -> bool {
        self.status() == HttpStatus::OK
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Builder for creating HttpResponse (used by transports and tests)
#[derive(Debug)]
pub struct HttpResponseBuilder {
    status_code: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    latency_ms: u64,
    url: String,
    version: String,
}

impl HttpResponseBuilder {
    pub fn new() -> Self {
        Self {
            status_code: 200,
            headers: HashMap::new(),
            body: Vec::new(),
            latency_ms: 0,
            url: String::new(),
            version: "HTTP/1.1".to_string(),
        }
    }

    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = code;
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn build(self) -> HttpResponse {
        HttpResponse {
            status_code: self.status_code,
            headers: self.headers,
            body: self.body,
            latency_ms: self.latency_ms,
            url: self.url,
            version: self.version,
        }
    }
}

impl Default for HttpResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert reqwest Response to HttpResponse, reading the whole body
pub(crate) async fn from_reqwest(
    response: reqwest::Response,
    latency_ms: u64,
) -> HttpResult<HttpResponse> {
    let status_code = response.status().as_u16();
    let url = response.url().to_string();
    let version = format!("{:?}", response.version());

    let mut headers = HashMap::new();
    for (name, value) in response.headers().iter() {
        if let Ok(v) = value.to_str() {
            headers.insert(name.to_string(), v.to_string());
        }
    }

    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
        latency_ms,
        url,
        version,
    })
}
