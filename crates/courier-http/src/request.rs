//! HTTP request types and builders

use crate::error::{HttpError, HttpResult};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    /// Returns the method as a string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request body types
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body
    None,
    /// JSON body
    Json(serde_json::Value),
}

/// A fully built request.
///
/// Fields are read-only; dispatch takes the request by value, so each one is
/// sent at most once.
#[derive(Debug)]
pub struct HttpRequest {
    method: HttpMethod,
    url: String,
    headers: HashMap<String, String>,
    body: RequestBody,
}

impl HttpRequest {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Gets a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Build a reqwest RequestBuilder for this request
    pub(crate) fn into_reqwest(self, client: &reqwest::Client) -> HttpResult<reqwest::RequestBuilder> {
        let url = url::Url::parse(&self.url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                url.scheme(),
                self.url
            )));
        }

        let mut builder = client.request(self.method.to_reqwest(), url);

        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        // Content-Type is already in the header map, so bodies go in raw.
        builder = match self.body {
            RequestBody::None => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| HttpError::Json(format!("Failed to serialize JSON: {}", e)))?;
                builder.body(bytes)
            }
        };

        Ok(builder)
    }
}

/// Request builder for constructing HTTP requests
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    /// HTTP method
    pub method: HttpMethod,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body
    pub body: RequestBody,
}

impl RequestBuilder {
    /// Create a new request builder
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: RequestBody::None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// Add a header. Names are stored lowercased, so setting the same
    /// header twice in different case keeps only the last value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Serialize `body` as JSON and set `Content-Type: application/json`
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> HttpResult<Self> {
        let json = serde_json::to_value(body)
            .map_err(|e| HttpError::Json(format!("Failed to serialize JSON: {}", e)))?;
        self.body = RequestBody::Json(json);
        Ok(self.header("Content-Type", "application/json"))
    }

    /// Finish the request.
    pub fn build(self) -> HttpResult<HttpRequest> {
        if self.url.trim().is_empty() {
            return Err(HttpError::InvalidUrl("empty URL".to_string()));
        }
        if self.method == HttpMethod::Get && self.body != RequestBody::None {
            return Err(HttpError::InvalidRequest(
                "GET requests cannot carry a body".to_string(),
            ));
        }

        Ok(HttpRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        })
    }
}
