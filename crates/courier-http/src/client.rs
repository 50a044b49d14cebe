//! reqwest-backed HTTP client

use crate::config::HttpClientConfig;
use crate::error::HttpResult;
use crate::request::HttpRequest;
use crate::response::{from_reqwest, HttpResponse};
use crate::transport::Transport;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Async HTTP client shared by every request the runner makes.
///
/// Cloning is cheap; all clones use the same underlying `reqwest::Client`.
///
/// # Example
///
/// ```ignore
/// use courier_http::{HttpClient, HttpClientConfig, RequestBuilder, Transport};
///
/// let client = HttpClient::new(HttpClientConfig::new())?;
/// let request = RequestBuilder::get("https://brave.com").build()?;
/// let response = client.execute(request).await?;
/// println!("Status: {}, Latency: {}ms", response.status_code, response.latency_ms);
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    client: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> HttpResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);

        if config.follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        } else {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }

        builder = builder.gzip(config.gzip).brotli(config.brotli);

        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(HttpClientInner { client, config }),
        })
    }

    /// Create a client with default configuration
    pub fn default_client() -> HttpResult<Self> {
        Self::new(HttpClientConfig::default())
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.inner.config
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
        let method = request.method();
        let url = request.url().to_string();
        tracing::debug!(%method, %url, "Sending request");

        let start = Instant::now();
        let response = request.into_reqwest(&self.inner.client)?.send().await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        from_reqwest(response, latency_ms).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("user_agent", &self.inner.config.user_agent)
            .field("follow_redirects", &self.inner.config.follow_redirects)
            .finish()
    }
}
