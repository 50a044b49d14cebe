//! HTTP client configuration

/// Configuration for [`HttpClient`](crate::HttpClient).
///
/// Timeouts, pooling and TLS are left at reqwest's defaults.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// User-Agent header value
    pub user_agent: String,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// Maximum number of redirects to follow
    pub max_redirects: usize,

    /// Enable gzip compression
    pub gzip: bool,

    /// Enable brotli compression
    pub brotli: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
            follow_redirects: true,
            max_redirects: 10,
            gzip: true,
            brotli: true,
        }
    }
}

impl HttpClientConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set whether to follow redirects
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Set maximum redirects
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Enable/disable gzip compression
    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }

    /// Enable/disable brotli compression
    pub fn brotli(mut self, enabled: bool) -> Self {
        self.brotli = enabled;
        self
    }
}
