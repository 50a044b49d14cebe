//! The seam between the runner and the network

use crate::error::HttpResult;
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use async_trait::async_trait;

/// Sends one request and reads the whole response.
///
/// Implementations must be safe to share across threads: the runner calls
/// `execute` from the caller's thread for blocking dispatch and from runtime
/// workers for async dispatch, possibly at the same time.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn execute(&self, request: HttpRequest) -> HttpResult<HttpResponse>;
}
