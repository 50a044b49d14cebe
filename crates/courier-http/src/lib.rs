//! courier-http: one shared HTTP client, three ways to dispatch
//!
//! - blocking GET that prints status and body
//! - blocking JSON POST that prints the body or a failure line
//! - non-blocking JSON POST that reports through a completion handler
//!
//! # Architecture
//!
//! - `HttpClient`: reqwest-backed [`Transport`], built once from `HttpClientConfig`
//! - `RequestBuilder` / `HttpRequest`: request construction, consumed on dispatch
//! - `HttpResponse`: fully read response with latency measurement
//! - `RequestRunner`: owns the runtime, tracks async dispatches, prints results
//!
//! The `courier` binary in `courier-cli` wires these together.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod output;
pub mod payload;
pub mod request;
pub mod response;
pub mod runner;
pub mod transport;

pub use client::HttpClient;
pub use config::HttpClientConfig;
pub use dispatch::{DispatchHandle, DispatchOutcome};
pub use error::{HttpError, HttpErrorCategory, HttpResult};
pub use output::{CapturedOutput, OutputSink};
pub use payload::Person;
pub use request::{HttpMethod, HttpRequest, RequestBody, RequestBuilder};
pub use response::{HttpResponse, HttpResponseBuilder, HttpStatus};
pub use runner::{report_outcome, report_response, RequestRunner};
pub use transport::Transport;
