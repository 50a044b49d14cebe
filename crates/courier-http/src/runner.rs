//! Request runner: blocking GET/POST and callback-based async POST
//!
//! The runner owns a multi-threaded tokio runtime. Blocking dispatch drives
//! the transport with `block_on` from the caller's thread; async dispatch is
//! spawned onto the runtime's workers and reports through a completion
//! handler. [`RequestRunner::wait_for_pending`] is the join point that must
//! run before the process exits, otherwise pending handlers are dropped with
//! the runtime.

use crate::dispatch::{DispatchHandle, DispatchOutcome};
use crate::error::HttpResult;
use crate::output::OutputSink;
use crate::request::{HttpRequest, RequestBuilder};
use crate::response::HttpResponse;
use crate::transport::Transport;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

const DEFAULT_WORKER_THREADS: usize = 2;

/// Dispatches requests through one shared transport and prints the results.
pub struct RequestRunner {
    transport: Arc<dyn Transport>,
    runtime: Runtime,
    tracker: TaskTracker,
    // Replaced after every cancel_pending so later dispatches start live.
    shutdown: Mutex<CancellationToken>,
    output: OutputSink,
    next_id: AtomicU64,
}

impl RequestRunner {
    pub fn new(transport: impl Transport, output: OutputSink) -> HttpResult<Self> {
        Self::with_worker_threads(transport, output, DEFAULT_WORKER_THREADS)
    }

    pub fn with_worker_threads(
        transport: impl Transport,
        output: OutputSink,
        worker_threads: usize,
    ) -> HttpResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("courier-worker")
            .enable_all()
            .build()?;

        Ok(Self {
            transport: Arc::new(transport),
            runtime,
            tracker: TaskTracker::new(),
            shutdown: Mutex::new(CancellationToken::new()),
            output,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn output(&self) -> &OutputSink {
        &self.output
    }

    /// Blocking GET. Prints the status code, then the body.
    ///
    /// Transport faults are returned and nothing is printed.
    pub fn perform_get(&self, uri: &str) -> HttpResult<HttpResponse> {
        let request = RequestBuilder::get(uri).build()?;
        let response = self.dispatch_blocking(request)?;

        self.output.line(response.status_code.to_string());
        self.output.line(response.body_text());
        Ok(response)
    }

    /// Blocking POST of `body` as JSON.
    ///
    /// Prints the body on 200, otherwise `Something went wrong: <status>`
    /// followed by the body. Transport faults are returned and nothing is
    /// printed.
    pub fn perform_sync_post<T: Serialize + ?Sized>(
        &self,
        uri: &str,
        body: &T,
    ) -> HttpResult<HttpResponse> {
        let request = RequestBuilder::post(uri).json(body)?.build()?;
        let response = self.dispatch_blocking(request)?;

        report_response(&self.output, &response);
        Ok(response)
    }

    /// Non-blocking POST of `body` as JSON.
    ///
    /// Returns as soon as the dispatch is spawned. `handler` runs exactly once
    /// on a runtime worker thread with the outcome. Serialization or request
    /// construction errors are returned here and `handler` never runs.
    pub fn perform_async_post<T, F>(
        &self,
        uri: &str,
        body: &T,
        handler: F,
    ) -> HttpResult<DispatchHandle>
    where
        T: Serialize + ?Sized,
        F: FnOnce(DispatchOutcome) + Send + 'static,
    {
        let request = RequestBuilder::post(uri).json(body)?.build()?;
        Ok(self.dispatch_async(request, handler))
    }

    /// [`perform_async_post`](Self::perform_async_post) with
    /// [`report_outcome`] as the handler.
    pub fn post_json_async<T: Serialize + ?Sized>(
        &self,
        uri: &str,
        body: &T,
    ) -> HttpResult<DispatchHandle> {
        let output = self.output.clone();
        self.perform_async_post(uri, body, move |outcome| report_outcome(&output, &outcome))
    }

    /// Number of async dispatches whose handler has not returned yet.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Block until every async dispatch spawned so far has run its handler.
    ///
    /// Returns how many were outstanding when the wait began.
    pub fn wait_for_pending(&self) -> usize {
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::debug!(pending, "Waiting for async dispatches");
        }

        self.tracker.close();
        self.runtime.block_on(self.tracker.wait());
        self.tracker.reopen();

        pending
    }

    /// Cancel every outstanding async dispatch. Each one still reports
    /// [`DispatchOutcome::Cancelled`] to its handler unless it had already
    /// completed. Returns how many were outstanding.
    pub fn cancel_pending(&self) -> usize {
        let pending = self.tracker.len();
        let token = std::mem::replace(&mut *self.shutdown.lock(), CancellationToken::new());
        token.cancel();

        tracing::info!(pending, "Cancelled async dispatches");
        pending
    }

    fn dispatch_blocking(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
        let method = request.method();
        let url = request.url().to_string();
        let transport = Arc::clone(&self.transport);

        match self.runtime.block_on(async move { transport.execute(request).await }) {
            Ok(response) => {
                tracing::info!(
                    %method,
                    %url,
                    status = response.status_code,
                    latency_ms = response.latency_ms,
                    "Request completed"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(%method, %url, error = %e.sanitized_message(), "Request failed");
                Err(e)
            }
        }
    }

    fn dispatch_async<F>(&self, request: HttpRequest, handler: F) -> DispatchHandle
    where
        F: FnOnce(DispatchOutcome) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = self.shutdown.lock().child_token();
        let task_cancel = cancel.clone();
        let transport = Arc::clone(&self.transport);
        let method = request.method();
        let url = request.url().to_string();

        tracing::debug!(dispatch_id = id, %method, %url, "Spawning async dispatch");

        let join = self.tracker.spawn_on(
            async move {
                let outcome = tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => DispatchOutcome::Cancelled,
                    result = transport.execute(request) => match result {
                        Ok(response) => DispatchOutcome::Completed(response),
                        Err(e) => DispatchOutcome::Failed(e),
                    },
                };

                match &outcome {
                    DispatchOutcome::Completed(response) => tracing::info!(
                        dispatch_id = id,
                        %method,
                        %url,
                        status = response.status_code,
                        latency_ms = response.latency_ms,
                        "Async request completed"
                    ),
                    DispatchOutcome::Failed(e) => tracing::warn!(
                        dispatch_id = id,
                        %method,
                        %url,
                        error = %e.sanitized_message(),
                        "Async request failed"
                    ),
                    DispatchOutcome::Cancelled => {
                        tracing::info!(dispatch_id = id, %method, %url, "Async request cancelled")
                    }
                }

                handler(outcome);
            },
            self.runtime.handle(),
        );

        DispatchHandle { id, cancel, join }
    }
}

impl Drop for RequestRunner {
    fn drop(&mut self) {
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::warn!(
                pending,
                "Runner dropped with async dispatches outstanding; their handlers will not run"
            );
        }
    }
}

impl std::fmt::Debug for RequestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRunner")
            .field("pending", &self.tracker.len())
            .finish()
    }
}

/// Print a POST response: the body on exactly 200, otherwise the status
/// line `Something went wrong: <status>` and then the body.
pub fn report_response(output: &OutputSink, response: &HttpResponse) {
    if !response.is_ok() {
        output.line(format!("Something went wrong: {}", response.status()));
    }
    output.line(response.body_text());
}

/// Default completion handler for async POSTs.
///
/// Same 200 rule as [`report_response`], but a non-200 reply prints only the
/// `Something went wrong: <status>` line, without the body.
pub fn report_outcome(output: &OutputSink, outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Completed(response) if response.is_ok() => {
            output.line(response.body_text())
        }
        DispatchOutcome::Completed(response) => {
            output.line(format!("Something went wrong: {}", response.status()))
        }
        DispatchOutcome::Failed(e) => output.line(format!("Request failed: {}", e.sanitized_message())),
        DispatchOutcome::Cancelled => output.line("Request cancelled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use crate::payload::Person;
    use crate::response::HttpResponseBuilder;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    /// Answers every request with the same status and body.
    struct FixedTransport {
        status: u16,
        body: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl FixedTransport {
        fn new(status: u16, body: &'static str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let transport = Self {
                status,
                body,
                calls: calls.clone(),
            };
            (transport, calls)
        }
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn execute(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponseBuilder::new()
                .status_code(self.status)
                .body(self.body)
                .url(request.url())
                .build())
        }
    }

    /// Holds every request until the test releases a permit.
    struct GatedTransport {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn execute(&self, _request: HttpRequest) -> HttpResult<HttpResponse> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| HttpError::Connection(e.to_string()))?;
            permit.forget();
            Ok(HttpResponseBuilder::new().status_code(200).body("released").build())
        }
    }

    struct RefusingTransport;

    #[async_trait]
    impl Transport for RefusingTransport {
        async fn execute(&self, _request: HttpRequest) -> HttpResult<HttpResponse> {
            Err(HttpError::Connection("connection refused".to_string()))
        }
    }

    #[test]
    fn test_get_prints_status_then_body() {
        let (transport, calls) = FixedTransport::new(200, "<html>brave</html>");
        let (output, captured) = OutputSink::capture();
        let runner = RequestRunner::new(transport, output).unwrap();

        let response = runner.perform_get("https://brave.com").unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(captured.lines(), vec!["200", "<html>brave</html>"]);
    }

    #[test]
    fn test_sync_post_200_prints_body_only() {
        let (transport, _) = FixedTransport::new(200, "{\"saved\":true}");
        let (output, captured) = OutputSink::capture();
        let runner = RequestRunner::new(transport, output).unwrap();

        runner
            .perform_sync_post("http://localhost/people", &Person::sample())
            .unwrap();

        assert_eq!(captured.contents(), "{\"saved\":true}\n");
    }

    #[test]
    fn test_sync_post_non_200_prints_failure() {
        let (transport, _) = FixedTransport::new(201, "created");
        let (output, captured) = OutputSink::capture();
        let runner = RequestRunner::new(transport, output).unwrap();

        let response = runner
            .perform_sync_post("http://localhost/people", &Person::sample())
            .unwrap();

        assert_eq!(response.status_code, 201);
        assert_eq!(captured.lines(), vec!["Something went wrong: 201", "created"]);
    }

    #[test]
    fn test_sync_fault_propagates_without_output() {
        let (output, captured) = OutputSink::capture();
        let runner = RequestRunner::new(RefusingTransport, output).unwrap();

        let err = runner
            .perform_sync_post("http://localhost/people", &Person::sample())
            .unwrap_err();
        assert!(matches!(err, HttpError::Connection(_)));

        let err = runner.perform_get("https://brave.com").unwrap_err();
        assert!(err.is_transport_fault());

        assert!(captured.contents().is_empty());
    }

    #[test]
    fn test_async_post_returns_before_handler_runs() {
        let gate = Arc::new(Semaphore::new(0));
        let transport = GatedTransport { gate: gate.clone() };
        let (output, captured) = OutputSink::capture();
        let runner = RequestRunner::new(transport, output).unwrap();

        let handled = Arc::new(AtomicUsize::new(0));
        let handled_in_handler = handled.clone();
        let sink = runner.output().clone();
        let handle = runner
            .perform_async_post("http://localhost/people", &Person::sample(), move |outcome| {
                handled_in_handler.fetch_add(1, Ordering::SeqCst);
                report_outcome(&sink, &outcome);
            })
            .unwrap();

        // Control is back with the caller while the transport is still held.
        assert_eq!(handled.load(Ordering::SeqCst), 0);
        assert!(!handle.is_finished());
        assert_eq!(runner.pending(), 1);

        let releaser = {
            let gate = gate.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(50));
                gate.add_permits(1);
            })
        };
        assert_eq!(runner.wait_for_pending(), 1);
        releaser.join().unwrap();

        assert_eq!(handled.load(Ordering::SeqCst), 1);
        assert_eq!(runner.pending(), 0);
        assert_eq!(captured.lines(), vec!["released"]);
    }

    #[test]
    fn test_async_handler_runs_once_per_dispatch_and_prints_status_only() {
        let (transport, calls) = FixedTransport::new(500, "boom");
        let (output, captured) = OutputSink::capture();
        let runner = RequestRunner::new(transport, output).unwrap();

        let counts = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counts = counts.clone();
            let sink = runner.output().clone();
            runner
                .perform_async_post("http://localhost/people", &Person::sample(), move |outcome| {
                    counts.fetch_add(1, Ordering::SeqCst);
                    assert!(!outcome.response().unwrap().is_ok());
                    report_outcome(&sink, &outcome);
                })
                .unwrap();
        }
        runner.wait_for_pending();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(counts.load(Ordering::SeqCst), 3);
        assert_eq!(captured.lines(), vec!["Something went wrong: 500"; 3]);
    }

    #[test]
    fn test_async_non_200_omits_body() {
        let (transport, _) = FixedTransport::new(404, "missing");
        let (output, captured) = OutputSink::capture();
        let runner = RequestRunner::new(transport, output).unwrap();

        runner
            .post_json_async("http://localhost/people", &Person::sample())
            .unwrap();
        runner.wait_for_pending();

        assert_eq!(captured.lines(), vec!["Something went wrong: 404"]);
    }

    #[test]
    fn test_async_handler_runs_on_worker_thread() {
        let (transport, _) = FixedTransport::new(200, "ok");
        let runner = RequestRunner::new(transport, OutputSink::capture().0).unwrap();

        let caller = std::thread::current().id();
        let seen = Arc::new(Mutex::new(None));
        let seen_in_handler = seen.clone();
        runner
            .perform_async_post("http://localhost/people", &Person::sample(), move |_| {
                let current = std::thread::current();
                *seen_in_handler.lock() = Some((current.id(), current.name().map(str::to_string)));
            })
            .unwrap();
        runner.wait_for_pending();

        let (handler_thread, handler_name) = seen.lock().take().expect("handler did not run");
        assert_ne!(handler_thread, caller);
        assert_eq!(handler_name.as_deref(), Some("courier-worker"));
    }

    #[test]
    fn test_async_fault_is_delivered_as_outcome() {
        let (output, captured) = OutputSink::capture();
        let runner = RequestRunner::new(RefusingTransport, output).unwrap();

        runner
            .post_json_async("http://localhost/people", &Person::sample())
            .unwrap();
        runner.wait_for_pending();

        assert_eq!(
            captured.lines(),
            vec!["Request failed: Connection error: connection refused"]
        );
    }

    #[test]
    fn test_cancel_pending_reports_cancelled() {
        let gate = Arc::new(Semaphore::new(0));
        let (output, captured) = OutputSink::capture();
        let runner = RequestRunner::new(GatedTransport { gate: gate.clone() }, output).unwrap();

        runner
            .post_json_async("http://localhost/people", &Person::sample())
            .unwrap();
        runner
            .post_json_async("http://localhost/people", &Person::sample())
            .unwrap();

        assert_eq!(runner.cancel_pending(), 2);
        runner.wait_for_pending();
        assert_eq!(captured.lines(), vec!["Request cancelled", "Request cancelled"]);

        // Dispatches after a cancel are not born cancelled.
        gate.add_permits(1);
        runner
            .post_json_async("http://localhost/people", &Person::sample())
            .unwrap();
        runner.wait_for_pending();
        assert_eq!(captured.lines().last().map(String::as_str), Some("released"));
    }

    #[test]
    fn test_handle_cancel_is_scoped_to_one_dispatch() {
        let gate = Arc::new(Semaphore::new(0));
        let (output, captured) = OutputSink::capture();
        let runner = RequestRunner::new(GatedTransport { gate: gate.clone() }, output).unwrap();

        let first = runner
            .post_json_async("http://localhost/people", &Person::sample())
            .unwrap();
        let second = runner
            .post_json_async("http://localhost/people", &Person::sample())
            .unwrap();
        assert_eq!(first.id() + 1, second.id());

        first.cancel();
        gate.add_permits(1);
        runner.wait_for_pending();

        let mut lines = captured.lines();
        lines.sort();
        assert_eq!(lines, vec!["Request cancelled", "released"]);
    }

    #[test]
    fn test_wait_without_dispatches_returns_zero() {
        let (transport, _) = FixedTransport::new(200, "");
        let runner = RequestRunner::new(transport, OutputSink::capture().0).unwrap();
        assert_eq!(runner.wait_for_pending(), 0);
    }
}
