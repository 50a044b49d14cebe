//! Outcome and handle types for asynchronous dispatch

use crate::error::HttpError;
use crate::response::HttpResponse;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What a completion handler receives. Exactly one per dispatch.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A response arrived, whatever its status
    Completed(HttpResponse),
    /// The transport failed before a response was read
    Failed(HttpError),
    /// The dispatch was cancelled before it completed
    Cancelled,
}

impl DispatchOutcome {
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            DispatchOutcome::Completed(response) => Some(response),
            _ => None,
        }
    }
}

/// Returned by the runner as soon as an async dispatch is spawned.
///
/// Dropping the handle does not cancel the dispatch.
#[derive(Debug)]
pub struct DispatchHandle {
    pub(crate) id: u64,
    pub(crate) cancel: CancellationToken,
    pub(crate) join: JoinHandle<()>,
}

impl DispatchHandle {
    /// Runner-local sequence number, starting at 1.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancel this dispatch only. Its handler still runs, with
    /// [`DispatchOutcome::Cancelled`], unless it already ran.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the handler has returned.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
