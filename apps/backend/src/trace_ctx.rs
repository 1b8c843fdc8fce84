//! Task-local trace context for web requests.
//!
//! Exposes the current request's trace_id to any code running inside the
//! request's task, without threading it through call signatures. The scope is
//! established by the request tracing middleware; everything below it (error
//! rendering, structured logs) reads the value through `trace_id()`.

use std::cell::RefCell;

use tokio::task_local;

task_local! {
    static TRACE_ID: RefCell<Option<String>>;
}

/// Get the trace_id for the current task.
/// Returns "unknown" when called outside of a request scope.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(|cell| {
            cell.borrow()
                .as_ref()
                .cloned()
                .unwrap_or_else(|| "unknown".to_string())
        })
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Run a future with the given trace_id in scope.
/// Middleware calls this once per request; nesting shadows the outer value.
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRACE_ID.scope(RefCell::new(Some(trace_id)), future).await
}
