//! Accessors for "is the current trace sampled".
//!
//! # Design Decisions
//! - The ambient flag lives in a task-local for async code and a thread-local
//!   guard for synchronous code; the task-local wins when both are set
//! - No ambient trace means "not sampled"

use std::cell::Cell;
use std::future::Future;

/// Answers whether the current execution's active trace is marked sampled.
pub trait TraceContext: Send + Sync {
    fn is_sampled(&self) -> bool;
}

impl<F> TraceContext for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_sampled(&self) -> bool {
        self()
    }
}

tokio::task_local! {
    static TASK_SAMPLED: bool;
}

thread_local! {
    static THREAD_SAMPLED: Cell<Option<bool>> = const { Cell::new(None) };
}

/// Reads the ambient sampled flag set by [`TraceScope`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentTrace;

impl TraceContext for CurrentTrace {
    fn is_sampled(&self) -> bool {
        TASK_SAMPLED
            .try_with(|sampled| *sampled)
            .ok()
            .or_else(|| THREAD_SAMPLED.with(Cell::get))
            .unwrap_or(false)
    }
}

/// Marks the sampled flag of the trace the caller is executing in.
pub struct TraceScope;

impl TraceScope {
    /// Set the flag on this thread until the guard drops.
    pub fn enter(sampled: bool) -> TraceScopeGuard {
        let previous = THREAD_SAMPLED.with(|cell| cell.replace(Some(sampled)));
        TraceScopeGuard { previous }
    }

    /// Run `future` with the flag set for the whole task, across awaits.
    pub async fn scope<F: Future>(sampled: bool, future: F) -> F::Output {
        TASK_SAMPLED.scope(sampled, future).await
    }
}

/// Restores the previous thread-local flag on drop.
pub struct TraceScopeGuard {
    previous: Option<bool>,
}

impl Drop for TraceScopeGuard {
    fn drop(&mut self) {
        THREAD_SAMPLED.with(|cell| cell.set(self.previous));
    }
}
