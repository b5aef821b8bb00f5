//! Executors
//!
//! An [`Executor`] decides where spawned work runs. Whatever it picks, the
//! wrappers here guarantee the promise is completed exactly once: with the
//! work's result on return, or with [`Error::PanicRecovered`] when it panics.
//! A panic never escapes into the executor.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future as StdFuture;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::{Builder, Handle};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::promise::{Promise, Settled};

/// Strategy for running spawned work
pub trait Executor: Send + Sync {
    /// Run `task` to completion, concurrently or inline
    fn execute(&self, task: BoxFuture<'static, ()>);

    /// Run `work` and complete `promise` with its result
    fn go<T, F, Fut>(&self, promise: Promise<T>, work: F)
    where
        Self: Sized,
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: StdFuture<Output = Result<T>> + Send + 'static,
    {
        launch(self, promise, async move { Settled::from(work().await) });
    }

    /// Run `work` with a scope derived from `ctx` and complete `promise`.
    ///
    /// The scope is cancelled when the work returns, fails or panics.
    fn go_context<T, F, Fut>(&self, ctx: &Context, promise: Promise<T>, work: F)
    where
        Self: Sized,
        T: Send + Sync + 'static,
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: StdFuture<Output = Result<T>> + Send + 'static,
    {
        launch_scoped(self, ctx.child(), promise, move |scope| async move {
            Settled::from(work(scope).await)
        });
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, task: BoxFuture<'static, ()>) {
        (**self).execute(task);
    }
}

pub(crate) fn launch<E, T, Fut>(executor: &E, promise: Promise<T>, work: Fut)
where
    E: Executor + ?Sized,
    T: Send + Sync + 'static,
    Fut: StdFuture<Output = Settled<T>> + Send + 'static,
{
    crate::error::record_panic_backtraces();
    executor.execute(Box::pin(async move {
        let settled = match AssertUnwindSafe(work).catch_unwind().await {
            Ok(settled) => settled,
            Err(payload) => {
                let err = Error::from_panic(payload);
                tracing::error!(error = %err, "recovered panic in spawned work");
                Settled::failure(err)
            }
        };
        promise.settle(settled);
    }));
}

/// Run `work` with `scope` itself, cancelling it on every exit path
pub(crate) fn launch_scoped<E, T, F, Fut>(executor: &E, scope: Context, promise: Promise<T>, work: F)
where
    E: Executor + ?Sized,
    T: Send + Sync + 'static,
    F: FnOnce(Context) -> Fut + Send + 'static,
    Fut: StdFuture<Output = Settled<T>> + Send + 'static,
{
    launch(executor, promise, async move {
        let guard = scope.clone().drop_guard();
        let settled = work(scope).await;
        drop(guard);
        settled
    });
}

/// Runs work on a tokio runtime.
///
/// Uses the configured handle, else the runtime of the calling thread. With
/// no runtime at all the work runs on a dedicated thread.
#[derive(Debug, Clone, Default)]
pub struct TokioExecutor {
    handle: Option<Handle>,
}

impl TokioExecutor {
    /// Spawn onto the caller's runtime
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn onto a specific runtime
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, task: BoxFuture<'static, ()>) {
        match self.handle.clone().or_else(|| Handle::try_current().ok()) {
            Some(handle) => {
                handle.spawn(task);
            }
            None => {
                tracing::debug!("no tokio runtime available, running work on a dedicated thread");
                std::thread::spawn(move || run_to_completion(task));
            }
        }
    }
}

/// Runs work to completion on the calling thread before returning.
///
/// Deterministic, for tests. Outside a tokio runtime the work is driven by a
/// private current-thread runtime, so timers and context deadlines work.
/// Tasks spawned onto that runtime and still running when the work returns
/// are dropped with it.
/// Called from inside a runtime, the work is polled directly on the calling
/// thread and must not wait on something only that runtime could provide.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, task: BoxFuture<'static, ()>) {
        run_to_completion(task);
    }
}

/// Drive `task` on the calling thread until it finishes
fn run_to_completion(task: BoxFuture<'static, ()>) {
    if Handle::try_current().is_ok() {
        // a runtime cannot be started from within another one
        futures::executor::block_on(task);
        return;
    }
    match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(task),
        Err(err) => {
            tracing::error!(error = %err, "failed to build a runtime for inline work, timers are unavailable");
            futures::executor::block_on(task);
        }
    }
}
