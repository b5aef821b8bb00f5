//! Read side of a future/promise pair
//!
//! A [`Future`] is a cheap, cloneable handle. Any number of readers, on any
//! thread, may await it; all of them observe the same outcome, the one
//! stored by the winning fulfilment.
//!
//! Awaiting with a [`Context`] only bounds the wait: a cancelled context
//! unblocks the reader without touching the outcome or the work producing
//! it. To stop the work itself, spawn it with [`Future::spawn_context`] and
//! cancel the context or the future.

use futures::Stream;
use futures::future::BoxFuture;
use std::future::{Future as StdFuture, IntoFuture};
use std::sync::Arc;

use crate::context::Context;
use crate::error::{ContextError, Error, Result};
use crate::executor::{self, Executor, TokioExecutor};
use crate::promise::{Cell, Promise, Settled};
use crate::try_value::Try;

/// Read handle on a one-shot cell
pub struct Future<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> std::fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Future")
            .field("ready", &self.is_ready())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl<T> Future<T> {
    pub(crate) fn from_cell(cell: Arc<Cell<T>>) -> Self {
        Self { cell }
    }

    /// A pending pair with no work attached; complete it through the promise
    pub fn pair() -> (Self, Promise<T>) {
        let cell = Arc::new(Cell::new());
        (Self::from_cell(Arc::clone(&cell)), Promise::new(cell))
    }

    /// A pending pair whose cancellation runs `on_cancel`
    pub fn pair_with_cancel<F>(on_cancel: F) -> (Self, Promise<T>)
    where
        F: FnOnce() + Send + 'static,
    {
        let (future, promise) = Self::pair();
        promise.on_cancel(on_cancel);
        (future, promise)
    }

    /// A future that already failed with `err`
    pub fn failed(err: Error) -> Self {
        let (future, promise) = Self::pair();
        promise.failure(err);
        future
    }

    /// A future that already succeeded with `value`
    pub fn completed(value: T) -> Self {
        let (future, promise) = Self::pair();
        promise.success(value);
        future
    }

    /// Whether an outcome is stored
    pub fn is_ready(&self) -> bool {
        self.cell.outcome.borrow().is_some()
    }

    /// Cancel the associated promise, running whatever cancellation callback
    /// was attached. Without one, the work keeps running and may still
    /// complete normally.
    pub fn cancel(&self) {
        self.cell.cancel();
    }

    /// Snapshot of the promise's cancellation bit
    pub fn is_cancelled(&self) -> bool {
        self.cell.is_cancelled()
    }
}

impl<T: Send + Sync + 'static> Future<T> {
    /// Run `work` on the default executor
    pub fn spawn<F, Fut>(work: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: StdFuture<Output = Result<T>> + Send + 'static,
    {
        Self::spawn_with(&TokioExecutor::default(), work)
    }

    /// Run `work` on `executor`
    pub fn spawn_with<E, F, Fut>(executor: &E, work: F) -> Self
    where
        E: Executor,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: StdFuture<Output = Result<T>> + Send + 'static,
    {
        let (future, promise) = Self::pair();
        executor.go(promise, work);
        future
    }

    /// Run `work` on the default executor with a child of `ctx`.
    ///
    /// The child is the only scope created for the work. It is cancelled
    /// when the work finishes, and by [`Future::cancel`] on the returned
    /// future.
    pub fn spawn_context<F, Fut>(ctx: &Context, work: F) -> Self
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: StdFuture<Output = Result<T>> + Send + 'static,
    {
        Self::spawn_context_with(&TokioExecutor::default(), ctx, work)
    }

    /// [`Future::spawn_context`] on `executor`
    pub fn spawn_context_with<E, F, Fut>(executor: &E, ctx: &Context, work: F) -> Self
    where
        E: Executor,
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: StdFuture<Output = Result<T>> + Send + 'static,
    {
        let (scope, handle) = ctx.with_cancel();
        let (future, promise) = Self::pair_with_cancel(move || handle.cancel());
        executor::launch_scoped(executor, scope, promise, move |scope| async move {
            Settled::from(work(scope).await)
        });
        future
    }

    pub(crate) fn spawn_settled_with<E, Fut>(executor: &E, work: Fut) -> Self
    where
        E: Executor,
        Fut: StdFuture<Output = Settled<T>> + Send + 'static,
    {
        let (future, promise) = Self::pair();
        executor::launch(executor, promise, work);
        future
    }

    pub(crate) fn spawn_context_settled_with<E, F, Fut>(
        executor: &E,
        ctx: &Context,
        work: F,
    ) -> Self
    where
        E: Executor,
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: StdFuture<Output = Settled<T>> + Send + 'static,
    {
        let (scope, handle) = ctx.with_cancel();
        let (future, promise) = Self::pair_with_cancel(move || handle.cancel());
        executor::launch_scoped(executor, scope, promise, work);
        future
    }
}

impl<T: Clone> Future<T> {
    /// The stored carrier, if the pair has settled
    pub fn try_settled(&self) -> Option<Settled<T>> {
        self.cell.outcome.borrow().clone()
    }

    /// Wait for the full carrier, including any partial value kept next to
    /// a failure
    pub async fn settled(&self) -> Settled<T> {
        let mut rx = self.cell.outcome.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(settled) = current {
                return settled;
            }
            if rx.changed().await.is_err() {
                return Settled::failure(Error::BrokenPromise);
            }
        }
    }

    /// Wait for the outcome. Repeated calls return the same outcome.
    pub async fn result(&self) -> Result<T> {
        self.settled().await.outcome.into_result()
    }

    /// Wait for the outcome or for `ctx` to be done, whichever is first.
    ///
    /// An outcome that is already stored is returned even when `ctx` is
    /// done. Otherwise a done context yields its [`ContextError`].
    pub async fn await_context(&self, ctx: &Context) -> Result<T> {
        if let Some(settled) = self.try_settled() {
            return settled.outcome.into_result();
        }
        tokio::select! {
            biased;
            settled = self.settled() => settled.outcome.into_result(),
            _ = ctx.done() => Err(ctx.err().unwrap_or(ContextError::Cancelled).into()),
        }
    }

    /// Block the current thread until the outcome is known.
    ///
    /// Must not be called from inside an async task.
    pub fn wait(&self) -> Result<T> {
        futures::executor::block_on(self.result())
    }
}

impl<T: Clone + Send + Sync + 'static> Future<T> {
    /// A lazy stream yielding the outcome once, then ending
    pub fn stream(&self) -> impl Stream<Item = Try<T>> + Send + 'static {
        let this = self.clone();
        futures::stream::once(async move { this.settled().await.outcome })
    }

    /// Like [`Future::stream`], racing the outcome against `ctx`
    pub fn stream_context(&self, ctx: &Context) -> impl Stream<Item = Try<T>> + Send + 'static {
        let this = self.clone();
        let ctx = ctx.clone();
        futures::stream::once(async move { Try::from(this.await_context(&ctx).await) })
    }
}

impl<T: Clone + Send + Sync + 'static> IntoFuture for Future<T> {
    type Output = Result<T>;
    type IntoFuture = BoxFuture<'static, Result<T>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.result().await })
    }
}

impl<'a, T: Clone + Send + Sync + 'static> IntoFuture for &'a Future<T> {
    type Output = Result<T>;
    type IntoFuture = BoxFuture<'a, Result<T>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use futures::StreamExt;
    use std::time::Duration;

    #[tokio::test]
    async fn test_pair_completed_later() {
        let (future, promise) = Future::<i32>::pair();
        assert!(!future.is_ready());
        let reader = {
            let future = future.clone();
            tokio::spawn(async move { future.result().await })
        };
        promise.success(3);
        assert_eq!(reader.await.unwrap().unwrap(), 3);
        assert!(future.is_ready());
    }

    #[tokio::test]
    async fn test_repeated_awaits_are_identical() {
        let err = Error::work("once");
        let future = Future::<i32>::failed(err.clone());
        assert_eq!(future.result().await, Err(err.clone()));
        assert_eq!(future.result().await, Err(err));
    }

    #[tokio::test]
    async fn test_into_future() {
        let future = Future::completed("done".to_string());
        assert_eq!((&future).await.unwrap(), "done");
        assert_eq!(future.await.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_spawn() {
        let future = Future::<i32>::spawn(|| async { Ok(21 * 2) });
        assert_eq!(future.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_await_context_cancelled_leaves_outcome_alone() {
        let (future, promise) = Future::<i32>::pair();
        let ctx = Context::background();
        ctx.cancel();

        let err = future.await_context(&ctx).await.unwrap_err();
        assert_eq!(err.context_error(), Some(ContextError::Cancelled));
        assert!(!future.is_ready());

        promise.success(1);
        assert_eq!(future.result().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_await_context_prefers_stored_outcome() {
        let future = Future::completed(5);
        let ctx = Context::background();
        ctx.cancel();
        assert_eq!(future.await_context(&ctx).await.unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_context_deadline() {
        let (future, _promise) = Future::<i32>::pair();
        let ctx = Context::background().with_timeout(Duration::from_millis(50));
        let err = future.await_context(&ctx).await.unwrap_err();
        assert_eq!(err.context_error(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_stream_yields_once() {
        let future = Future::completed(8);
        let items: Vec<Try<i32>> = future.stream().collect().await;
        assert_eq!(items, vec![Try::success(8)]);
    }

    #[tokio::test]
    async fn test_stream_context_cancelled() {
        let (future, _promise) = Future::<i32>::pair();
        let ctx = Context::background();
        ctx.cancel();
        let items: Vec<Try<i32>> = future.stream_context(&ctx).collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].err().and_then(Error::context_error),
            Some(ContextError::Cancelled)
        );
    }

    #[test]
    fn test_cancel_without_callback_is_noop_for_work() {
        let (future, promise) = Future::<i32>::pair();
        future.cancel();
        assert!(future.is_cancelled());
        promise.success(4);
        assert_eq!(future.wait().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_cancel_reaches_spawned_context() {
        let ctx = Context::background();
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let future = Future::<&'static str>::spawn_context(&ctx, |scope| async move {
            let _ = started_tx.send(());
            scope.done().await;
            Ok("stopped")
        });
        started_rx.await.unwrap();
        future.cancel();
        assert_eq!(future.result().await.unwrap(), "stopped");
        assert!(!ctx.is_done());
    }

    #[test]
    fn test_spawn_context_uses_a_single_scope() {
        let ctx = Context::background();
        let future =
            Future::<Context>::spawn_context_with(&InlineExecutor, &ctx, |scope| async move {
                Ok(scope)
            });
        let scope = future.wait().unwrap();
        assert!(scope.is_child_of(&ctx));
        assert!(scope.is_done());
        assert!(!ctx.is_done());
    }

    #[test]
    fn test_spawn_context_inline() {
        let ctx = Context::background();
        let future =
            Future::<bool>::spawn_context_with(&InlineExecutor, &ctx, |scope| async move {
                Ok(scope.is_done())
            });
        assert!(!future.wait().unwrap());
    }
}
