//! Future combinators
//!
//! Every combinator comes in four flavours:
//!
//! | plain | context-aware | executor-injected | both |
//! |---|---|---|---|
//! | [`map`] | [`map_context`] | [`map_with`] | [`map_context_with`] |
//! | [`flat_map`] | [`flat_map_context`] | [`flat_map_with`] | [`flat_map_context_with`] |
//! | [`combine`] | [`combine_context`] | [`combine_with`] | [`combine_context_with`] |
//! | [`combine_collect_errors`] | [`combine_collect_errors_context`] | [`combine_collect_errors_with`] | [`combine_collect_errors_context_with`] |
//!
//! Plain variants run on [`TokioExecutor`]. Context-aware variants stop
//! waiting as soon as the context is done and fail with its error; the
//! inputs themselves keep running. Errors from inputs are passed through
//! unchanged.

use crate::context::Context;
use crate::error::{AggregateError, Error, Result};
use crate::executor::{Executor, TokioExecutor};
use crate::future::Future;
use crate::promise::Settled;

/// Apply `f` to the value of `future`. A failed input skips `f`.
pub fn map<A, B, F>(future: &Future<A>, f: F) -> Future<B>
where
    A: Clone + Send + Sync + 'static,
    B: Send + Sync + 'static,
    F: FnOnce(A) -> Result<B> + Send + 'static,
{
    map_with(&TokioExecutor::default(), future, f)
}

/// [`map`] on `executor`
pub fn map_with<E, A, B, F>(executor: &E, future: &Future<A>, f: F) -> Future<B>
where
    E: Executor,
    A: Clone + Send + Sync + 'static,
    B: Send + Sync + 'static,
    F: FnOnce(A) -> Result<B> + Send + 'static,
{
    let input = future.clone();
    Future::spawn_with(executor, move || async move { f(input.result().await?) })
}

/// [`map`] bounded by `ctx`
pub fn map_context<A, B, F>(ctx: &Context, future: &Future<A>, f: F) -> Future<B>
where
    A: Clone + Send + Sync + 'static,
    B: Send + Sync + 'static,
    F: FnOnce(A) -> Result<B> + Send + 'static,
{
    map_context_with(&TokioExecutor::default(), ctx, future, f)
}

/// [`map_context`] on `executor`
pub fn map_context_with<E, A, B, F>(
    executor: &E,
    ctx: &Context,
    future: &Future<A>,
    f: F,
) -> Future<B>
where
    E: Executor,
    A: Clone + Send + Sync + 'static,
    B: Send + Sync + 'static,
    F: FnOnce(A) -> Result<B> + Send + 'static,
{
    let input = future.clone();
    Future::spawn_context_with(executor, ctx, move |ctx| async move {
        f(input.await_context(&ctx).await?)
    })
}

/// Chain a computation that itself returns a future
pub fn flat_map<A, B, F>(future: &Future<A>, f: F) -> Future<B>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    F: FnOnce(A) -> Future<B> + Send + 'static,
{
    flat_map_with(&TokioExecutor::default(), future, f)
}

/// [`flat_map`] on `executor`
pub fn flat_map_with<E, A, B, F>(executor: &E, future: &Future<A>, f: F) -> Future<B>
where
    E: Executor,
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    F: FnOnce(A) -> Future<B> + Send + 'static,
{
    let input = future.clone();
    Future::spawn_with(executor, move || async move {
        let next = f(input.result().await?);
        next.result().await
    })
}

/// [`flat_map`] bounded by `ctx`
pub fn flat_map_context<A, B, F>(ctx: &Context, future: &Future<A>, f: F) -> Future<B>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    F: FnOnce(A) -> Future<B> + Send + 'static,
{
    flat_map_context_with(&TokioExecutor::default(), ctx, future, f)
}

/// [`flat_map_context`] on `executor`
pub fn flat_map_context_with<E, A, B, F>(
    executor: &E,
    ctx: &Context,
    future: &Future<A>,
    f: F,
) -> Future<B>
where
    E: Executor,
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    F: FnOnce(A) -> Future<B> + Send + 'static,
{
    let input = future.clone();
    Future::spawn_context_with(executor, ctx, move |ctx| async move {
        let next = f(input.await_context(&ctx).await?);
        next.await_context(&ctx).await
    })
}

/// Await `futures` in order and collect their values. The first failure
/// wins and later inputs are not awaited.
pub fn combine<T>(futures: &[Future<T>]) -> Future<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    combine_with(&TokioExecutor::default(), futures)
}

/// [`combine`] on `executor`
pub fn combine_with<E, T>(executor: &E, futures: &[Future<T>]) -> Future<Vec<T>>
where
    E: Executor,
    T: Clone + Send + Sync + 'static,
{
    let inputs = futures.to_vec();
    Future::spawn_with(executor, move || async move {
        let mut values = Vec::with_capacity(inputs.len());
        for input in &inputs {
            values.push(input.result().await?);
        }
        Ok(values)
    })
}

/// [`combine`] bounded by `ctx`, checked before every input
pub fn combine_context<T>(ctx: &Context, futures: &[Future<T>]) -> Future<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    combine_context_with(&TokioExecutor::default(), ctx, futures)
}

/// [`combine_context`] on `executor`
pub fn combine_context_with<E, T>(
    executor: &E,
    ctx: &Context,
    futures: &[Future<T>],
) -> Future<Vec<T>>
where
    E: Executor,
    T: Clone + Send + Sync + 'static,
{
    let inputs = futures.to_vec();
    Future::spawn_context_with(executor, ctx, move |ctx| async move {
        let mut values = Vec::with_capacity(inputs.len());
        for input in &inputs {
            if let Some(err) = ctx.err() {
                return Err(err.into());
            }
            values.push(input.await_context(&ctx).await?);
        }
        Ok(values)
    })
}

/// Await every input. If any failed, the result is an
/// [`Error::Aggregate`] of their errors in input order; the collected values
/// (`T::default()` in failed slots) stay available through
/// [`Future::settled`].
pub fn combine_collect_errors<T>(futures: &[Future<T>]) -> Future<Vec<T>>
where
    T: Clone + Default + Send + Sync + 'static,
{
    combine_collect_errors_with(&TokioExecutor::default(), futures)
}

/// [`combine_collect_errors`] on `executor`
pub fn combine_collect_errors_with<E, T>(executor: &E, futures: &[Future<T>]) -> Future<Vec<T>>
where
    E: Executor,
    T: Clone + Default + Send + Sync + 'static,
{
    let inputs = futures.to_vec();
    Future::spawn_settled_with(executor, async move {
        let mut collected = Collected::with_capacity(inputs.len());
        for input in &inputs {
            collected.push(input.result().await);
        }
        collected.finish()
    })
}

/// [`combine_collect_errors`] bounded by `ctx`. Input failures are
/// collected, but a done context ends the wait immediately.
pub fn combine_collect_errors_context<T>(ctx: &Context, futures: &[Future<T>]) -> Future<Vec<T>>
where
    T: Clone + Default + Send + Sync + 'static,
{
    combine_collect_errors_context_with(&TokioExecutor::default(), ctx, futures)
}

/// [`combine_collect_errors_context`] on `executor`
pub fn combine_collect_errors_context_with<E, T>(
    executor: &E,
    ctx: &Context,
    futures: &[Future<T>],
) -> Future<Vec<T>>
where
    E: Executor,
    T: Clone + Default + Send + Sync + 'static,
{
    let inputs = futures.to_vec();
    Future::spawn_context_settled_with(executor, ctx, move |ctx| async move {
        let mut collected = Collected::with_capacity(inputs.len());
        for input in &inputs {
            if let Some(err) = ctx.err() {
                return Settled::failure(err.into());
            }
            let result = input.await_context(&ctx).await;
            if result.is_err()
                && let Some(err) = ctx.err()
            {
                return Settled::failure(err.into());
            }
            collected.push(result);
        }
        collected.finish()
    })
}

struct Collected<T> {
    values: Vec<T>,
    errors: Vec<Error>,
}

impl<T: Default> Collected<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            errors: Vec::new(),
        }
    }

    fn push(&mut self, result: Result<T>) {
        match result {
            Ok(value) => self.values.push(value),
            Err(err) => {
                self.values.push(T::default());
                self.errors.push(err);
            }
        }
    }

    fn finish(self) -> Settled<Vec<T>> {
        if self.errors.is_empty() {
            return Settled::success(self.values);
        }
        tracing::debug!(failures = self.errors.len(), "combined futures failed");
        Settled::failure_with_partial(AggregateError::new(self.errors).into(), self.values)
    }
}
