//! Cancellation and deadline handle
//!
//! A [`Context`] is threaded through asynchronous operations. It becomes
//! *done* when it is cancelled (directly or through any ancestor) or when
//! its deadline passes; [`Context::err`] then says which.
//!
//! Cancellation flows downwards only: cancelling a child never affects its
//! parent. Built on [`tokio_util::sync::CancellationToken`].

use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ContextError;

struct Inner {
    token: CancellationToken,
    deadline: Option<Instant>,
    reason: OnceLock<ContextError>,
    parent: Option<Context>,
}

/// Cloneable cancellation and deadline handle
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// A root context that is never done unless cancelled explicitly
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                deadline: None,
                reason: OnceLock::new(),
                parent: None,
            }),
        }
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        let deadline = match (self.inner.deadline, deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            inner: Arc::new(Inner {
                token: self.inner.token.child_token(),
                deadline,
                reason: OnceLock::new(),
                parent: Some(self.clone()),
            }),
        }
    }

    /// A child that is done whenever `self` is, and can be cancelled on its own
    pub fn child(&self) -> Self {
        self.derive(None)
    }

    /// A child plus a handle that cancels it
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let child = self.child();
        let handle = CancelHandle(child.clone());
        (child, handle)
    }

    /// A child that is done once `deadline` passes
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        self.derive(Some(deadline))
    }

    /// A child that is done after `timeout`
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Cancel this context and every context derived from it.
    /// No-op when already cancelled.
    pub fn cancel(&self) {
        let reason = self.err().unwrap_or(ContextError::Cancelled);
        let _ = self.inner.reason.set(reason);
        self.inner.token.cancel();
    }

    /// The effective deadline, inherited from ancestors
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Why the context is done, or `None` while it is live
    pub fn err(&self) -> Option<ContextError> {
        if let Some(reason) = self.inner.reason.get() {
            return Some(*reason);
        }
        if let Some(reason) = self.inner.parent.as_ref().and_then(Context::err) {
            return Some(reason);
        }
        if self.inner.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(ContextError::DeadlineExceeded);
        }
        if self.inner.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        None
    }

    /// Whether the context is done
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Completes once the context is done
    pub async fn done(&self) {
        match self.inner.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.inner.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.inner.token.cancelled().await,
        }
    }

    /// The underlying token, for integration with tokio-util based code
    pub fn token(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    #[cfg(test)]
    pub(crate) fn is_child_of(&self, other: &Context) -> bool {
        self.inner
            .parent
            .as_ref()
            .is_some_and(|parent| Arc::ptr_eq(&parent.inner, &other.inner))
    }

    /// A guard that cancels this context when dropped
    pub fn drop_guard(self) -> ContextGuard {
        ContextGuard(Some(self))
    }
}

/// Cancels the context it was created from
#[derive(Debug, Clone)]
pub struct CancelHandle(Context);

impl CancelHandle {
    /// Cancel the associated context
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

/// Cancels its context on drop, on every exit path including unwinding
#[derive(Debug)]
pub struct ContextGuard(Option<Context>);

impl ContextGuard {
    /// Keep the context alive; the guard no longer cancels it
    pub fn disarm(mut self) -> Context {
        self.0.take().unwrap_or_default()
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if let Some(ctx) = self.0.take() {
            ctx.cancel();
        }
    }
}
