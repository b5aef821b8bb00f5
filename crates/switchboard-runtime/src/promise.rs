//! Write side of a future/promise pair
//!
//! A pair shares one cell. The cell holds:
//!
//! - the outcome slot, written at most once and broadcast to every reader
//!   through a `tokio::sync::watch` channel
//! - a cancellation bit, flipped at most once, and the callbacks that run
//!   when it flips
//!
//! Fulfilment and cancellation are independent: a promise can be cancelled
//! before, during or after it is fulfilled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::future::Future;
use crate::try_value::Try;

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Everything stored when a pair settles
#[derive(Debug, Clone, PartialEq)]
pub struct Settled<T> {
    /// What readers observe
    pub outcome: Try<T>,
    /// A value kept alongside a failed outcome (collected results when some
    /// inputs of a combine failed)
    pub partial: Option<T>,
}

impl<T> Settled<T> {
    /// Settled with a value
    pub fn success(value: T) -> Self {
        Self {
            outcome: Try::Success(value),
            partial: None,
        }
    }

    /// Settled with an error
    pub fn failure(err: Error) -> Self {
        Self {
            outcome: Try::Failure(err),
            partial: None,
        }
    }

    /// Settled with an error, keeping `partial` for inspection
    pub fn failure_with_partial(err: Error, partial: T) -> Self {
        Self {
            outcome: Try::Failure(err),
            partial: Some(partial),
        }
    }
}

impl<T> From<Result<T>> for Settled<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(err) => Self::failure(err),
        }
    }
}

pub(crate) struct Cell<T> {
    pub(crate) outcome: watch::Sender<Option<Settled<T>>>,
    cancelled: AtomicBool,
    callbacks: Mutex<Vec<Callback>>,
}

impl<T> Cell<T> {
    pub(crate) fn new() -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            outcome,
            cancelled: AtomicBool::new(false),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Store `settled` if the slot is still empty; returns whether it was
    pub(crate) fn settle(&self, settled: Settled<T>) -> bool {
        let mut settled = Some(settled);
        self.outcome.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = settled.take();
            true
        })
    }

    pub(crate) fn cancel(&self) {
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let callbacks = std::mem::take(
            &mut *self
                .callbacks
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        tracing::debug!(callbacks = callbacks.len(), "promise cancelled");
        for callback in callbacks {
            callback();
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn on_cancel(&self, callback: Callback) {
        let mut callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_cancelled() {
            drop(callbacks);
            callback();
        } else {
            callbacks.push(callback);
        }
    }
}

struct Writer<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Drop for Writer<T> {
    fn drop(&mut self) {
        if self.cell.settle(Settled::failure(Error::BrokenPromise)) {
            tracing::warn!("promise dropped without being fulfilled");
        }
    }
}

/// Write side of a one-shot cell.
///
/// Clones share the same cell, so several producers may race to fulfil it;
/// exactly one wins and the rest are no-ops. When every clone is dropped
/// without fulfilling, readers observe [`Error::BrokenPromise`].
pub struct Promise<T> {
    writer: Arc<Writer<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<T> std::fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise")
            .field("fulfilled", &self.is_fulfilled())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl<T> Promise<T> {
    pub(crate) fn new(cell: Arc<Cell<T>>) -> Self {
        Self {
            writer: Arc::new(Writer { cell }),
        }
    }

    fn cell(&self) -> &Cell<T> {
        &self.writer.cell
    }

    /// Fulfil with a value. Returns `false` when already fulfilled.
    pub fn success(&self, value: T) -> bool {
        self.settle(Settled::success(value))
    }

    /// Fulfil with an error. Returns `false` when already fulfilled.
    pub fn failure(&self, err: Error) -> bool {
        self.settle(Settled::failure(err))
    }

    /// Fulfil from a `Result`
    pub fn complete(&self, result: Result<T>) -> bool {
        self.settle(result.into())
    }

    /// Fulfil with a full carrier
    pub fn settle(&self, settled: Settled<T>) -> bool {
        self.cell().settle(settled)
    }

    /// Whether some fulfilment already happened
    pub fn is_fulfilled(&self) -> bool {
        self.cell().outcome.borrow().is_some()
    }

    /// Flip the cancellation bit and run the registered callbacks once, in
    /// registration order, before returning. No-op when already cancelled.
    pub fn cancel(&self) {
        self.cell().cancel();
    }

    /// Snapshot of the cancellation bit
    pub fn is_cancelled(&self) -> bool {
        self.cell().is_cancelled()
    }

    /// Register a cancellation callback. Runs immediately when the promise
    /// is already cancelled.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cell().on_cancel(Box::new(callback));
    }

    /// A read handle on the same cell
    pub fn future(&self) -> Future<T> {
        Future::from_cell(Arc::clone(&self.writer.cell))
    }
}
