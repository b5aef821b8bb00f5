//! Error types for switchboard-runtime
//!
//! A settled outcome is handed to every reader of a future, so [`Error`] is
//! cheap to clone: caller errors are shared behind an `Arc`.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, Once};
use thiserror::Error;

/// Result type alias for switchboard-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors observed when awaiting a future
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Spawned work panicked; the panic was caught at the executor boundary
    #[error("panic recovered: {message}")]
    PanicRecovered {
        /// Panic payload rendered as text
        message: String,
        /// Stack captured where the panic was raised, or where it was caught
        /// when no panic-time capture was recorded
        backtrace: Arc<str>,
    },

    /// The awaiting context was cancelled or ran past its deadline
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Several input futures failed
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// Every handle to the write side was dropped before fulfilment
    #[error("promise dropped without being fulfilled")]
    BrokenPromise,

    /// Error returned by caller work
    #[error(transparent)]
    Work(Arc<dyn StdError + Send + Sync + 'static>),
}

impl Error {
    /// Wrap an arbitrary error (or message) produced by caller work
    pub fn work<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Error::Work(Arc::from(err.into()))
    }

    /// Build a [`Error::PanicRecovered`] from a caught panic payload
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        let backtrace = PANIC_BACKTRACE
            .try_with(|slot| slot.borrow_mut().take())
            .ok()
            .flatten()
            .unwrap_or_else(|| Backtrace::force_capture().to_string());
        Error::PanicRecovered {
            message,
            backtrace: Arc::from(backtrace),
        }
    }

    /// Whether this error came from a recovered panic
    pub fn is_panic(&self) -> bool {
        matches!(self, Error::PanicRecovered { .. })
    }

    /// The context error, when this is one
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            Error::Context(err) => Some(*err),
            _ => None,
        }
    }

    /// Downcast a [`Error::Work`] payload
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Error::Work(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

thread_local! {
    static PANIC_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a panic hook that records the panicking thread's stack, so a
/// recovered panic reports the frame that raised it. Installed once.
pub(crate) fn record_panic_backtraces() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::force_capture().to_string();
            let _ = PANIC_BACKTRACE.try_with(|slot| *slot.borrow_mut() = Some(backtrace));
            previous(info);
        }));
    });
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::work(err)
    }
}

/// Identity comparison: work errors are equal only when they share the same
/// allocation, so a clone handed through a combinator chain still compares
/// equal to the error the work returned.
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::Work(a), Error::Work(b)) => Arc::ptr_eq(a, b),
            (Error::PanicRecovered { message: a, .. }, Error::PanicRecovered { message: b, .. }) => {
                a == b
            }
            (Error::Context(a), Error::Context(b)) => a == b,
            (Error::Aggregate(a), Error::Aggregate(b)) => a.errors == b.errors,
            (Error::BrokenPromise, Error::BrokenPromise) => true,
            _ => false,
        }
    }
}

/// Why a [`crate::Context`] is done
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// Cancelled explicitly, or through a parent
    #[error("context canceled")]
    Cancelled,

    /// The deadline passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Ordered collection of errors from several futures
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateError {
    errors: Vec<Error>,
}

impl AggregateError {
    /// Aggregate `errors`, keeping their order
    pub fn new(errors: Vec<Error>) -> Self {
        Self { errors }
    }

    /// The underlying errors
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Number of underlying errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing was aggregated
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Take the underlying errors
    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) occurred", self.errors.len())?;
        for (i, err) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, err)?;
        }
        Ok(())
    }
}

impl StdError for AggregateError {}
