//! Switchboard Runtime
//!
//! Asynchronous result pipeline used alongside the provider catalog:
//! - [`Try`] values carrying a success or an error
//! - One-shot [`Promise`]/[`Future`] pairs that many readers can await
//! - A [`Context`] cancellation and deadline handle
//! - Pluggable [`Executor`]s that turn panics into errors
//! - Combinators composing futures (`map`, `flat_map`, `combine`, ...)
//!
//! # Usage
//!
//! ```rust,ignore
//! use switchboard_runtime::{Future, combinators};
//!
//! let answer = Future::<i32>::spawn(|| async { Ok(21) });
//! let doubled = combinators::map(&answer, |v| Ok(v * 2));
//! assert_eq!(doubled.await?, 42);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod combinators;
pub mod context;
pub mod error;
pub mod executor;
pub mod future;
pub mod promise;
pub mod try_value;

pub use context::{CancelHandle, Context, ContextGuard};
pub use error::{AggregateError, ContextError, Error, Result};
pub use executor::{Executor, InlineExecutor, TokioExecutor};
pub use future::Future;
pub use promise::{Promise, Settled};
pub use try_value::Try;
