//! Try values
//!
//! [`Try`] is an immutable carrier of either a success value or an
//! [`Error`]. It is what a future settles to and what its stream yields.

use crate::error::{Error, Result};

/// Either a success value or an error
#[derive(Debug, Clone, PartialEq)]
pub enum Try<T> {
    /// Computation produced a value
    Success(T),
    /// Computation failed
    Failure(Error),
}

impl<T> Try<T> {
    /// A successful carrier
    pub fn success(value: T) -> Self {
        Try::Success(value)
    }

    /// A failed carrier
    pub fn failure(err: Error) -> Self {
        Try::Failure(err)
    }

    /// Whether this holds a value
    pub fn is_success(&self) -> bool {
        matches!(self, Try::Success(_))
    }

    /// Whether this holds an error
    pub fn is_failure(&self) -> bool {
        matches!(self, Try::Failure(_))
    }

    /// Split into `(value, error)`; a failure yields `T::default()` as value
    pub fn unpack(self) -> (T, Option<Error>)
    where
        T: Default,
    {
        match self {
            Try::Success(value) => (value, None),
            Try::Failure(err) => (T::default(), Some(err)),
        }
    }

    /// The value, or `default` on failure
    pub fn get_or_else(self, default: T) -> T {
        match self {
            Try::Success(value) => value,
            Try::Failure(_) => default,
        }
    }

    /// The error, if any
    pub fn err(&self) -> Option<&Error> {
        match self {
            Try::Success(_) => None,
            Try::Failure(err) => Some(err),
        }
    }

    /// Apply `f` to a success value. A failure is carried over and `f` is
    /// never called.
    pub fn map<U, F>(self, f: F) -> Try<U>
    where
        F: FnOnce(T) -> Result<U>,
    {
        match self {
            Try::Success(value) => f(value).into(),
            Try::Failure(err) => Try::Failure(err),
        }
    }

    /// Like [`Try::map`] for functions that already return a `Try`
    pub fn flat_map<U, F>(self, f: F) -> Try<U>
    where
        F: FnOnce(T) -> Try<U>,
    {
        match self {
            Try::Success(value) => f(value),
            Try::Failure(err) => Try::Failure(err),
        }
    }

    /// Convert into a standard `Result`
    pub fn into_result(self) -> Result<T> {
        self.into()
    }
}

impl<T> From<Result<T>> for Try<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Try::Success(value),
            Err(err) => Try::Failure(err),
        }
    }
}

impl<T> From<Try<T>> for Result<T> {
    fn from(value: Try<T>) -> Self {
        match value {
            Try::Success(value) => Ok(value),
            Try::Failure(err) => Err(err),
        }
    }
}
