//! Error types for reading from a store's state stream.

use thiserror::Error;

/// Errors returned when reading from a [`Subscription`](crate::Subscription).
///
/// Failures of the update functions themselves are never wrapped in this
/// type: [`Store::try_update`](crate::Store::try_update) hands the caller's own
/// error back untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No state has been published since the last read.
    #[error("no pending state")]
    Empty,

    /// The store was dropped and every published state has been read.
    #[error("store closed")]
    Closed,
}

/// Result type for subscription reads.
///
/// Only covers [`Subscription`](crate::Subscription) reads; fallible updates
/// return the caller's own error type.
pub type Result<T> = core::result::Result<T, StoreError>;

impl From<flume::TryRecvError> for StoreError {
    fn from(err: flume::TryRecvError) -> Self {
        match err {
            flume::TryRecvError::Empty => StoreError::Empty,
            flume::TryRecvError::Disconnected => StoreError::Closed,
        }
    }
}

impl From<flume::RecvError> for StoreError {
    fn from(_: flume::RecvError) -> Self {
        StoreError::Closed
    }
}
