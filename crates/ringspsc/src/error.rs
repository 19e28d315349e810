//! Error types for ring buffer operations.

use core::fmt;
use thiserror::Error;

/// Errors reported by ring buffer operations.
///
/// None of these are fatal: the buffer has no error state and every operation
/// can be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingError {
    /// No free slot for the producer.
    #[error("ring buffer is full")]
    Full,

    /// Nothing published for the consumer.
    #[error("ring buffer is empty")]
    Empty,

    /// Indexed access past the unread region.
    #[error("index {index} out of range for {available} unread elements")]
    OutOfRange {
        /// The requested position, 0 being the oldest unread element.
        index: usize,
        /// Number of unread elements at the time of the access.
        available: usize,
    },

    /// `try_split` was called on a buffer that already handed out its
    /// producer and consumer.
    #[error("ring buffer has already been split")]
    AlreadySplit,
}

impl RingError {
    /// Returns `true` if retrying later may succeed (`Full` or `Empty`).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Full | Self::Empty)
    }
}

#[cfg(feature = "std")]
impl From<RingError> for std::io::Error {
    fn from(err: RingError) -> Self {
        use std::io::ErrorKind;

        let kind = match err {
            RingError::Full | RingError::Empty => ErrorKind::WouldBlock,
            RingError::OutOfRange { .. } => ErrorKind::InvalidInput,
            RingError::AlreadySplit => ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

/// Returned by [`Producer::insert`](crate::Producer::insert) when the buffer
/// is full. Hands the rejected element back to the caller.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct InsertError<T>(pub T);

impl<T> InsertError<T> {
    /// Recovers the element that could not be inserted.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("InsertError(..)")
    }
}

impl<T> fmt::Display for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&RingError::Full, f)
    }
}

impl<T> core::error::Error for InsertError<T> {}

impl<T> From<InsertError<T>> for RingError {
    fn from(_: InsertError<T>) -> Self {
        RingError::Full
    }
}
