//! Error types for table operations.
//!
//! All failures are synchronous and local: the table never performs I/O, so
//! there is nothing to retry. A failed operation leaves the table in the
//! state it had before the call.

use thiserror::Error;

/// Result type alias for table operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Capacity could not be reserved.
    OutOfMemory,
    /// An argument was outside its valid range.
    InvalidArgument,
    /// The operation is not valid in the current state.
    InvalidState,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Growth would exceed [`MAX_CAPACITY`](crate::MAX_CAPACITY) slots.
    #[error("capacity {requested} exceeds the maximum of {max} slots", max = crate::MAX_CAPACITY)]
    CapacityOverflow { requested: usize },

    /// The allocator refused the topology or column buffers.
    #[error("failed to reserve {requested} slots")]
    OutOfMemory { requested: usize },

    /// `allocate` was asked to shrink below the number of occupied slots.
    #[error("capacity {requested} is below the current count {count}")]
    InvalidCapacity { requested: usize, count: usize },

    /// `Cursor::remove` without a preceding `next`, or twice for one `next`.
    #[error("no removable entry: remove must follow next")]
    IllegalState,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::CapacityOverflow { .. } | Error::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Error::InvalidCapacity { .. } => ErrorKind::InvalidArgument,
            Error::IllegalState => ErrorKind::InvalidState,
        }
    }
}
