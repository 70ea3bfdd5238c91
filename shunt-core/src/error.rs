/// Error types for endpoint operations.
use std::io;
use thiserror::Error;

/// Failure modes of the endpoint capability surface (poll/recv/send).
#[derive(Error, Debug)]
pub enum EndpointError {
    /// The operation was interrupted and is safe to retry unconditionally.
    #[error("operation interrupted")]
    Interrupted,

    /// The peer or the underlying transport is gone.
    #[error("endpoint closed")]
    Closed,

    /// Any other transport failure.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for endpoint operations
pub type Result<T> = std::result::Result<T, EndpointError>;

impl EndpointError {
    /// Transient failures are retried at the call site while the device is
    /// still running; everything else aborts the current operation.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Interrupted => true,
            Self::Io(e) => e.kind() == io::ErrorKind::Interrupted,
            Self::Closed => false,
        }
    }
}
