use std::result;

use thiserror::Error;

/// A type alias for handling errors related to memtrack.
pub type Result<T> = result::Result<T, MemtrackError>;

/// An error that can occur while servicing a memtrack query.
///
/// Note that conditions which only mean "no data available" (a missing report
/// file, a malformed report line) are not errors; those queries degrade to an
/// empty result instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemtrackError {
    /// The caller passed an argument that can never be valid.
    #[error("invalid argument, {0}")]
    InvalidArgument(String),
    /// The caller asked for an operation outside the supported set.
    #[error("unsupported operation, {0}")]
    UnsupportedOperation(String),
}
