//! Recorder error types.

use retrace_types::OpError;
use thiserror::Error;

/// Failure while recording or generating a program.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The forwarded operation failed on the underlying value. Nothing was
    /// recorded.
    #[error(transparent)]
    Target(#[from] OpError),
    /// A value has neither an evaluable literal nor a verified blob.
    #[error("argument cannot be recorded: {0}")]
    Unrecordable(String),
    /// Two statements assign the same minted name.
    #[error("name '{0}' is assigned by more than one statement")]
    NameCollision(String),
    /// An operation that had to produce a wrapper returned a bare value.
    #[error("result escaped recording: {0}")]
    Escaped(String),
    /// All handles to the recording session were dropped.
    #[error("recording session is closed")]
    SessionClosed,
    #[error("invalid recorder configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for recorder operations.
pub type RecordResult<T> = Result<T, RecordError>;

impl From<RecordError> for OpError {
    /// Proxies stored inside plain values surface recorder failures through
    /// the host object interface, which only speaks `OpError`.
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Target(op) => op,
            other => OpError::Host(other.to_string()),
        }
    }
}
