use thiserror::Error;

pub use relay_types::{ConfigError, ValidationError};

/// Returned by `ServerReplica::commit` / `ClientReplica::commit`. Validation
/// errors are the only failure a `commit` caller can observe.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// An error returned by an application-supplied materializer (server
/// apply, client apply, or client rollback). Never surfaces to a
/// `commit`/`receive` caller — only into a `tracing::warn!` log record.
#[derive(Debug, Error, Clone)]
#[error("{0}")]
pub struct MaterializerError(String);

impl MaterializerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for MaterializerError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MaterializerError {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// An error returned by an application-supplied `onCommit`/`onCommitted`
/// callback. Like [`MaterializerError`], this only ever reaches a
/// `tracing::warn!` log record — the drain loop that invoked the callback
/// keeps running regardless.
#[derive(Debug, Error, Clone)]
#[error("{0}")]
pub struct CallbackError(String);

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for CallbackError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CallbackError {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
