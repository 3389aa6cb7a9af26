//! The public error type of the library.
//!
//! Internally everything is an `anyhow::Error` with context attached at each IO or parsing
//! boundary. When an error crosses the public API it is tagged with an `ErrorType` so that
//! callers (the CLI and the web server) can decide how to present it.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// Broad classification of what went wrong.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The home directory or `config.json` is missing or invalid.
    Config,
    /// A store file could not be created, read or written.
    Store,
    /// A store file exists but its contents do not match the schema.
    Parse,
    /// The caller supplied bad input, e.g. an empty username or a zero amount.
    Request,
    /// The web server could not start or failed while running.
    Service,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// The error type returned by public functions of this library.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

/// The result type returned by public functions of this library.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub(crate) fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    /// The full chain of context messages, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = String> + '_ {
        self.inner.chain().map(|e| e.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:#}", self.error_type, self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("error_type", &self.error_type)
            .field("inner", &self.inner)
            .finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

/// Untagged internal errors that escape with `?` are treated as store errors, which is where
/// almost all IO happens.
impl From<anyhow::Error> for Error {
    fn from(inner: anyhow::Error) -> Self {
        Self::new(ErrorType::Store, inner)
    }
}

/// Converts an internal `anyhow::Result` into the public `Result`, tagging any error.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for anyhow::Result<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|inner| Error::new(error_type, inner))
    }
}
