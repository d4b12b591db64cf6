//! The public error type for the kpi crate.
//!
//! Internally, functions return `Res<T>`, which is an `anyhow` result that collects context as it
//! bubbles up. At the boundary of the public API, `pub_result` attaches an `ErrorType` so that
//! callers (the CLI, the HTTP server, tests) can decide what to do with a failure without string
//! matching on messages.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// Internal result type.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// Public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies an `Error` by what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The kpi home directory or its `config.json` is missing or invalid.
    Config,
    /// The backing file could not be read or written.
    Store,
    /// A submitted date could not be normalized to `YYYY-MM-DD`. Nothing was written.
    MalformedDate,
    /// The HTTP server could not be started or failed while running.
    Service,
    /// Bad input from the command line or an interactive session.
    Input,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error with an `ErrorType` and the chain of context that led to it.
pub struct Error {
    error_type: ErrorType,
    source: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, source: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            source: source.into(),
        }
    }

    /// What kind of error this is.
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:#}", self.error_type, self.source)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error({}): {:?}", self.error_type, self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Converts an internal result into a public `Result` by tagging the error with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_display_includes_type_and_context() {
        let res: Res<()> = Err(anyhow::anyhow!("inner")).context("outer");
        let err = res.pub_result(ErrorType::Store).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Store);
        assert_eq!(err.to_string(), "store: outer: inner");
    }

    #[test]
    fn test_error_type_round_trip_through_str() {
        let parsed: ErrorType = "malformed_date".parse().unwrap();
        assert_eq!(parsed, ErrorType::MalformedDate);
        assert_eq!(ErrorType::MalformedDate.to_string(), "malformed_date");
    }
}
