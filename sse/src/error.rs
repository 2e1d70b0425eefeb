//! Error types for the `sse` crate.

use std::error::Error as StdError;
use std::fmt;

/// Error raised while opening an event stream.
/// Holds the error kind and the underlying cause, if any.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The URL was rejected before any request was made.
    InvalidUrl,
    /// The client could not be set up for the URL.
    Connect,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "SSE error: {:?}: {}", self.error_kind, source),
            None => write!(f, "SSE error: {:?}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<eventsource_client::Error> for Error {
    fn from(err: eventsource_client::Error) -> Self {
        let error_kind = match &err {
            eventsource_client::Error::InvalidParameter(_) => ErrorKind::InvalidUrl,
            _ => ErrorKind::Connect,
        };

        Error {
            source: Some(err.to_string().into()),
            error_kind,
        }
    }
}

/// Helper function to create connection errors.
pub fn connect_error(kind: ErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_cause() {
        let err = connect_error(ErrorKind::InvalidUrl, "unsupported scheme: ftp");
        assert_eq!(
            err.to_string(),
            "SSE error: InvalidUrl: unsupported scheme: ftp"
        );
        assert!(err.source().is_some());
    }
}
