//! Error types for the `domain` layer.
use sse::error::Error as SseError;
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Holds a tree of `error_kind` enums describing what went wrong and, in
/// `source`, the original error from the lower layer (`sse`, `serde_json`,
/// `url`). The component turns these into user-facing failure messages; the
/// kinds exist so callers and logs can tell the cases apart.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Errors caused by local input: configuration values and the like.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Config,
}

/// Errors caused by the backend or the connection to it.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Payload(PayloadErrorKind),
}

/// Ways an `otp` event payload can fail to decode.
#[derive(Debug, PartialEq)]
pub enum PayloadErrorKind {
    /// Not JSON, or a field has the wrong type.
    Malformed,
    /// Valid JSON without an `otp` field.
    MissingOtp,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Domain Error: {:?}: {}", self.error_kind, source),
            None => write!(f, "Domain Error: {:?}", self.error_kind),
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

// Connection setup failures are reported to the user exactly like a dropped stream.
impl From<SseError> for Error {
    fn from(err: SseError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::External(ExternalErrorKind::Payload(
                PayloadErrorKind::Malformed,
            )),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }
}

/// Helper function to create errors that carry only a message.
pub(crate) fn error(error_kind: DomainErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind,
    }
}
