//! One-time password values as the backend delivers them.

use crate::error::{
    error, DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind, PayloadErrorKind,
};
use serde::Deserialize;
use std::fmt;
use url::Url;

/// Shown whenever no valid code is available.
pub const PLACEHOLDER_OTP: &str = "----";

/// Name of the SSE event that carries a code.
pub const OTP_EVENT: &str = "otp";

/// Validity used when the backend does not say how long a code lives.
pub const DEFAULT_VALID_FOR_SECONDS: u64 = 30;

/// Query parameter carrying the requested digit count.
const DIGITS_PARAM: &str = "digits";

/// Digit lengths the backend can generate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OtpLength {
    Three,
    #[default]
    Six,
}

impl OtpLength {
    pub fn digits(self) -> u8 {
        match self {
            OtpLength::Three => 3,
            OtpLength::Six => 6,
        }
    }
}

impl TryFrom<u8> for OtpLength {
    type Error = Error;

    fn try_from(digits: u8) -> Result<Self, Self::Error> {
        match digits {
            3 => Ok(OtpLength::Three),
            6 => Ok(OtpLength::Six),
            other => Err(error(
                DomainErrorKind::Internal(InternalErrorKind::Config),
                &format!("unsupported OTP length: {other} (expected 3 or 6)"),
            )),
        }
    }
}

impl fmt::Display for OtpLength {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.digits())
    }
}

/// Parses the configured backend endpoint.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, Error> {
    Ok(Url::parse(endpoint)?)
}

/// Builds `<endpoint>?digits=<n>`, keeping any query the endpoint already has.
pub fn request_url(endpoint: &Url, length: OtpLength) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair(DIGITS_PARAM, &length.digits().to_string());
    url
}

/// A decoded `otp` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpPayload {
    pub otp: String,
    pub valid_for_seconds: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPayload {
    otp: Option<String>,
    valid_for_seconds: Option<i64>,
}

impl OtpPayload {
    /// Decodes an event payload. The shape is only known at runtime, so every
    /// field is checked here: `otp` must be a string, `validForSeconds` an
    /// integer if present. A missing, zero or negative validity falls back to
    /// `DEFAULT_VALID_FOR_SECONDS`.
    pub fn decode(data: &str) -> Result<Self, Error> {
        let raw: RawPayload = serde_json::from_str(data)?;

        let otp = raw.otp.ok_or_else(|| {
            error(
                DomainErrorKind::External(ExternalErrorKind::Payload(PayloadErrorKind::MissingOtp)),
                "payload has no otp field",
            )
        })?;

        let valid_for_seconds = match raw.valid_for_seconds {
            Some(seconds) if seconds > 0 => seconds as u64,
            _ => DEFAULT_VALID_FOR_SECONDS,
        };

        Ok(Self {
            otp,
            valid_for_seconds,
        })
    }
}
