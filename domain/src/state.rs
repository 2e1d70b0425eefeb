use crate::otp::{OtpLength, PLACEHOLDER_OTP};

/// Shown after the first code of a generation request arrives.
pub const SUCCESS_MESSAGE: &str = "OTP Generate Successfully!";

/// Why the current generation request ended. Both are terminal: the user has
/// to start a new request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Failure {
    /// An `otp` event could not be decoded.
    MalformedPayload,
    /// The stream could not be opened, failed, or ended.
    Disconnected,
}

impl Failure {
    pub fn message(self) -> &'static str {
        match self {
            Failure::MalformedPayload => "Data format error from backend.",
            Failure::Disconnected => "Backend disconnected.",
        }
    }
}

/// Status of the component as the user sees it, minus the countdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpState {
    pub otp: String,
    pub selected_length: OtpLength,
    pub loading: bool,
    /// Set once a code arrived during the current request.
    pub generated: bool,
    pub error: Option<String>,
    pub success_message: Option<String>,
}

impl Default for OtpState {
    fn default() -> Self {
        Self::new(OtpLength::default())
    }
}

impl OtpState {
    pub fn new(selected_length: OtpLength) -> Self {
        Self {
            otp: PLACEHOLDER_OTP.to_string(),
            selected_length,
            loading: false,
            generated: false,
            error: None,
            success_message: None,
        }
    }

    /// Clears everything from the previous request and enters the loading phase.
    pub fn begin(&mut self) {
        self.otp = PLACEHOLDER_OTP.to_string();
        self.error = None;
        self.success_message = None;
        self.generated = false;
        self.loading = true;
    }

    /// Shows a freshly received code.
    pub fn accept(&mut self, otp: String) {
        self.otp = otp;
        self.loading = false;
        self.error = None;

        if !self.generated {
            self.success_message = Some(SUCCESS_MESSAGE.to_string());
        }

        self.generated = true;
    }

    pub fn fail(&mut self, failure: Failure) {
        self.error = Some(failure.message().to_string());
        self.success_message = None;
        self.loading = false;
        self.otp = PLACEHOLDER_OTP.to_string();
    }
}
