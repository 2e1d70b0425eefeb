use crate::countdown::CountdownColor;

/// Snapshot of everything a front end needs to draw the component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpView {
    pub otp: String,
    pub digits: u8,
    pub time_left: u64,
    pub color: CountdownColor,
    pub loading: bool,
    pub generated: bool,
    pub error: Option<String>,
    pub success_message: Option<String>,
}
