//! The OTP component and the pieces it is built from.
//!
//! An [`OtpComponent`] requests codes from the backend over an event stream,
//! keeps the latest one on display and counts down its validity. It owns at
//! most one open stream and one running countdown; starting a new request
//! releases both before anything new is opened.
//!
//! The component does not run itself. A front end drives it by calling
//! [`OtpComponent::generate`], then repeatedly awaiting
//! [`OtpComponent::next_dispatch`] and handing the result to
//! [`OtpComponent::apply`], rendering [`OtpComponent::view`] in between.

pub mod component;
pub mod countdown;
pub mod error;
pub mod otp;
pub mod state;
pub mod view;

pub use component::{Dispatch, OtpComponent};
pub use countdown::CountdownColor;
pub use error::Error;
pub use otp::OtpLength;
pub use state::{Failure, OtpState};
pub use view::OtpView;
