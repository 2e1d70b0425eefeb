//! Infrastructure shared by the OTP countdown binaries: command line and
//! environment configuration, and terminal logging.

pub mod config;
pub mod logging;
