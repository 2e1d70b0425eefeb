use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;

/// Default OTP backend endpoint used when `BACKEND_URL` is not set.
pub const DEFAULT_BACKEND_URL: &str = "https://otp-generator-bkbr.onrender.com/api/otp/generate";

/// Digit lengths the backend knows how to generate.
const SUPPORTED_DIGITS: [&str; 2] = ["3", "6"];

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The OTP generation endpoint. The selected digit length is appended as
    /// the `digits` query parameter.
    #[arg(short, long, env, default_value = DEFAULT_BACKEND_URL)]
    backend_url: String,

    /// Number of digits to request for each one-time password
    #[arg(
        short,
        long,
        env,
        default_value = "6",
        value_parser = clap::builder::PossibleValuesParser::new(SUPPORTED_DIGITS)
            .map(|s| s.parse::<u8>().unwrap()),
        )]
    pub digits: u8,

    /// Exit once the countdown of the first received code reaches zero
    #[arg(long, env, default_value_t = false)]
    pub once: bool,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Warn,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn set_backend_url(mut self, backend_url: String) -> Self {
        self.backend_url = backend_url;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_request_six_digits_from_the_public_backend() {
        let config = Config::try_parse_from(["otp_countdown"]).unwrap();

        assert_eq!(config.backend_url(), DEFAULT_BACKEND_URL);
        assert_eq!(config.digits, 6);
        assert!(!config.once);
        assert_eq!(config.log_level_filter, LevelFilter::Warn);
    }

    #[test]
    fn accepts_three_digits() {
        let config = Config::try_parse_from(["otp_countdown", "--digits", "3"])
            .unwrap();
        assert_eq!(config.digits, 3);
    }

    #[test]
    fn rejects_unsupported_digit_lengths() {
        let result = Config::try_parse_from(["otp_countdown", "--digits", "4"]);
        assert!(result.is_err());
    }

    #[test]
    fn backend_url_can_be_overridden() {
        let config = Config::try_parse_from(["otp_countdown"])
            .unwrap()
            .set_backend_url("http://localhost:8080/api/otp/generate".to_string());

        assert_eq!(
            config.backend_url(),
            "http://localhost:8080/api/otp/generate"
        );
    }
}
