use colored::*;
use domain::OtpView;

/// Prints a line whenever the view changes.
#[derive(Default)]
pub struct Renderer {
    last: Option<OtpView>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &OtpView) {
        if self.last.as_ref() == Some(view) {
            return;
        }

        // A new success message is announced once, above the code line.
        let previous = self.last.as_ref().map(|last| &last.success_message);
        if let Some(message) = &view.success_message {
            if previous != Some(&view.success_message) {
                println!("{} {}", "✓".green(), message.green().bold());
            }
        }

        println!("{}", format_view(view));
        self.last = Some(view.clone());
    }
}

pub fn format_view(view: &OtpView) -> String {
    if let Some(error) = &view.error {
        return format!("{} {}", "✗".red(), error.red().bold());
    }

    if view.loading {
        return format!("{} Requesting a {}-digit code...", "→".blue(), view.digits);
    }

    if !view.generated {
        return format!("OTP {}", view.otp.dimmed());
    }

    let (r, g, b) = view.color.rgb();
    format!(
        "OTP {}  {}",
        view.otp.bold(),
        format!("{:>2}s", view.time_left).truecolor(r, g, b)
    )
}
