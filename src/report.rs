//! Console report helpers for the test runner.
//!
//! Status lines go through termcolor so markers stay readable on dumb
//! terminals; verbose diagnostics are dimmed with a raw SGR sequence
//! (termcolor has no faint attribute) and gated on a tty like everything
//! else.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

pub struct ReportStyle {
    use_colors: bool,
}

impl ReportStyle {
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Style with colors forced on or off, for tests and piped output.
    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn color_choice(&self) -> ColorChoice {
        if self.use_colors {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        }
    }

    /// `✅ [OK] <name>` with the marker in green.
    pub fn print_ok(&self, name: &str) {
        self.print_marker("✅ [OK]", Color::Green, name);
    }

    /// `❌ [KO] <name>` with the marker in red.
    pub fn print_ko(&self, name: &str) {
        self.print_marker("❌ [KO]", Color::Red, name);
    }

    fn print_marker(&self, marker: &str, color: Color, name: &str) {
        let mut stdout = StandardStream::stdout(self.color_choice());
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)));
        let _ = write!(stdout, "{}", marker);
        let _ = stdout.reset();
        let _ = writeln!(stdout, " {}", name);
    }

    /// Dimmed, non-alerting presentation for verbose diagnostics.
    pub fn print_dimmed(&self, text: &str) {
        if self.use_colors {
            println!("{}{}{}", DIM, text, RESET);
        } else {
            println!("{}", text);
        }
    }
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self::new()
    }
}
