use crate::ui::icons::{ARROW, CROSS, SCROLL, SPARKLE, STOP, TARGET, WARN};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal UI for a play session.
///
/// Story text and diagnostics go to stdout; the "waiting on the model"
/// spinner is drawn by `indicatif` on stderr and disappears when stderr is
/// not a terminal. A quiet UI prints nothing, which keeps session tests
/// free of terminal output.
pub struct SessionUi {
    quiet: bool,
}

impl SessionUi {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    /// UI that swallows all output.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn print_line(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", msg.as_ref());
        }
    }

    /// Start a spinner with `msg`. Finish it with `finish_and_clear` once the call returns.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} {elapsed:.dim}")
                .expect("spinner template is a valid static string"),
        );
        spinner.set_message(msg.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Print a full-width cyan separator line.
    pub fn print_separator(&self) {
        self.print_line(format!("{}", style("═".repeat(60)).cyan()));
    }

    /// Print a `--- Title ---` section heading.
    pub fn heading(&self, title: &str) {
        self.print_line("");
        self.print_line(format!(
            "{}{}",
            SCROLL,
            style(format!("--- {} ---", title)).bold()
        ));
    }

    /// Print the banner for the phase the player is about to act in.
    pub fn phase_header(&self, phase: &str, step: usize) {
        self.print_line("");
        self.print_separator();
        self.print_line(format!(
            "{}Current Phase: {} {}",
            TARGET,
            style(phase).yellow().bold(),
            style(format!("(step {})", step)).dim()
        ));
        self.print_separator();
    }

    /// Print narrative text verbatim.
    pub fn narrative(&self, text: &str) {
        if text.trim().is_empty() {
            self.print_line(format!("{}", style("(the narrator had nothing to say)").dim()));
        } else {
            self.print_line(text);
        }
    }

    /// Announce a validated transition.
    pub fn transition(&self, from: &str, to: &str) {
        self.print_line(format!(
            "{}{} {} {}",
            ARROW,
            style(from).dim(),
            style("→").dim(),
            style(to).green().bold()
        ));
    }

    /// Print a non-fatal diagnostic, e.g. narration that could not be produced.
    pub fn warning(&self, msg: &str) {
        self.print_line(format!("{}{}", WARN, style(msg).yellow()));
    }

    /// Print a diagnostic naming a failure category.
    pub fn failure(&self, category: &str, msg: &str) {
        self.print_line(format!(
            "{}{} {}",
            CROSS,
            style(format!("[{}]", category)).red().bold(),
            msg
        ));
    }

    /// Closing line of a session.
    pub fn finished(&self, completed: bool, msg: &str) {
        self.print_line("");
        if completed {
            self.print_line(format!("{}{}", SPARKLE, style(msg).green().bold()));
        } else {
            self.print_line(format!("{}{}", STOP, style(msg).yellow().bold()));
        }
    }
}

impl Default for SessionUi {
    fn default() -> Self {
        Self::new()
    }
}
