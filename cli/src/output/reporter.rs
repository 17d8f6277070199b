//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// On a TTY the latest step is shown on a spinner and finished items are
/// printed above it; otherwise every event is a plain line.
///
/// - `step()` prints `"  → {message}"`
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ! {message}"`
///
/// All three are suppressed when `ctx.quiet` or when muted.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: Option<ProgressBar>,
    muted: bool,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            spinner: None,
            muted: false,
        }
    }

    /// Reporter that prints nothing, for `--json` runs.
    #[must_use]
    pub fn muted(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            spinner: None,
            muted: true,
        }
    }

    /// Reporter that keeps a spinner running with `message` until dropped.
    #[must_use]
    pub fn with_spinner(ctx: &'a OutputContext, message: &str) -> Self {
        let spinner = ctx.show_progress().then(|| progress::spinner(message));
        Self {
            ctx,
            spinner,
            muted: false,
        }
    }

    fn silent(&self) -> bool {
        self.muted || self.ctx.quiet
    }

    fn line(&self, line: String) {
        match &self.spinner {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        if let Some(pb) = &self.spinner {
            progress::finish_clear(pb);
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.silent() {
            return;
        }
        match &self.spinner {
            Some(pb) => pb.set_message(message.to_string()),
            None => println!("  {} {message}", "→".style(self.ctx.styles.info)),
        }
    }

    fn success(&self, message: &str) {
        if !self.silent() {
            self.line(format!("  {} {message}", "✓".style(self.ctx.styles.success)));
        }
    }

    fn warn(&self, message: &str) {
        if !self.silent() {
            self.line(format!("  {} {message}", "!".style(self.ctx.styles.warning)));
        }
    }
}
