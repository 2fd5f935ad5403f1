//! Terminal styling helpers
//!
//! Output is written through `anstream`, which strips the escape codes when
//! stdout is not a terminal.

use owo_colors::OwoColorize;
use std::fmt::Display;

/// Check mark for completed work
pub const CHECK: &str = "✓";
/// Cross for failures
pub const CROSS: &str = "✗";

/// Semantic styles for CLI output
pub trait Stylize {
    /// Positive result
    fn success(&self) -> String;
    /// Something the user should notice
    fn warn(&self) -> String;
    /// Failure
    fn error(&self) -> String;
    /// Secondary information
    fn muted(&self) -> String;
    /// Identifiers such as PR numbers
    fn accent(&self) -> String;
    /// Headings
    fn emphasis(&self) -> String;
}

impl<T: Display> Stylize for T {
    fn success(&self) -> String {
        self.green().to_string()
    }

    fn warn(&self) -> String {
        self.yellow().to_string()
    }

    fn error(&self) -> String {
        self.red().to_string()
    }

    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    fn emphasis(&self) -> String {
        self.bold().to_string()
    }
}
