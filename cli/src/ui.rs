//! Shared UI utilities for consistent terminal output.
//!
//! Status lines go to stderr so that `generate --stdout` output stays clean.

use colored::Colorize;

/// Standard symbols used throughout the CLI.
pub mod symbols {
    /// Arrow for action/progress indicators
    pub const ARROW: &str = "→";
    /// Checkmark for success
    pub const SUCCESS: &str = "✓";
    /// Warning/attention indicator
    pub const WARNING: &str = "!";
    /// Bullet point
    pub const BULLET: &str = "•";
}

/// Print a step header with the action arrow.
pub fn print_step(message: &str) {
    eprintln!("{} {}", symbols::ARROW.blue().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    eprintln!("{} {}", symbols::SUCCESS.green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", symbols::WARNING.yellow().bold(), message);
}

/// Print a dimmed info line (indented).
pub fn print_info(message: &str) {
    eprintln!("  {}", message.dimmed());
}

/// Print a bulleted key/value line.
pub fn print_item(label: &str, value: &str) {
    println!("  {} {}: {}", symbols::BULLET.dimmed(), label, value.bold());
}
