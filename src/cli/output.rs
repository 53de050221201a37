//! Terminal output formatting with colors
//!
//! Data (trees, partitions, walk steps) goes to stdout, diagnostics to stderr.
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use std::fmt::Display;

use colored::{ColoredString, Colorize};

fn status(mark: ColoredString, msg: &(impl Display + ?Sized)) {
    println!("{} {}", mark, msg);
}

/// Red bold "error:" on stderr
pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Yellow "Warning:" on stderr
pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Check passed
pub fn success(msg: &(impl Display + ?Sized)) {
    status("✓".green(), msg);
}

/// Check failed
pub fn failure(msg: &(impl Display + ?Sized)) {
    status("✗".red(), msg);
}

/// `label: value` summary line, e.g. `nodes: 13`
pub fn action(label: &str, value: &(impl Display + ?Sized)) {
    println!("{}: {}", label.green(), value);
}

pub fn header(msg: &(impl Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Indented line below a header
pub fn detail(msg: &(impl Display + ?Sized)) {
    println!("  {}", msg);
}

/// Uncolored data line
pub fn info(msg: &(impl Display + ?Sized)) {
    println!("{}", msg);
}
