//! Colored output formatting for the natded CLI

use colored::*;
use natded_core::ParseError;

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn print_header(title: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", "=".repeat(title.chars().count()).cyan());
}

/// The input line with a caret under the offending position.
pub fn format_parse_error(input: &str, err: &ParseError) -> String {
    let mut out = format!("{}\n  {}", err, input);
    if let Some(offset) = err.offset() {
        let column = input
            .get(..offset.min(input.len()))
            .map_or(0, |prefix| prefix.chars().count());
        out.push_str(&format!("\n  {}{}", " ".repeat(column), "^".red().bold()));
    }
    out
}

pub fn enable_colors(enabled: bool) {
    colored::control::set_override(enabled);
}
