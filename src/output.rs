//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines, a
//! spinner for long batch runs, and summary tables. Diagnostics go through `tracing`;
//! this module is only for what the user asked to see.

use crate::report::{CommandReport, CountReport};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Turns colors on or off for the rest of the process.
    pub fn set_color(enabled: bool) {
        colored::control::set_override(enabled);
    }

    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use treemirror::output::OutputFormatter;
    /// OutputFormatter::success("Copied 12 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a spinner for batch operations whose length is unknown up front.
    ///
    /// Entries are pulled lazily, so there is no total to show; the spinner counts
    /// handled entries instead. Returns a hidden spinner when `visible` is false.
    pub fn create_spinner(visible: bool) -> ProgressBar {
        if !visible {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {pos} handled {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Prints the outcome of a batch command.
    pub fn batch_summary(title: &str, report: &CommandReport) {
        Self::header(title);
        println!("  Matched:   {}", report.matched.to_string().bold());
        println!("  Succeeded: {}", report.succeeded.to_string().green());
        if report.matched == 0 {
            Self::warning("No entries matched");
        }

        if !report.skipped.is_empty() {
            println!("  Skipped:   {}", report.skipped.len().to_string().yellow());
            for (path, reason) in &report.skipped {
                println!("    - {}: {}", path.display(), reason);
            }
        }

        if !report.failed.is_empty() {
            println!("  Failed:    {}", report.failed.len().to_string().red());
            for (path, reason) in &report.failed {
                eprintln!("    - {}: {}", path.display(), reason);
            }
        }
    }

    /// Prints file, size and directory counts with thousands separators.
    pub fn count_table(report: &CountReport) {
        Self::header("=== Result ===");
        println!("File Count  : {:>16}", group_thousands(report.files));
        println!("File Size   : {:>16}", group_thousands(report.bytes));
        println!("Folder Count: {:>16}", group_thousands(report.dirs));
    }
}

/// Formats `value` with `,` between groups of three digits.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
