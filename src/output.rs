//! Console output.
//!
//! All user-facing progress and status lines go through [`OutputFormatter`]
//! so the styling stays consistent. Diagnostics go through `tracing` instead.

use crate::file_category::Category;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::success("Moved a.jpg -> Images/");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, on stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
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

    /// Prints a bold section header preceded by a blank line.
    ///
    /// # Arguments
    ///
    /// * `header` - The header text
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for `total` file operations.
    ///
    /// Lines printed while the bar is live should go through
    /// [`ProgressBar::suspend`] so they do not tear the bar.
    ///
    /// # Returns
    ///
    /// A configured `ProgressBar`. It stays hidden when stderr is not a terminal.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints a table of file counts per category.
    ///
    /// # Arguments
    ///
    /// * `category_counts` - Files per category, printed in category order
    /// * `total_files` - Total shown in the footer row
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::file_category::Category;
    /// use sortdir::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert(Category::Images, 8);
    /// counts.insert(Category::Documents, 15);
    /// OutputFormatter::summary_table(&counts, 23);
    /// ```
    pub fn summary_table(category_counts: &BTreeMap<Category, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = category_counts
            .keys()
            .map(|category| category.dir_name().len())
            .max()
            .unwrap_or(0)
            .max("Category".len());

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category.dir_name(),
                count.to_string().green(),
                plural_files(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural_files(total_files),
            width = width
        );
    }

    /// Prints `message` in yellow with a `[DRY RUN]` prefix.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

fn plural_files(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
