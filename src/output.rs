//! Output formatting and styling module.
//!
//! All user-facing text goes through here: colored status lines, the plan
//! table, JSON output and the end-of-run reports.

use std::path::Path;

use colored::*;
use indicatif::ProgressStyle;

use crate::error::{ExtractError, MoveError};
use crate::file_organizer::MoveReport;
use crate::planner::DestinationPlan;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Style shared by every progress bar.
    pub fn progress_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("█▓░")
    }

    /// Renders the plan as a table, paths relative to `base`.
    pub fn plan_table(plan: &DestinationPlan, base: &Path) -> String {
        let rows: Vec<[String; 4]> = plan
            .entries
            .iter()
            .map(|entry| {
                let destination = entry
                    .destination_dir
                    .strip_prefix(base)
                    .unwrap_or(entry.destination_dir.as_path());
                [
                    entry.file_name.clone(),
                    entry.group_key.clone(),
                    entry.resolved_type.to_string(),
                    format!("{}/", destination.display()),
                ]
            })
            .collect();

        let titles = ["File", "Group", "Type", "Destination"];
        let mut widths = titles.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let format_row = |cells: &[String; 4]| {
            format!(
                "{:<w0$} | {:<w1$} | {:<w2$} | {}",
                cells[0],
                cells[1],
                cells[2],
                cells[3],
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
            )
        };

        let header = format_row(&titles.map(String::from));
        let rule = "-".repeat(header.chars().count());
        let mut lines = vec![header.bold().to_string(), rule.clone()];
        lines.extend(rows.iter().map(format_row));
        lines.push(rule);
        lines.join("\n")
    }

    /// Prints the plan table followed by per-type counts.
    pub fn print_plan(plan: &DestinationPlan, base: &Path) {
        if plan.is_empty() {
            Self::info("No files to organize.");
            return;
        }

        println!("{}", Self::plan_table(plan, base));

        Self::header("SUMMARY");
        for (category, count) in plan.counts_by_type() {
            println!(
                "  {:<6} {} {}",
                category.dir_name(),
                count.to_string().green(),
                if count == 1 { "file" } else { "files" }
            );
        }
        println!(
            "  {:<6} {} in {} director{}",
            "Total".bold(),
            plan.len().to_string().green().bold(),
            plan.directories().len(),
            if plan.directories().len() == 1 { "y" } else { "ies" }
        );
    }

    /// Prints the plan as pretty JSON.
    pub fn print_plan_json(plan: &DestinationPlan) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(plan)?);
        Ok(())
    }

    /// Warns about files left out of the run after a failed extraction.
    pub fn skipped_files(failures: &[ExtractError]) {
        if failures.is_empty() {
            return;
        }
        Self::warning(&format!(
            "{} file(s) could not be inspected and will be left in place:",
            failures.len()
        ));
        for failure in failures {
            eprintln!("    - {}", failure);
        }
    }

    /// Prints the outcome of a move run, including files left behind.
    pub fn move_report(report: &MoveReport) {
        Self::success(&format!("Moved {} file(s)", report.moved.len()));

        if !report.failed.is_empty() {
            Self::error(&format!(
                "{} file(s) could not be moved and remain in their original location:",
                report.failed.len()
            ));
            for failure in &report.failed {
                Self::failure_line(failure);
            }
        }

        if !report.not_attempted.is_empty() {
            Self::warning(&format!(
                "Cancelled: {} file(s) were not moved",
                report.not_attempted.len()
            ));
        }
    }

    fn failure_line(failure: &MoveError) {
        eprintln!("    - {}", failure);
    }

    /// Prints a preview-mode notice message.
    pub fn preview_notice(message: &str) {
        println!("{}", format!("[PREVIEW] {}", message).yellow());
    }
}
