//! Console output for migration runs.

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::services::{MigrationEvent, MigrationReport};
use crate::utils::format_size;

const RULE_WIDTH: usize = 60;

/// Prints migration events as they arrive.
///
/// When stdout is a terminal a progress bar tracks documents and every line
/// is printed through it.
pub struct Reporter {
    dry_run: bool,
    bar: Option<ProgressBar>,
}

impl Reporter {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run, bar: None }
    }

    pub fn print_header(&self, root: &Path) {
        println!("{}", "=".repeat(RULE_WIDTH));
        println!(
            "{}",
            style("Migration: Supabase Storage -> server Legal/").bold()
        );
        println!("  {} {}", style("Root:").dim(), root.display());
        if self.dry_run {
            println!(
                "{}",
                style("*** DRY RUN - no files will be moved ***").yellow()
            );
        }
        println!("{}", "=".repeat(RULE_WIDTH));
    }

    fn line(&self, message: String) {
        match self.bar {
            Some(ref bar) => bar.println(message),
            None => println!("{}", message),
        }
    }

    fn advance(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    pub fn handle(&mut self, event: MigrationEvent) {
        match event {
            MigrationEvent::MappingsLoaded { mappings, cases } => {
                self.line(format!(
                    "\n{} Loaded {} folder mappings for {} cases",
                    style("→").cyan(),
                    mappings,
                    cases
                ));
            }
            MigrationEvent::DocumentsLoaded { count } => {
                self.line(format!(
                    "{} {} documents with attachments to migrate",
                    style("→").cyan(),
                    count
                ));
                if count == 0 {
                    self.line(format!("\n{} Nothing to migrate.", style("!").yellow()));
                } else if console::Term::stdout().is_term() {
                    let bar = ProgressBar::new(count as u64);
                    bar.set_style(
                        ProgressStyle::default_bar()
                            .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                            .unwrap_or_else(|_| ProgressStyle::default_bar())
                            .progress_chars("█▓░"),
                    );
                    bar.set_message(if self.dry_run { "Previewing" } else { "Migrating" });
                    self.bar = Some(bar);
                }
            }
            MigrationEvent::SkippedNoMapping {
                index,
                total,
                document,
            } => {
                self.line(format!(
                    "\n[{}/{}] {} {} {}",
                    index,
                    total,
                    document.title,
                    style("skipped: no folder mapping for case").yellow(),
                    document.case_id.as_deref().unwrap_or("(none)")
                ));
                self.advance();
            }
            MigrationEvent::DocumentStarted {
                index,
                total,
                title,
                destination,
            } => {
                self.line(format!("\n[{}/{}] {}", index, total, style(title).bold()));
                self.line(format!("    Destination: {}/", destination));
                self.advance();
            }
            MigrationEvent::AttachmentPlanned {
                index,
                total,
                original_name,
                new_name,
            } => {
                self.line(format!("    [{}/{}] {}", index, total, original_name));
                self.line(format!("    -> {}", new_name));
            }
            MigrationEvent::WouldSave { path } => {
                self.line(format!(
                    "    {} Would be saved to: {}",
                    style("[DRY RUN]").yellow(),
                    path.display()
                ));
            }
            MigrationEvent::Saved { bytes, .. } => {
                self.line(format!(
                    "    {} Saved ({})",
                    style("✓").green(),
                    format_size(bytes)
                ));
            }
            MigrationEvent::RecordUpdated { server_path } => {
                self.line(format!(
                    "    {} Record updated: server_path={}",
                    style("✓").green(),
                    server_path
                ));
            }
            MigrationEvent::Failed(failure) => {
                self.line(format!("    {} {}", style("ERROR:").red(), failure.error));
                // Failures without an attachment end the document before it starts.
                if failure.attachment.is_none() {
                    self.advance();
                }
            }
        }
    }

    /// Print the end-of-run totals and itemized skips and errors.
    pub fn print_summary(&self, report: &MigrationReport) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
        if report.total == 0 {
            return;
        }
        for line in summary_lines(report) {
            println!("{}", line);
        }
    }
}

/// Summary block for a finished run.
pub fn summary_lines(report: &MigrationReport) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        String::new(),
        rule.clone(),
        "MIGRATION SUMMARY".to_string(),
        rule,
        format!("{:<22} {}", "Total documents:", report.total),
    ];

    if report.dry_run {
        lines.push(format!("{:<22} {}", "Planned files:", report.planned));
    } else {
        lines.push(format!("{:<22} {}", "Migrated files:", report.migrated));
        lines.push(format!(
            "{:<22} {}",
            "Records updated:", report.documents_updated
        ));
        lines.push(format!(
            "{:<22} {}",
            "Written:",
            format_size(report.bytes_written)
        ));
    }
    lines.push(format!(
        "{:<22} {}",
        "No folder mapping:",
        report.skipped_no_mapping.len()
    ));
    lines.push(format!("{:<22} {}", "Errors:", report.errors.len()));

    if !report.skipped_no_mapping.is_empty() {
        lines.push(String::new());
        lines.push("Documents without folder mapping:".to_string());
        for skipped in &report.skipped_no_mapping {
            lines.push(format!(
                "  - {} (case_id: {})",
                skipped.title,
                skipped.case_id.as_deref().unwrap_or("none")
            ));
        }
    }

    if !report.errors.is_empty() {
        lines.push(String::new());
        lines.push("Errors:".to_string());
        for failure in &report.errors {
            lines.push(format!(
                "  - {} [{}]: {}",
                failure.title, failure.id, failure.error
            ));
        }
    }

    lines
}
