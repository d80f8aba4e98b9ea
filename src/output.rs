//! Output formatting and styling module.
//!
//! Turns run outcomes into console lines, a summary, a progress bar, or a JSON
//! report. The engine never prints; everything visible goes through here.

use crate::error::OrganizeError;
use crate::file_organizer::{Outcome, OutcomeResult, ProgressObserver, RunReport};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// The console line for one outcome, without styling.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use treetidy::config::TransferMode;
    /// use treetidy::file_organizer::{Outcome, OutcomeResult};
    /// use treetidy::output::OutputFormatter;
    ///
    /// let outcome = Outcome {
    ///     action: TransferMode::Copy,
    ///     source: PathBuf::from("in/a.txt"),
    ///     destination: Some(PathBuf::from("out/txt/a.txt")),
    ///     result: OutcomeResult::Planned,
    /// };
    /// assert_eq!(OutputFormatter::outcome_line(&outcome), "Would copy in/a.txt -> out/txt/a.txt");
    /// ```
    pub fn outcome_line(outcome: &Outcome) -> String {
        let source = outcome.source.display();
        let destination = outcome
            .destination
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        let verb = outcome.action.verb();

        match &outcome.result {
            OutcomeResult::Planned => format!("Would {} {} -> {}", verb, source, destination),
            OutcomeResult::Done => {
                let past = if verb == "move" { "Moved" } else { "Copied" };
                format!("{} {} -> {}", past, source, destination)
            }
            OutcomeResult::AlreadyInPlace => format!("Already organized: {}", source),
            OutcomeResult::SkippedExisting => format!("Exists, skipping: {}", destination),
            OutcomeResult::Failed(err) => format!("Error processing {}: {}", source, err),
        }
    }

    /// Prints one outcome; failures go to stderr.
    pub fn print_outcome(outcome: &Outcome) {
        let line = Self::outcome_line(outcome);
        match outcome.result {
            OutcomeResult::Done => println!("{}", line.green()),
            OutcomeResult::Planned => println!("{}", line),
            OutcomeResult::AlreadyInPlace => println!("{}", line.dimmed()),
            OutcomeResult::SkippedExisting => println!("{}", line.yellow()),
            OutcomeResult::Failed(_) => eprintln!("{}", line.red()),
        }
    }

    /// The final summary line with the three counters.
    pub fn summary_line(report: &RunReport) -> String {
        format!(
            "Done. Moved: {}, Copied: {}, Skipped: {}",
            report.moved, report.copied, report.skipped
        )
    }

    pub fn print_summary(report: &RunReport) {
        println!("{}", Self::summary_line(report).bold());
    }

    /// Serializes the report as pretty JSON.
    pub fn report_json(report: &RunReport) -> Result<String, OrganizeError> {
        serde_json::to_string_pretty(report)
            .map_err(|e| OrganizeError::Internal(format!("JSON serialization failed: {}", e)))
    }

    /// Creates and returns a progress bar for file operations.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }
}

/// Prints outcomes as they happen, with an optional progress bar.
pub struct ConsoleReporter {
    show_progress: bool,
    progress: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(show_progress: bool) -> Self {
        Self {
            show_progress,
            progress: None,
        }
    }
}

impl ProgressObserver for ConsoleReporter {
    fn on_start(&mut self, total: usize) {
        if self.show_progress && total > 0 {
            self.progress = Some(OutputFormatter::create_progress_bar(total as u64));
        }
    }

    fn on_outcome(&mut self, outcome: &Outcome) {
        match &self.progress {
            // Hide the bar while printing so lines don't interleave with it.
            Some(pb) => {
                pb.suspend(|| OutputFormatter::print_outcome(outcome));
                pb.inc(1);
            }
            None => OutputFormatter::print_outcome(outcome),
        }
    }

    fn on_finish(&mut self, report: &RunReport) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
        OutputFormatter::print_summary(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransferMode;
    use crate::error::{FileError, FileErrorKind};
    use std::path::PathBuf;

    fn outcome(action: TransferMode, result: OutcomeResult) -> Outcome {
        Outcome {
            action,
            source: PathBuf::from("in/a.txt"),
            destination: Some(PathBuf::from("out/txt/a.txt")),
            result,
        }
    }

    #[test]
    fn test_outcome_lines() {
        assert_eq!(
            OutputFormatter::outcome_line(&outcome(TransferMode::Move, OutcomeResult::Planned)),
            "Would move in/a.txt -> out/txt/a.txt"
        );
        assert_eq!(
            OutputFormatter::outcome_line(&outcome(TransferMode::Move, OutcomeResult::Done)),
            "Moved in/a.txt -> out/txt/a.txt"
        );
        assert_eq!(
            OutputFormatter::outcome_line(&outcome(TransferMode::Copy, OutcomeResult::Done)),
            "Copied in/a.txt -> out/txt/a.txt"
        );
        assert_eq!(
            OutputFormatter::outcome_line(&outcome(
                TransferMode::Move,
                OutcomeResult::SkippedExisting
            )),
            "Exists, skipping: out/txt/a.txt"
        );
        assert_eq!(
            OutputFormatter::outcome_line(&outcome(
                TransferMode::Move,
                OutcomeResult::AlreadyInPlace
            )),
            "Already organized: in/a.txt"
        );
    }

    #[test]
    fn test_failure_line_names_file_and_reason() {
        let err = FileError {
            path: PathBuf::from("in/a.txt"),
            kind: FileErrorKind::Transfer,
            message: "permission denied".to_string(),
        };
        let line =
            OutputFormatter::outcome_line(&outcome(TransferMode::Move, OutcomeResult::Failed(err)));
        assert_eq!(line, "Error processing in/a.txt: permission denied");
    }

    #[test]
    fn test_summary_line() {
        let report = RunReport {
            moved: 3,
            copied: 0,
            skipped: 1,
            outcomes: Vec::new(),
        };
        assert_eq!(
            OutputFormatter::summary_line(&report),
            "Done. Moved: 3, Copied: 0, Skipped: 1"
        );
    }

    #[test]
    fn test_report_json_shape() {
        let report = RunReport {
            moved: 1,
            copied: 0,
            skipped: 0,
            outcomes: vec![outcome(TransferMode::Move, OutcomeResult::Done)],
        };
        let json = OutputFormatter::report_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["moved"], 1);
        assert_eq!(value["outcomes"][0]["action"], "move");
        assert_eq!(value["outcomes"][0]["result"], "done");
        assert_eq!(value["outcomes"][0]["destination"], "out/txt/a.txt");
    }

    #[test]
    fn test_report_json_failure_carries_kind() {
        let err = FileError {
            path: PathBuf::from("in/a.txt"),
            kind: FileErrorKind::CreateDir,
            message: "read-only file system".to_string(),
        };
        let report = RunReport {
            moved: 0,
            copied: 0,
            skipped: 1,
            outcomes: vec![outcome(TransferMode::Move, OutcomeResult::Failed(err))],
        };
        let json = OutputFormatter::report_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["outcomes"][0]["result"]["failed"]["kind"], "create-dir");
        assert_eq!(
            value["outcomes"][0]["result"]["failed"]["message"],
            "read-only file system"
        );
    }
}
