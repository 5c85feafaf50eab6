//! Report output for sed-upload (text, json)

use clap::ValueEnum;
use colored::Colorize;
use sed_uploader::{RunResult, RunVerdict, UploadOutcome};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    #[default]
    Text,
    /// JSON document
    Json,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    /// List failed files below the summary
    pub show_failures: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, show_failures: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self {
            format,
            show_failures,
        }
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print the final report of a run
    pub fn report(&self, result: &RunResult) {
        match self.format {
            OutputFormat::Text => self.print_text(result),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&JsonReport::from(result))
                        .unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
    }

    fn print_text(&self, result: &RunResult) {
        println!();
        println!("{}", "Upload results".bold());
        println!("  {}  {} file(s)", "Succeeded:".green(), result.success);
        println!("  {}     {} file(s)", "Failed:".red(), result.failed);
        println!("  Total:      {} file(s)", result.total);
        if let Some(rate) = result.success_rate() {
            println!("  Success rate: {}", format_rate(rate));
        }

        if self.show_failures {
            for line in failure_lines(&result.outcomes) {
                println!("    {}", line.yellow());
            }
        }

        println!();
        let closing = closing_line(result.verdict());
        match result.verdict() {
            RunVerdict::Succeeded => println!("{}", closing.green()),
            RunVerdict::NoFiles => println!("{}", closing.yellow()),
            RunVerdict::AllFailed => println!("{}", closing.red()),
        }
    }
}

/// JSON shape of the report
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    success: usize,
    failed: usize,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    success_rate: Option<f64>,
    verdict: RunVerdict,
    outcomes: &'a [UploadOutcome],
}

impl<'a> From<&'a RunResult> for JsonReport<'a> {
    fn from(result: &'a RunResult) -> Self {
        Self {
            success: result.success,
            failed: result.failed,
            total: result.total,
            success_rate: result.success_rate(),
            verdict: result.verdict(),
            outcomes: &result.outcomes,
        }
    }
}

/// Success rate with one decimal
fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate)
}

fn closing_line(verdict: RunVerdict) -> &'static str {
    match verdict {
        RunVerdict::Succeeded => "Upload complete",
        RunVerdict::NoFiles => "No files to upload",
        RunVerdict::AllFailed => "Upload failed",
    }
}

/// One line per failed outcome: `device/date [kind] message`
fn failure_lines(outcomes: &[UploadOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|o| {
            o.failure
                .as_ref()
                .map(|f| format!("{}/{} [{}] {}", o.device_id, o.date, f.kind, f.message))
        })
        .collect()
}
