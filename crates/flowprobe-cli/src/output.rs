//! Progress and summary output

use console::{style, Style, Term};
use flowprobe::{HarnessEvent, Outcome, ScenarioReport, SuiteResults};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Human-readable duration: `850ms`, `12.4s`, `3m 05s`
#[must_use]
pub fn describe_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Progress reporter for a journey run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenario runs
    pub fn start_progress(&mut self, total: u64) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, text: &str) {
        match &self.progress_bar {
            Some(pb) => pb.println(text),
            None => {
                let _ = self.term.write_line(text);
            }
        }
    }

    fn tag(&self, symbol: &str, plain: &str, paint: Style) -> String {
        if self.use_color {
            paint.bold().apply_to(symbol).to_string()
        } else {
            plain.to_string()
        }
    }

    /// React to a harness event
    pub fn on_event(&self, event: &HarnessEvent) {
        match event {
            HarnessEvent::Started { id, project, attempt } => {
                if let Some(ref pb) = self.progress_bar {
                    let suffix = if *attempt > 1 {
                        format!(" (attempt {attempt})")
                    } else {
                        String::new()
                    };
                    pb.set_message(format!("{id} [{project}]{suffix}"));
                }
            }
            HarnessEvent::Retrying { id, attempt, error } => {
                if !self.quiet {
                    let tag = self.tag("↻", "RETRY", Style::new().yellow());
                    self.line(&format!("{tag} {id} attempt {attempt}: {error}"));
                }
            }
            HarnessEvent::Finished(report) => {
                if let Some(ref pb) = self.progress_bar {
                    pb.inc(1);
                }
                self.scenario(report);
            }
        }
    }

    /// One line per finished scenario
    pub fn scenario(&self, report: &ScenarioReport) {
        let took = describe_duration(Duration::from_millis(report.duration_ms));
        let name = format!("{} {} [{}] ({took})", report.id, report.title, report.project);
        match &report.outcome {
            Outcome::Passed => {
                if !self.quiet {
                    let tag = self.tag("✓", "PASS", Style::new().green());
                    self.line(&format!("{tag} {name}"));
                }
            }
            Outcome::Skipped { reason } => {
                if !self.quiet {
                    let tag = self.tag("-", "SKIP", Style::new().yellow());
                    self.line(&format!("{tag} {name}: {reason}"));
                }
            }
            Outcome::Failed { error, evidence } => {
                let tag = self.tag("✗", "FAIL", Style::new().red());
                self.line(&format!("{tag} {name}"));
                self.line(&format!("    {error}"));
                if let Some(path) = evidence {
                    self.line(&format!("    screenshot: {}", path.display()));
                }
            }
        }
        if !self.quiet {
            for observation in &report.observations {
                self.line(&format!("    {}: {}", observation.label, observation.value));
            }
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let tag = self.tag("ℹ", "INFO", Style::new().blue());
        self.line(&format!("{tag} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let tag = self.tag("⚠", "WARN", Style::new().yellow());
        self.line(&format!("{tag} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Final tally; printed in quiet mode only when something failed
    pub fn summary(&self, results: &SuiteResults) {
        let failed = results.failed_count();
        if self.quiet && failed == 0 {
            return;
        }

        let passed = results.passed_count();
        let skipped = results.skipped_count();
        let took = describe_duration(Duration::from_millis(results.duration_ms));
        let aborted = if results.aborted { ", stopped early" } else { "" };
        let _ = self.term.write_line("");

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };
            let _ = self.term.write_line(&format!(
                "{status} {} scenarios in {took} ({} passed, {} failed, {} skipped{aborted})",
                results.total(),
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                Style::new().yellow().apply_to(skipped),
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {} scenarios in {took} ({passed} passed, {failed} failed, {skipped} skipped{aborted})",
                results.total()
            ));
        }
    }
}
