//! Human-readable end-of-batch summary

use crate::types::{DomainReport, RunStatus};
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Mutex;

/// Prints one line per seed domain, coloured when writing to a terminal
pub struct HumanReport {
    writer: Mutex<Box<dyn Write + Send>>,
    use_colors: bool,
}

impl HumanReport {
    /// Create a new HumanReport that writes to stdout
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }

    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            use_colors: false,
        }
    }

    fn format_line(&self, report: &DomainReport) -> String {
        let line = report.to_string();
        if !self.use_colors {
            return line;
        }

        match report.status {
            RunStatus::Completed { .. } => line.green().to_string(),
            RunStatus::Skipped => line.dimmed().to_string(),
            RunStatus::Failed(_) => line.red().bold().to_string(),
        }
    }

    pub fn print(&self, reports: &[DomainReport]) -> anyhow::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("Report writer lock poisoned"))?;

        for report in reports {
            writeln!(writer, "{}", self.format_line(report))?;
        }

        let failed = reports.iter().filter(|r| r.status.is_failure()).count();
        let summary = format!(
            "{} domains processed, {} failed",
            reports.len(),
            failed
        );
        if self.use_colors && failed > 0 {
            writeln!(writer, "{}", summary.yellow())?;
        } else {
            writeln!(writer, "{}", summary)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for HumanReport {
    fn default() -> Self {
        Self::new()
    }
}
