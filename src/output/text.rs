//! Text output formatter
//!
//! Lists are joined with a fixed separator so the output can be consumed
//! directly by shell scripts (`for img in $(imgdep rebuilds ...)`). Check
//! reports are written for humans, with colors when enabled.

use crate::domain::{CheckReport, FindingStatus};
use crate::output::OutputFormatter;
use crate::parser::{AttrValue, ExpectedAttrs};
use crate::selection::TestDecision;
use colored::Colorize;
use std::io::Write;

/// Text formatter for shell and human consumption
pub struct TextFormatter {
    separator: &'static str,
    color: bool,
}

impl TextFormatter {
    pub fn new(separator: &'static str, color: bool) -> Self {
        Self { separator, color }
    }

    fn status_label(&self, status: FindingStatus) -> String {
        let label = status.to_string();
        if !self.color {
            return label;
        }
        match status {
            FindingStatus::Missing => label.red().to_string(),
            FindingStatus::Mismatch => label.yellow().to_string(),
            FindingStatus::Automatic => label.yellow().to_string(),
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format_images(&self, images: &[String], writer: &mut dyn Write) -> std::io::Result<()> {
        if images.is_empty() {
            return Ok(());
        }
        writeln!(writer, "{}", images.join(self.separator))
    }

    fn format_reports(
        &self,
        reports: &[CheckReport],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        for report in reports {
            let failed = report.findings.len();
            let header = format!("{} packages", report.kind);
            if self.color {
                write!(writer, "{}", header.bold())?;
            } else {
                write!(writer, "{}", header)?;
            }

            let counts = format!(": {} checked, {} failed", report.checked, failed);
            if !self.color {
                writeln!(writer, "{}", counts)?;
            } else if failed == 0 {
                writeln!(writer, "{}", counts.green())?;
            } else {
                writeln!(writer, "{}", counts.red())?;
            }

            for finding in &report.findings {
                let mark = if self.color {
                    "✗".red().to_string()
                } else {
                    "-".to_string()
                };
                write!(
                    writer,
                    "  {} {}: {}",
                    mark,
                    finding.constraint,
                    self.status_label(finding.status)
                )?;
                match finding.installed {
                    Some(ref installed) if finding.status == FindingStatus::Mismatch => {
                        writeln!(writer, " (installed {})", installed)?
                    }
                    _ => writeln!(writer)?,
                }
            }
        }
        Ok(())
    }

    fn format_attrs(&self, attrs: &ExpectedAttrs, writer: &mut dyn Write) -> std::io::Result<()> {
        for (name, value) in attrs.iter() {
            let value = match value {
                AttrValue::Bool(flag) => flag.to_string(),
                AttrValue::Text(text) => text.clone(),
                AttrValue::List(items) => items.join(" "),
            };
            writeln!(writer, "{}={}", name, value)?;
        }
        Ok(())
    }

    fn format_decision(
        &self,
        decision: &TestDecision,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        writeln!(writer, "{}", decision)
    }
}
