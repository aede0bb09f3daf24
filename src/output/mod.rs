//! Output formatting for command outcomes
//!
//! This module provides:
//! - Plain text output (newline- or space-joined lists) for shell consumption
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::domain::CheckReport;
use crate::orchestrator::Outcome;
use crate::parser::ExpectedAttrs;
use crate::selection::TestDecision;
use clap::ValueEnum;
use std::io::Write;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One item per line
    #[default]
    Lines,
    /// Items separated by single spaces
    Spaces,
    /// JSON document
    Json,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Whether to use colors in check reports
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            color: true,
        }
    }
}

impl OutputConfig {
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format an ordered list of image names
    fn format_images(&self, images: &[String], writer: &mut dyn Write) -> std::io::Result<()>;

    /// Format package check reports
    fn format_reports(&self, reports: &[CheckReport], writer: &mut dyn Write)
        -> std::io::Result<()>;

    /// Format expected build attributes
    fn format_attrs(&self, attrs: &ExpectedAttrs, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Format a test selection decision
    fn format_decision(&self, decision: &TestDecision, writer: &mut dyn Write)
        -> std::io::Result<()>;

    /// Format any command outcome
    fn format(&self, outcome: &Outcome, writer: &mut dyn Write) -> std::io::Result<()> {
        match outcome {
            Outcome::Images(images) => self.format_images(images, writer),
            Outcome::Reports(reports) => self.format_reports(reports, writer),
            Outcome::Attrs(attrs) => self.format_attrs(attrs, writer),
            Outcome::Decision(decision) => self.format_decision(decision, writer),
        }
    }
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Lines => Box::new(TextFormatter::new("\n", config.color)),
        OutputFormat::Spaces => Box::new(TextFormatter::new(" ", config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(config: OutputConfig, outcome: &Outcome) -> String {
        let formatter = create_formatter(config);
        let mut buf = Vec::new();
        formatter.format(outcome, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Lines);
    }

    #[test]
    fn test_output_config_default() {
        let config = OutputConfig::default();
        assert_eq!(config.format, OutputFormat::Lines);
        assert!(config.color);
    }

    #[test]
    fn test_create_formatter_lines() {
        let outcome = Outcome::Images(vec!["a".into(), "b".into()]);
        let out = render(OutputConfig::new(OutputFormat::Lines, false), &outcome);
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn test_create_formatter_spaces() {
        let outcome = Outcome::Images(vec!["a".into(), "b".into()]);
        let out = render(OutputConfig::new(OutputFormat::Spaces, false), &outcome);
        assert_eq!(out, "a b\n");
    }

    #[test]
    fn test_create_formatter_json() {
        let outcome = Outcome::Images(vec!["a".into()]);
        let out = render(OutputConfig::new(OutputFormat::Json, false), &outcome);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["images"][0], "a");
    }

    #[test]
    fn test_output_format_value_enum() {
        assert_eq!(OutputFormat::from_str("spaces", true), Ok(OutputFormat::Spaces));
        assert!(OutputFormat::from_str("diff", true).is_err());
    }
}
