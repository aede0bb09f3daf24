//! JSON output formatter for machine processing

use crate::domain::CheckReport;
use crate::output::OutputFormatter;
use crate::parser::ExpectedAttrs;
use crate::selection::TestDecision;
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }

    fn write_json<T: Serialize>(&self, value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, value)?;
        writeln!(writer)
    }
}

#[derive(Serialize)]
struct JsonImages<'a> {
    images: &'a [String],
}

#[derive(Serialize)]
struct JsonReports<'a> {
    ok: bool,
    reports: &'a [CheckReport],
}

impl OutputFormatter for JsonFormatter {
    fn format_images(&self, images: &[String], writer: &mut dyn Write) -> std::io::Result<()> {
        self.write_json(&JsonImages { images }, writer)
    }

    fn format_reports(
        &self,
        reports: &[CheckReport],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonReports {
            ok: reports.iter().all(CheckReport::is_ok),
            reports,
        };
        self.write_json(&output, writer)
    }

    fn format_attrs(&self, attrs: &ExpectedAttrs, writer: &mut dyn Write) -> std::io::Result<()> {
        self.write_json(attrs, writer)
    }

    fn format_decision(
        &self,
        decision: &TestDecision,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write_json(decision, writer)
    }
}
