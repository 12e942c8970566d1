use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::{
    error::Result,
    lint::{Diagnostic, Severity},
};

/// The outcome of a lint run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Sorted by path, then position, then rule.
    pub diagnostics: Vec<Diagnostic>,
    pub errors: usize,
    pub warnings: usize,
}

impl Report {
    pub fn new(mut diagnostics: Vec<Diagnostic>) -> Self {
        diagnostics.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.position.cmp(&b.position))
                .then_with(|| a.rule.cmp(&b.rule))
        });

        let errors = diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == Severity::Error)
            .count();
        let warnings = diagnostics.len() - errors;

        Self {
            diagnostics,
            errors,
            warnings,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Whether the run should fail: any error, or any warning when warnings are denied.
    pub fn has_failures(&self, deny_warnings: bool) -> bool {
        self.errors > 0 || (deny_warnings && self.warnings > 0)
    }

    pub fn render_text(&self, mut writer: impl Write, color: bool) -> Result<()> {
        for diagnostic in &self.diagnostics {
            let label = format!("{}[{}]", diagnostic.severity, diagnostic.rule);
            let label = match (color, diagnostic.severity) {
                (false, _) => label.normal(),
                (true, Severity::Error) => label.red().bold(),
                (true, Severity::Warning) => label.yellow().bold(),
            };

            write!(writer, "{label}: {}", diagnostic.path.display())?;
            if let Some(position) = diagnostic.position {
                write!(writer, ":{position}")?;
            }
            writeln!(writer, ": {}", diagnostic.message)?;
        }

        let summary = format!(
            "{} error{}, {} warning{}",
            self.errors,
            plural(self.errors),
            self.warnings,
            plural(self.warnings)
        );
        let summary = match (color, self.is_clean()) {
            (false, _) => summary.normal(),
            (true, true) => summary.green(),
            (true, false) => summary.bold(),
        };

        writeln!(writer, "{summary}")?;

        Ok(())
    }

    pub fn render_json(&self, mut writer: impl Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;

        Ok(())
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
