//! Rules checked against a loaded corpus and the linter that runs them.

mod command;
pub mod rules;

pub use command::*;

use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    cmark::Position,
    config::Config,
    corpus::Corpus,
    error::Result,
    report::Report,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => formatter.write_str("warning"),
            Severity::Error => formatter.write_str("error"),
        }
    }
}

/// A problem reported by a rule, before the linter attaches the rule name and severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// The offending file, relative to the corpus source.
    pub path: PathBuf,
    #[serde(default)]
    pub position: Option<Position>,
    pub message: String,
}

impl Finding {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            position: None,
            message: message.into(),
        }
    }

    pub fn at(self, position: Position) -> Self {
        Self {
            position: Some(position),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    pub path: PathBuf,
    pub position: Option<Position>,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}[{}]: {}", self.severity, self.rule, self.path.display())?;

        if let Some(position) = self.position {
            write!(formatter, ":{position}")?;
        }

        write!(formatter, ": {}", self.message)
    }
}

/// A named check over the whole corpus.
pub trait Rule {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>>;
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy)]
pub struct LintContext<'a> {
    /// Root of the content tree (where course.toml lives).
    pub root: &'a Path,

    /// Configuration from the course.toml file.
    pub config: &'a Config,
}

impl<'a> LintContext<'a> {
    pub fn new(root: &'a Path, config: &'a Config) -> Self {
        Self { root, config }
    }
}

pub struct Linter {
    root: PathBuf,
    config: Config,
    corpus: Corpus,
    rules: Vec<Box<dyn Rule>>,
}

impl Linter {
    /// Loads configuration and content from `root` and registers the built in and configured
    /// external rules.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = Config::load_or_default(&root)?;

        Linter::with_config(root, config)
    }

    /// Like [`Linter::load`], with an already loaded configuration.
    pub fn with_config(root: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let root = root.into();
        let corpus = Corpus::load(&root, &config)?;

        Ok(Linter::new(root, config, corpus))
    }

    pub fn new(root: impl Into<PathBuf>, config: Config, corpus: Corpus) -> Self {
        let mut rules = rules::builtin();

        for (name, rule) in &config.rule {
            rules.push(Box::new(CommandRule::new(name.clone(), rule.clone())));
        }

        Self {
            root: root.into(),
            config,
            corpus,
            rules,
        }
    }

    pub fn with_rule(&mut self, rule: impl Rule + 'static) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> + '_ {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    /// Runs every enabled rule and collects the diagnostics into a report.
    pub fn run(&self) -> Result<Report> {
        let ctx = LintContext::new(&self.root, &self.config);
        let lint = &self.config.lint;
        let mut diagnostics = Vec::new();

        for name in lint.disabled.iter().chain(lint.severity.keys()) {
            if !self.rules.iter().any(|rule| rule.name() == name) {
                warn!(rule = %name, "configuration refers to an unknown rule");
            }
        }

        for rule in &self.rules {
            let name = rule.name();

            if !lint.is_enabled(name) {
                debug!(rule = name, "rule disabled");
                continue;
            }

            let severity = lint
                .severity
                .get(name)
                .copied()
                .unwrap_or_else(|| rule.default_severity());

            let findings = rule.check(&ctx, &self.corpus)?;
            debug!(rule = name, findings = findings.len(), "rule finished");

            diagnostics.extend(findings.into_iter().map(|finding| Diagnostic {
                rule: name.to_string(),
                severity,
                path: finding.path,
                position: finding.position,
                message: finding.message,
            }));
        }

        let report = Report::new(diagnostics);
        info!(
            errors = report.errors,
            warnings = report.warnings,
            "lint finished"
        );

        Ok(report)
    }
}
