use anyhow::Context;
use serde::Serialize;
use shlex::Shlex;
use std::{
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};
use tracing::debug;

use super::{Finding, LintContext, Rule, Severity};
use crate::{
    config::{Config, ExternalRuleConfig},
    corpus::Corpus,
    error::Result,
};

/// What an external rule receives on stdin.
#[derive(Debug, Serialize)]
pub struct CommandRuleInput<'a> {
    /// The root directory of the content tree.
    pub root: &'a Path,
    /// The configuration of the content tree.
    pub config: &'a Config,
    /// The loaded corpus itself.
    pub corpus: &'a Corpus,
}

/// A rule implemented by an external program. The program receives a [`CommandRuleInput`] as JSON
/// on stdin and prints a JSON array of [`Finding`]s on stdout.
pub struct CommandRule {
    name: String,
    config: ExternalRuleConfig,
}

impl CommandRule {
    pub fn new(name: String, config: ExternalRuleConfig) -> Self {
        Self { name, config }
    }
}

impl CommandRule {
    fn build_command(&self, root: &Path) -> Result<Command> {
        let mut parts = Shlex::new(&self.config.command);
        let Some(bin) = parts.next() else {
            anyhow::bail!("Command of rule {} is empty", self.name);
        };

        let bin = PathBuf::from(bin);
        let bin = if bin.components().count() == 1 {
            // Search for the binary in PATH.
            bin
        } else {
            // Search for the binary relative to the content root.
            root.join(bin)
        };

        let mut command = Command::new(bin);
        command.args(parts).current_dir(root);

        Ok(command)
    }
}

impl Rule for CommandRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        self.config
            .description
            .as_deref()
            .unwrap_or("external rule")
    }

    fn default_severity(&self) -> Severity {
        self.config.severity.unwrap_or(Severity::Error)
    }

    fn check(&self, ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        let input = CommandRuleInput {
            root: ctx.root,
            config: ctx.config,
            corpus,
        };
        let payload = serde_json::to_vec(&input)
            .with_context(|| format!("Failed to serialize input for rule {}", self.name))?;

        debug!(rule = %self.name, command = %self.config.command, "running external rule");

        let mut process = self
            .build_command(ctx.root)?
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to start rule {}", self.name))?;

        let mut stdin = process
            .stdin
            .take()
            .with_context(|| format!("Rule {} has no stdin", self.name))?;

        // Stdin is written while stdout is drained.
        let writer = thread::spawn(move || stdin.write_all(&payload));

        let output = process
            .wait_with_output()
            .with_context(|| format!("Failed to wait for rule {}", self.name))?;

        match writer.join() {
            Ok(Ok(())) => (),
            // Rules are free to ignore their input and exit early.
            Ok(Err(error)) if error.kind() == std::io::ErrorKind::BrokenPipe => (),
            Ok(Err(error)) => {
                return Err(error).with_context(|| format!("Failed to write to rule {}", self.name))
            }
            Err(_) => anyhow::bail!("Writer thread for rule {} panicked", self.name),
        }

        if !output.status.success() {
            anyhow::bail!("Rule {} failed ({}).", self.name, output.status);
        }

        serde_json::from_slice(&output.stdout)
            .with_context(|| format!("Rule {} printed invalid findings", self.name))
    }
}
