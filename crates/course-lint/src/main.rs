mod commands;
mod logging;

use anyhow::Context;
use colored::Colorize;
use commands::{CommandLine, Commands, Format};
use course_mark::{
    config::Config,
    corpus::{CourseStats, Corpus},
    lint::{rules, Linter},
};
use std::{
    io::{self, IsTerminal, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.quiet);

    match run(commands.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}

/// Runs a command, returning whether it passed.
fn run(command: Commands) -> anyhow::Result<bool> {
    match command {
        Commands::Check {
            root,
            format,
            deny_warnings,
            techs,
            no_color,
        } => check(root, format, deny_warnings, techs, no_color),
        Commands::Stats { root, format } => stats(root, format).map(|_| true),
        Commands::Rules => list_rules().map(|_| true),
    }
}

fn load_config(root: &Path, techs: Vec<String>) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(root)?;

    if !techs.is_empty() {
        config.corpus.techs = techs;
    }

    Ok(config)
}

fn check(
    root: PathBuf,
    format: Format,
    deny_warnings: bool,
    techs: Vec<String>,
    no_color: bool,
) -> anyhow::Result<bool> {
    let config = load_config(&root, techs)?;
    let deny_warnings = deny_warnings || config.lint.deny_warnings;

    let linter = Linter::with_config(&root, config)
        .with_context(|| format!("Failed to load content from {}", root.display()))?;
    let report = linter.run()?;

    let stdout = io::stdout();
    match format {
        Format::Text => {
            let color = !no_color && stdout.is_terminal();
            report.render_text(stdout.lock(), color)?;
        }
        Format::Json => report.render_json(stdout.lock())?,
    }

    Ok(!report.has_failures(deny_warnings))
}

fn stats(root: PathBuf, format: Format) -> anyhow::Result<()> {
    let config = load_config(&root, Vec::new())?;
    let corpus = Corpus::load(&root, &config)
        .with_context(|| format!("Failed to load content from {}", root.display()))?;
    let stats = corpus.stats();

    let mut stdout = io::stdout().lock();
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut stdout, &stats)?;
            writeln!(stdout)?;
        }
        Format::Text => {
            for course in &stats.courses {
                writeln!(stdout, "{}/{} ({})", course.tech, course.slug, course.title)?;
                write_counts(&mut stdout, course)?;
            }

            writeln!(stdout, "total: {} courses", stats.courses.len())?;
            write_counts(&mut stdout, &stats.totals)?;
        }
    }

    Ok(())
}

fn write_counts(writer: &mut impl Write, stats: &CourseStats) -> io::Result<()> {
    writeln!(
        writer,
        "  sections: {}, lessons: {}, code examples: {}, challenges: {}",
        stats.sections, stats.lessons, stats.code_examples, stats.challenges
    )?;

    if !stats.languages.is_empty() {
        let languages: Vec<_> = stats
            .languages
            .iter()
            .map(|(lang, count)| format!("{lang} {count}"))
            .collect();
        writeln!(writer, "  languages: {}", languages.join(", "))?;
    }

    Ok(())
}

fn list_rules() -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();

    for rule in rules::builtin() {
        writeln!(
            stdout,
            "{:<20} {:<8} {}",
            rule.name(),
            rule.default_severity().to_string(),
            rule.description()
        )?;
    }

    Ok(())
}
