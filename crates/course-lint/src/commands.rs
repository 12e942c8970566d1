use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "course-lint")]
#[command(about = "Checks a markdown course tree for broken structure and metadata.")]
pub struct CommandLine {
    /// Increase logging verbosity (repeatable).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint the content tree and report diagnostics
    #[command(alias = "c")]
    Check {
        /// Root of the content tree (where course.toml lives)
        #[arg(default_value = ".")]
        root: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Fail on warnings as well as errors
        #[arg(long)]
        deny_warnings: bool,

        /// Only lint these tech directories (repeatable)
        #[arg(long = "tech", value_name = "NAME")]
        techs: Vec<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Print an inventory of courses, sections and lessons
    #[command(alias = "s")]
    Stats {
        #[arg(default_value = ".")]
        root: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List the built in rules
    Rules,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
