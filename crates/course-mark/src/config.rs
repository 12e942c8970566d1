use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
};
use toml::{value::Table, Value};

use crate::{
    error::{Error, Result},
    lint::Severity,
};

/// Name of the configuration file looked up in the corpus root.
pub const CONFIG_FILE: &str = "course.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Where the content lives and how it is laid out.
    pub corpus: CorpusConfig,

    /// Settings for the built in rules.
    pub lint: LintConfig,

    /// External rules keyed by rule name, from `[rule.<name>]` tables.
    pub rule: BTreeMap<String, ExternalRuleConfig>,

    /// Any remaining configuration, available to external rules.
    rest: Value,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let mut buffer = String::new();
        File::open(path)
            .with_context(|| "Failed to open config file")?
            .read_to_string(&mut buffer)
            .with_context(|| "Failed to read config file")?;

        Config::from_str(&buffer)
    }

    /// Loads `course.toml` from `root`, using the defaults when there is none.
    pub fn load_or_default(root: impl AsRef<Path>) -> Result<Config> {
        let path = root.as_ref().join(CONFIG_FILE);

        if path.is_file() {
            Config::load(&path).with_context(|| format!("Failed to load {}", path.display()))
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
    }

    /// Deserializes a table that is not part of the known configuration, e.g. settings consumed by
    /// an external rule.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.rest
            .get(key)
            .cloned()
            .and_then(|value| value.try_into().ok())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig::default(),
            lint: LintConfig::default(),
            rule: BTreeMap::new(),
            rest: Value::Table(Table::default()),
        }
    }
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let raw = Value::deserialize(deserializer)?;
        let Value::Table(mut table) = raw else {
            return Err(D::Error::custom("course.toml must always be a toml table"));
        };

        let corpus: CorpusConfig = table
            .remove("corpus")
            .map(|corpus| corpus.try_into().map_err(D::Error::custom))
            .transpose()?
            .unwrap_or_default();

        let lint: LintConfig = table
            .remove("lint")
            .map(|lint| lint.try_into().map_err(D::Error::custom))
            .transpose()?
            .unwrap_or_default();

        let rule: BTreeMap<String, ExternalRuleConfig> = table
            .remove("rule")
            .map(|rule| rule.try_into().map_err(D::Error::custom))
            .transpose()?
            .unwrap_or_default();

        let config = Config {
            corpus,
            lint,
            rule,
            rest: Value::Table(table),
        };

        Ok(config)
    }
}

impl Serialize for Config {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::Error;

        let mut table = match &self.rest {
            Value::Table(table) => table.clone(),
            _ => Table::default(),
        };

        let corpus = Value::try_from(&self.corpus).map_err(S::Error::custom)?;
        let lint = Value::try_from(&self.lint).map_err(S::Error::custom)?;
        let rule = Value::try_from(&self.rule).map_err(S::Error::custom)?;

        table.insert(String::from("corpus"), corpus);
        table.insert(String::from("lint"), lint);
        table.insert(String::from("rule"), rule);

        table.serialize(serializer)
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        toml::from_str(source).with_context(|| "Attempted to parse invalid configuration file")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct CorpusConfig {
    /// Relative path from the root to the directory holding the tech directories.
    pub source: PathBuf,
    /// File name of course and section indexes.
    pub readme: String,
    /// Host of the learning platform that call to action links point to.
    pub platform_host: String,
    /// When not empty, only these tech directories are loaded.
    pub techs: Vec<String>,
    /// Directory names skipped while walking the tree.
    pub exclude: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            readme: String::from("README.md"),
            platform_host: String::from("stanza.dev"),
            techs: Vec::new(),
            exclude: vec![String::from("target"), String::from("node_modules")],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct LintConfig {
    /// Treat warnings as failures.
    pub deny_warnings: bool,
    /// Names of rules that are not run.
    pub disabled: Vec<String>,
    /// Per rule severity overrides.
    pub severity: BTreeMap<String, Severity>,
    /// Require `source_lesson` to equal the slug of the lesson file.
    pub lesson_slug_match: bool,
    /// Regular expression the last paragraph of every lesson must match.
    pub footer_pattern: String,
    /// Headings every lesson must contain, compared case-insensitively.
    pub required_sections: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            deny_warnings: false,
            disabled: Vec::new(),
            severity: BTreeMap::new(),
            lesson_slug_match: false,
            footer_pattern: String::from("(?i)stanza"),
            required_sections: vec![
                String::from("Introduction"),
                String::from("Key Concepts"),
                String::from("Summary"),
            ],
        }
    }
}

impl LintConfig {
    pub fn is_enabled(&self, rule: &str) -> bool {
        !self.disabled.iter().any(|disabled| disabled == rule)
    }
}

/// An external rule run as a separate process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ExternalRuleConfig {
    /// Command line of the rule, split with shell quoting rules.
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_str("").expect("should parse");

        assert_eq!(Config::default(), config);
    }

    #[test]
    fn parses_known_tables() {
        let config = Config::from_str(
            r#"
[corpus]
source = "content"
techs = ["go", "rust"]

[lint]
deny-warnings = true
disabled = ["code-language"]
required-sections = ["Summary"]

[lint.severity]
naming = "error"
"#,
        )
        .expect("should parse");

        assert_eq!(PathBuf::from("content"), config.corpus.source);
        assert_eq!(vec!["go", "rust"], config.corpus.techs);
        assert_eq!("README.md", config.corpus.readme);
        assert!(config.lint.deny_warnings);
        assert!(!config.lint.is_enabled("code-language"));
        assert!(config.lint.is_enabled("naming"));
        assert_eq!(Some(&Severity::Error), config.lint.severity.get("naming"));
        assert_eq!(vec!["Summary"], config.lint.required_sections);
    }

    #[test]
    fn parses_external_rules() {
        let config = Config::from_str(
            r#"
[rule.spellcheck]
command = "scripts/spellcheck --strict"
severity = "warning"
"#,
        )
        .expect("should parse");

        let rule = config.rule.get("spellcheck").expect("rule is configured");

        assert_eq!("scripts/spellcheck --strict", rule.command);
        assert_eq!(Some(Severity::Warning), rule.severity);
    }

    #[test]
    fn keeps_unknown_tables() {
        #[derive(Debug, Deserialize, PartialEq, Eq)]
        #[serde(rename_all = "kebab-case")]
        struct Spelling {
            dictionary: String,
        }

        let config = Config::from_str("[spelling]\ndictionary = \"en-US\"").expect("should parse");

        assert_eq!(
            Some(Spelling {
                dictionary: String::from("en-US")
            }),
            config.get("spelling")
        );
    }

    #[test]
    fn rejects_unknown_severity() {
        assert!(Config::from_str("[lint.severity]\nnaming = \"fatal\"").is_err());
    }
}
