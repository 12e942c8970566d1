use std::collections::HashSet;

use crate::{
    cmark::split_emoji,
    corpus::Corpus,
    error::Result,
    lint::{Finding, LintContext, Rule, Severity},
};

/// Lessons contain every heading named in `lint.required-sections`.
pub struct RequiredSectionsRule;

impl Rule for RequiredSectionsRule {
    fn name(&self) -> &str {
        "required-sections"
    }

    fn description(&self) -> &str {
        "lessons contain the configured prose sections"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        let required = &ctx.config.lint.required_sections;
        let mut findings = Vec::new();

        if required.is_empty() {
            return Ok(findings);
        }

        for (_, _, lesson) in corpus.lessons() {
            let mut titles = HashSet::new();
            lesson.for_each_heading(|heading| {
                titles.insert(normalize(&heading.title));
            });

            let missing: Vec<_> = required
                .iter()
                .filter(|name| !titles.contains(&normalize(name)))
                .map(String::as_str)
                .collect();

            if !missing.is_empty() {
                findings.push(Finding::new(
                    &lesson.path,
                    format!("lesson is missing sections: {}", missing.join(", ")),
                ));
            }
        }

        Ok(findings)
    }
}

/// Lowercases a heading and removes a leading emoji and emphasis markers.
fn normalize(title: &str) -> String {
    let title: String = title.chars().filter(|c| !matches!(c, '*' | '_')).collect();
    let (_, title) = split_emoji(&title);

    title.to_lowercase()
}

/// Fenced code examples declare their language.
pub struct CodeLanguageRule;

impl Rule for CodeLanguageRule {
    fn name(&self) -> &str {
        "code-language"
    }

    fn description(&self) -> &str {
        "fenced code examples declare a language"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, _ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        let findings = corpus
            .lessons()
            .flat_map(|(_, _, lesson)| {
                lesson
                    .code_examples
                    .iter()
                    .filter(|example| example.fenced && example.lang.is_none())
                    .map(move |example| {
                        Finding::new(&lesson.path, "code example has no language tag")
                            .at(example.position)
                    })
            })
            .collect();

        Ok(findings)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{config::Config, lint::rules::fixture::*};

    fn run(rule: &dyn Rule, config: &Config, source: &str) -> Vec<Finding> {
        let corpus = corpus(vec![course(
            "rust/ownership",
            None,
            vec![section(
                "rust/ownership/01-moves",
                None,
                vec![lesson("rust/ownership/01-moves/01-moves.md", source)],
            )],
        )]);

        check(rule, config, &corpus)
    }

    #[test]
    fn accepts_lessons_with_all_sections() {
        let source = "# Moves\n## 📖 Introduction\n## **Key Concepts**\n## summary\n";

        assert!(run(&RequiredSectionsRule, &Config::default(), source).is_empty());
    }

    #[test]
    fn lists_missing_sections() {
        let source = "# Moves\n## Introduction\n";

        assert_eq!(
            vec!["lesson is missing sections: Key Concepts, Summary"],
            messages(&run(&RequiredSectionsRule, &Config::default(), source))
        );
    }

    #[test]
    fn empty_requirement_checks_nothing() {
        let mut config = Config::default();
        config.lint.required_sections.clear();

        assert!(run(&RequiredSectionsRule, &config, "no headings").is_empty());
    }

    #[test]
    fn reports_untagged_fenced_code() {
        let source = "# Moves\n\n```rust\nlet a = b;\n```\n\n```\nlet c = d;\n```\n\n    indented\n";
        let findings = run(&CodeLanguageRule, &Config::default(), source);

        assert_eq!(vec!["code example has no language tag"], messages(&findings));
        assert_eq!(Some(7), findings[0].position.map(|position| position.line));
    }
}
