use anyhow::Context;
use regex::Regex;

use crate::{
    corpus::Corpus,
    error::Result,
    lint::{Finding, LintContext, Rule},
};

/// Every lesson ends with an attribution paragraph matching `lint.footer-pattern`.
pub struct AttributionFooterRule;

impl Rule for AttributionFooterRule {
    fn name(&self) -> &str {
        "attribution-footer"
    }

    fn description(&self) -> &str {
        "lessons end with the attribution footer"
    }

    fn check(&self, ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        let pattern = &ctx.config.lint.footer_pattern;
        let footer = Regex::new(pattern)
            .with_context(|| format!("Invalid lint.footer-pattern `{pattern}`"))?;
        let mut findings = Vec::new();

        for (_, _, lesson) in corpus.lessons() {
            match &lesson.footer {
                Some(last) if footer.is_match(&last.text) => (),
                Some(last) => findings.push(
                    Finding::new(
                        &lesson.path,
                        "last paragraph is not an attribution footer",
                    )
                    .at(last.position),
                ),
                None => findings.push(Finding::new(
                    &lesson.path,
                    "lesson does not end with an attribution footer",
                )),
            }
        }

        Ok(findings)
    }
}
