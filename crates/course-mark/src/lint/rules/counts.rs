use std::path::PathBuf;

use crate::{
    corpus::Corpus,
    error::Result,
    lint::{Finding, LintContext, Rule},
    model::Index,
};

/// "N lessons" announced by a README equals the number of lesson files.
pub struct LessonCountRule;

impl Rule for LessonCountRule {
    fn name(&self) -> &str {
        "lesson-count"
    }

    fn description(&self) -> &str {
        "lesson counts announced in READMEs match the lesson files present"
    }

    fn check(&self, ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        let config = &ctx.config.corpus;
        let mut findings = Vec::new();

        for course in &corpus.courses {
            if let Some(declared) = course.declared_lesson_count() {
                let actual = course.lesson_count();

                if declared != actual {
                    findings.push(Finding::new(
                        course.readme_path(config),
                        format!("course README announces {declared} lessons but {actual} exist"),
                    ));
                }
            }

            for section in &course.sections {
                let Some(declared) = section
                    .index
                    .as_ref()
                    .and_then(|index| index.declared_lesson_count)
                else {
                    continue;
                };
                let actual = section.lessons.len();

                if declared != actual {
                    findings.push(Finding::new(
                        section.readme_path(config),
                        format!("section README announces {declared} lessons but {actual} exist"),
                    ));
                }
            }
        }

        Ok(findings)
    }
}

/// "N practice challenges" announced by a README equals the number of challenges listed. A course
/// README that lists no challenges of its own is compared with the total of its sections.
pub struct ChallengeCountRule;

impl Rule for ChallengeCountRule {
    fn name(&self) -> &str {
        "challenge-count"
    }

    fn description(&self) -> &str {
        "course and section READMEs list as many practice challenges as they announce"
    }

    fn check(&self, ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        let config = &ctx.config.corpus;
        let mut findings = Vec::new();

        for course in &corpus.courses {
            if let Some(index) = &course.index {
                let listed = if index.challenges.is_empty() {
                    course
                        .sections
                        .iter()
                        .map(|section| section.challenges().len())
                        .sum::<usize>()
                } else {
                    index.challenges.len()
                };

                findings.extend(check_challenges(course.readme_path(config), index, listed));
            }

            for section in &course.sections {
                if let Some(index) = &section.index {
                    let listed = index.challenges.len();
                    findings.extend(check_challenges(section.readme_path(config), index, listed));
                }
            }
        }

        Ok(findings)
    }
}

fn check_challenges(readme: PathBuf, index: &Index, listed: usize) -> Option<Finding> {
    let declared = index.declared_challenge_count?;

    (declared != listed).then(|| {
        Finding::new(
            readme,
            format!("README announces {declared} practice challenges but lists {listed}"),
        )
    })
}
