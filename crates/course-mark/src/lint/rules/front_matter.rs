use crate::{
    cmark::Position,
    corpus::Corpus,
    error::Result,
    lint::{Finding, LintContext, Rule},
    model::FrontMatterState,
};

/// Every lesson carries `source_course` and `source_lesson`, and `source_course` names the course
/// the lesson lives in.
pub struct FrontMatterRule;

impl Rule for FrontMatterRule {
    fn name(&self) -> &str {
        "front-matter"
    }

    fn description(&self) -> &str {
        "lesson front matter is present and matches the containing course"
    }

    fn check(&self, ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for (course, _, lesson) in corpus.lessons() {
            let front_matter = match &lesson.front_matter {
                FrontMatterState::Present(front_matter) => front_matter,
                FrontMatterState::Missing => {
                    findings.push(Finding::new(&lesson.path, "lesson has no front matter"));
                    continue;
                }
                FrontMatterState::Invalid { message, line } => {
                    findings.push(
                        Finding::new(&lesson.path, format!("invalid front matter: {message}"))
                            .at(Position {
                                line: *line,
                                column: 0,
                            }),
                    );
                    continue;
                }
            };

            match front_matter.source_course.as_deref().map(str::trim) {
                None | Some("") => {
                    findings.push(Finding::new(
                        &lesson.path,
                        "front matter is missing `source_course`",
                    ));
                }
                Some(source_course) if source_course != course.slug => {
                    findings.push(Finding::new(
                        &lesson.path,
                        format!(
                            "`source_course` is `{source_course}` but the lesson belongs to `{}`",
                            course.slug
                        ),
                    ));
                }
                Some(_) => (),
            }

            match front_matter.source_lesson.as_deref().map(str::trim) {
                None | Some("") => {
                    findings.push(Finding::new(
                        &lesson.path,
                        "front matter is missing `source_lesson`",
                    ));
                }
                Some(source_lesson)
                    if ctx.config.lint.lesson_slug_match && source_lesson != lesson.slug() =>
                {
                    findings.push(Finding::new(
                        &lesson.path,
                        format!(
                            "`source_lesson` is `{source_lesson}` but the file slug is `{}`",
                            lesson.slug()
                        ),
                    ));
                }
                Some(_) => (),
            }
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{config::Config, lint::rules::fixture::*};

    fn run(config: &Config, source: &str) -> Vec<Finding> {
        let corpus = corpus(vec![course(
            "react/react-hooks-deep-dive",
            None,
            vec![section(
                "react/react-hooks-deep-dive/01-core",
                None,
                vec![lesson(
                    "react/react-hooks-deep-dive/01-core/01-use-state.md",
                    source,
                )],
            )],
        )]);

        check(&FrontMatterRule, config, &corpus)
    }

    #[test]
    fn accepts_matching_front_matter() {
        let findings = run(
            &Config::default(),
            "---\nsource_course: react-hooks-deep-dive\nsource_lesson: state\n---\n# useState",
        );

        assert_eq!(Vec::<Finding>::new(), findings);
    }

    #[test]
    fn reports_missing_front_matter() {
        let findings = run(&Config::default(), "# useState");

        assert_eq!(vec!["lesson has no front matter"], messages(&findings));
    }

    #[test]
    fn reports_course_mismatch() {
        let findings = run(
            &Config::default(),
            "---\nsource_course: react-basics\nsource_lesson: state\n---\n",
        );

        assert_eq!(
            vec!["`source_course` is `react-basics` but the lesson belongs to `react-hooks-deep-dive`"],
            messages(&findings)
        );
    }

    #[test]
    fn reports_missing_keys() {
        let findings = run(&Config::default(), "---\nsource_course: \"\"\n---\n");

        assert_eq!(
            vec![
                "front matter is missing `source_course`",
                "front matter is missing `source_lesson`"
            ],
            messages(&findings)
        );
    }

    #[test]
    fn reports_invalid_front_matter_with_line() {
        let findings = run(&Config::default(), "---\nsource_course react\n---\n");

        assert_eq!(1, findings.len());
        assert_eq!(Some(2), findings[0].position.map(|position| position.line));
    }

    #[test]
    fn checks_lesson_slug_when_enabled() {
        let mut config = Config::default();
        let source = "---\nsource_course: react-hooks-deep-dive\nsource_lesson: state\n---\n";

        assert!(run(&config, source).is_empty());

        config.lint.lesson_slug_match = true;
        assert_eq!(
            vec!["`source_lesson` is `state` but the file slug is `use-state`"],
            messages(&run(&config, source))
        );
    }
}
