use std::{
    collections::{BTreeMap, HashSet},
    path::{Component, Path},
};

use crate::{
    corpus::Corpus,
    error::Result,
    lint::{Finding, LintContext, Rule, Severity},
    model::{NumberedName, Section},
};

/// Every course and every section has a README index.
pub struct ReadmePresentRule;

impl Rule for ReadmePresentRule {
    fn name(&self) -> &str {
        "readme-present"
    }

    fn description(&self) -> &str {
        "every course and section has a README"
    }

    fn check(&self, ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        let config = &ctx.config.corpus;
        let mut findings = Vec::new();

        for course in &corpus.courses {
            if course.index.is_none() {
                findings.push(Finding::new(
                    &course.path,
                    format!("course has no {}", config.readme),
                ));
            }

            for section in &course.sections {
                if section.index.is_none() {
                    findings.push(Finding::new(
                        &section.path,
                        format!("section has no {}", config.readme),
                    ));
                }
            }
        }

        Ok(findings)
    }
}

/// Sections and lessons follow the `<number>-<slug>` naming convention with unique numbers.
pub struct NamingRule;

impl Rule for NamingRule {
    fn name(&self) -> &str {
        "naming"
    }

    fn description(&self) -> &str {
        "section directories and lesson files are named `<number>-<slug>` with unique numbers"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, _ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for course in &corpus.courses {
            for stray in &course.stray_files {
                findings.push(Finding::new(
                    stray,
                    "markdown file sits directly in the course instead of a section",
                ));
            }

            let sections = course
                .sections
                .iter()
                .map(|section| (section.numbered.as_ref(), section.path.as_path()));
            findings.extend(check_names("section directory", sections));

            for section in &course.sections {
                let lessons = section
                    .lessons
                    .iter()
                    .map(|lesson| (lesson.numbered.as_ref(), lesson.path.as_path()));
                findings.extend(check_names("lesson file", lessons));
            }
        }

        Ok(findings)
    }
}

fn check_names<'a>(
    kind: &str,
    items: impl Iterator<Item = (Option<&'a NumberedName>, &'a Path)>,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut numbers: BTreeMap<u32, &Path> = BTreeMap::new();

    for (numbered, path) in items {
        let Some(numbered) = numbered else {
            findings.push(Finding::new(
                path,
                format!("{kind} is not named `<number>-<slug>`"),
            ));
            continue;
        };

        if let Some(first) = numbers.insert(numbered.number, path) {
            findings.push(Finding::new(
                path,
                format!(
                    "{kind} reuses number {} already taken by `{}`",
                    numbered.number,
                    file_name(first)
                ),
            ));
            numbers.insert(numbered.number, first);
        }
    }

    findings
}

/// Every lesson file is listed in its section README, in lesson order.
pub struct LessonListingRule;

impl Rule for LessonListingRule {
    fn name(&self) -> &str {
        "lesson-listing"
    }

    fn description(&self) -> &str {
        "section READMEs list every lesson of the section in numbered order"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for (_, section) in corpus.sections() {
            findings.extend(check_listing(section, &section.readme_path(&ctx.config.corpus)));
        }

        Ok(findings)
    }
}

fn check_listing(section: &Section, readme: &Path) -> Vec<Finding> {
    let Some(index) = &section.index else {
        return Vec::new();
    };

    let present: HashSet<&str> = section
        .lessons
        .iter()
        .map(|lesson| lesson.file_name.as_str())
        .collect();

    // Listed lessons of this section, in README order, ignoring links into other directories.
    let listed: Vec<_> = index
        .lessons
        .iter()
        .filter_map(|link| {
            let target = link.local_path()?;
            let name = sibling_file_name(&target)?;

            present.contains(name.as_str()).then_some((name, link))
        })
        .collect();

    let mut findings = Vec::new();
    let listed_names: HashSet<&str> = listed.iter().map(|(name, _)| name.as_str()).collect();

    for lesson in &section.lessons {
        if !listed_names.contains(lesson.file_name.as_str()) {
            findings.push(Finding::new(
                &lesson.path,
                format!("lesson is not listed in {}", file_name(readme)),
            ));
        }
    }

    let expected: Vec<&str> = section
        .lessons
        .iter()
        .map(|lesson| lesson.file_name.as_str())
        .filter(|name| listed_names.contains(name))
        .collect();

    let mut seen = HashSet::new();
    let actual: Vec<_> = listed
        .iter()
        .filter(|(name, _)| seen.insert(name.as_str()))
        .collect();

    if let Some(((name, link), wanted)) = actual
        .iter()
        .zip(&expected)
        .find(|((name, _), wanted)| name.as_str() != **wanted)
    {
        findings.push(
            Finding::new(
                readme,
                format!("`{name}` is listed where `{wanted}` was expected"),
            )
            .at(link.position),
        );
    }

    findings
}

/// The file name of a link target that stays within the README's own directory.
fn sibling_file_name(target: &str) -> Option<String> {
    let mut components = Path::new(target)
        .components()
        .filter(|component| !matches!(component, Component::CurDir));

    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
