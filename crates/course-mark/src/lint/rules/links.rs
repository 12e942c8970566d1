use std::path::{Path, PathBuf};

use crate::{
    corpus::Corpus,
    error::Result,
    lint::{Finding, LintContext, Rule},
    model::Index,
};

/// Relative links in course and section READMEs point at files that exist.
pub struct ReadmeLinksRule;

impl Rule for ReadmeLinksRule {
    fn name(&self) -> &str {
        "readme-links"
    }

    fn description(&self) -> &str {
        "relative links in course and section READMEs resolve to existing files"
    }

    fn check(&self, ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        let config = &ctx.config.corpus;
        let mut findings = Vec::new();

        for course in &corpus.courses {
            if let Some(index) = &course.index {
                let readme = course.readme_path(config);
                findings.extend(broken_links(corpus, &course.path, readme, index));
            }

            for section in &course.sections {
                if let Some(index) = &section.index {
                    let readme = section.readme_path(config);
                    findings.extend(broken_links(corpus, &section.path, readme, index));
                }
            }
        }

        Ok(findings)
    }
}

fn broken_links<'a>(
    corpus: &'a Corpus,
    directory: &'a Path,
    readme: PathBuf,
    index: &'a Index,
) -> impl Iterator<Item = Finding> + 'a {
    index.links.iter().filter_map(move |link| {
        let target = link.local_path()?;
        let resolved = resolve(directory, &target);

        if corpus.absolute(&resolved).exists() {
            return None;
        }

        Some(
            Finding::new(
                readme.clone(),
                format!("link `{}` points to a missing file", link.destination),
            )
            .at(link.position),
        )
    })
}

/// Resolves a link target written in a README inside `directory`. Targets starting with `/` are
/// relative to the corpus source.
fn resolve(directory: &Path, target: &str) -> PathBuf {
    match target.strip_prefix('/') {
        Some(rooted) => PathBuf::from(rooted),
        None => directory.join(target),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn reports_links_to_missing_lessons() {
        let dir = TempDir::new().expect("tempdir");
        let section = dir.path().join("go/go-reflection/01-basics");
        fs::create_dir_all(&section).expect("create dirs");
        fs::write(dir.path().join("go/go-reflection/README.md"), "# Go").expect("write");
        fs::write(
            section.join("README.md"),
            "# Basics\n\n[Back](../README.md)\n\n1. [Types](01-types.md)\n2. [Values](02-values.md#intro)\n3. [Docs](https://go.dev)\n",
        )
        .expect("write");
        fs::write(section.join("01-types.md"), "# Types").expect("write");

        let config = Config::default();
        let corpus = Corpus::load(dir.path(), &config).expect("corpus loads");
        let ctx = LintContext::new(dir.path(), &config);
        let findings = ReadmeLinksRule.check(&ctx, &corpus).expect("rule runs");

        assert_eq!(1, findings.len());
        assert_eq!(
            "link `02-values.md#intro` points to a missing file",
            findings[0].message
        );
        assert_eq!(
            PathBuf::from("go/go-reflection/01-basics/README.md"),
            findings[0].path
        );
        assert_eq!(Some(6), findings[0].position.map(|position| position.line));
    }

    #[test]
    fn rooted_links_resolve_against_source() {
        assert_eq!(
            PathBuf::from("go/README.md"),
            resolve(Path::new("rust/course"), "/go/README.md")
        );
        assert_eq!(
            PathBuf::from("rust/course/../README.md"),
            resolve(Path::new("rust/course"), "../README.md")
        );
    }
}
