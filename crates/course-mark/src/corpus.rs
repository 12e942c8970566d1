use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::{
    config::{Config, CorpusConfig},
    error::Result,
    model::{Course, Lesson, Section},
};

/// Every course found below the source directory of a content tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    /// The directory holding the tech directories. Every model path is relative to it.
    pub source: PathBuf,
    pub courses: Vec<Course>,
}

pub(crate) enum Entry {
    Directory(String),
    File(String),
}

/// Lists the visible, non excluded entries of a directory sorted by name.
pub(crate) fn entries(path: &Path, config: &CorpusConfig) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let read_dir = fs::read_dir(path)
        .with_context(|| format!("Failed to read directory: {}", path.display()))?;

    for entry in read_dir {
        let entry =
            entry.with_context(|| format!("Failed to read directory: {}", path.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();

        if name.starts_with('.') || config.exclude.iter().any(|excluded| *excluded == name) {
            continue;
        }

        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to inspect {}", entry.path().display()))?;

        if file_type.is_dir() {
            entries.push(Entry::Directory(name));
        } else {
            entries.push(Entry::File(name));
        }
    }

    entries.sort_by(|a, b| entry_name(a).cmp(entry_name(b)));

    Ok(entries)
}

/// README names are matched case-insensitively.
pub(crate) fn is_readme(name: &str, config: &CorpusConfig) -> bool {
    name.eq_ignore_ascii_case(&config.readme)
}

fn entry_name(entry: &Entry) -> &str {
    match entry {
        Entry::Directory(name) | Entry::File(name) => name,
    }
}

impl Corpus {
    /// Loads every course below `root.join(config.corpus.source)`.
    pub fn load(root: impl AsRef<Path>, config: &Config) -> Result<Corpus> {
        let source = root.as_ref().join(&config.corpus.source);
        let corpus_config = &config.corpus;
        let mut courses = Vec::new();

        info!(source = %source.display(), "loading corpus");

        for tech in entries(&source, corpus_config)? {
            let Entry::Directory(tech) = tech else {
                continue;
            };

            if !corpus_config.techs.is_empty() && !corpus_config.techs.contains(&tech) {
                debug!(tech = %tech, "skipping tech not selected by config");
                continue;
            }

            for course in entries(&source.join(&tech), corpus_config)? {
                let Entry::Directory(course) = course else {
                    continue;
                };

                let path = PathBuf::from(&tech).join(&course);
                if !is_course_directory(&source.join(&path), corpus_config)? {
                    debug!(path = %path.display(), "skipping directory without README or sections");
                    continue;
                }

                courses.push(Course::load(&source, &tech, path, corpus_config)?);
            }
        }

        info!(courses = courses.len(), "loaded corpus");

        Ok(Corpus { source, courses })
    }

    /// Iterates every lesson together with its course and section.
    pub fn lessons(&self) -> impl Iterator<Item = (&Course, &Section, &Lesson)> + '_ {
        self.courses.iter().flat_map(|course| {
            course.sections.iter().flat_map(move |section| {
                section
                    .lessons
                    .iter()
                    .map(move |lesson| (course, section, lesson))
            })
        })
    }

    /// Iterates every section together with its course.
    pub fn sections(&self) -> impl Iterator<Item = (&Course, &Section)> + '_ {
        self.courses.iter().flat_map(|course| {
            course
                .sections
                .iter()
                .map(move |section| (course, section))
        })
    }

    /// Resolves a model path against the source directory.
    pub fn absolute(&self, path: impl AsRef<Path>) -> PathBuf {
        self.source.join(path)
    }

    pub fn stats(&self) -> Stats {
        let courses: Vec<CourseStats> = self.courses.iter().map(CourseStats::from).collect();

        let mut totals = CourseStats::default();

        for course in &courses {
            totals.sections += course.sections;
            totals.lessons += course.lessons;
            totals.code_examples += course.code_examples;
            totals.challenges += course.challenges;

            for (lang, count) in &course.languages {
                *totals.languages.entry(lang.clone()).or_default() += count;
            }
        }

        Stats { courses, totals }
    }
}

fn is_course_directory(path: &Path, config: &CorpusConfig) -> Result<bool> {
    Ok(entries(path, config)?.iter().any(|entry| match entry {
        Entry::Directory(_) => true,
        Entry::File(name) => is_readme(name, config),
    }))
}

/// Inventory of a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub courses: Vec<CourseStats>,
    /// Sums across all courses; `tech`, `slug` and `title` are empty.
    pub totals: CourseStats,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseStats {
    pub tech: String,
    pub slug: String,
    pub title: String,
    pub sections: usize,
    pub lessons: usize,
    pub code_examples: usize,
    pub challenges: usize,
    /// Code examples per language tag; untagged examples are counted under `none`.
    pub languages: BTreeMap<String, usize>,
}

impl From<&Course> for CourseStats {
    fn from(course: &Course) -> Self {
        let mut languages = BTreeMap::new();
        let mut code_examples = 0;

        for section in &course.sections {
            for lesson in &section.lessons {
                for example in &lesson.code_examples {
                    code_examples += 1;

                    let lang = example.lang.as_deref().unwrap_or("none").to_lowercase();
                    *languages.entry(lang).or_default() += 1;
                }
            }
        }

        CourseStats {
            tech: course.tech.clone(),
            slug: course.slug.clone(),
            title: course.title().to_string(),
            sections: course.sections.len(),
            lessons: course.lesson_count(),
            code_examples,
            challenges: course
                .sections
                .iter()
                .map(|section| section.challenges().len())
                .sum(),
            languages,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, path: &str, contents: &str) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().expect("path has a parent")).expect("create dirs");
        fs::write(path, contents).expect("write file");
    }

    fn corpus() -> (TempDir, Corpus) {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();

        write(root, "go/go-reflection/README.md", "# 🐹 Go Reflection\n\n2 lessons.");
        write(root, "go/go-reflection/01-basics/README.md", "# Basics");
        write(
            root,
            "go/go-reflection/01-basics/02-values.md",
            "# Values\n\n```go\nreflect.ValueOf(x)\n```\n",
        );
        write(
            root,
            "go/go-reflection/01-basics/01-types.md",
            "# Types\n\n```Go\nreflect.TypeOf(x)\n```\n\n```\nuntagged\n```\n",
        );
        write(root, "go/.drafts/README.md", "# Hidden");
        write(root, "rust/notes.md", "# Not a course");
        write(root, "rust/ownership/01-moves/01-moves.md", "# Moves");

        let corpus = Corpus::load(root, &Config::default()).expect("corpus loads");

        (dir, corpus)
    }

    #[test]
    fn loads_courses_sorted_and_skips_hidden_directories() {
        let (_dir, corpus) = corpus();
        let slugs: Vec<_> = corpus
            .courses
            .iter()
            .map(|course| (course.tech.as_str(), course.slug.as_str()))
            .collect();

        assert_eq!(vec![("go", "go-reflection"), ("rust", "ownership")], slugs);
    }

    #[test]
    fn orders_lessons_by_number() {
        let (_dir, corpus) = corpus();
        let lessons: Vec<_> = corpus
            .lessons()
            .map(|(_, _, lesson)| lesson.file_name.as_str())
            .collect();

        assert_eq!(vec!["01-types.md", "02-values.md", "01-moves.md"], lessons);
    }

    #[test]
    fn derives_course_title_and_emoji_from_readme() {
        let (_dir, corpus) = corpus();
        let course = &corpus.courses[0];

        assert_eq!("Go Reflection", course.title());
        assert_eq!(Some("🐹"), course.emoji());
        assert_eq!(Some(2), course.declared_lesson_count());
        assert_eq!("ownership", corpus.courses[1].title());
    }

    #[test]
    fn restricts_techs_from_config() {
        let (dir, _) = corpus();
        let mut config = Config::default();
        config.corpus.techs = vec![String::from("rust")];

        let corpus = Corpus::load(dir.path(), &config).expect("corpus loads");

        assert_eq!(1, corpus.courses.len());
        assert_eq!("rust", corpus.courses[0].tech);
    }

    #[test]
    fn counts_code_examples_per_language() {
        let (_dir, corpus) = corpus();
        let stats = corpus.stats();

        assert_eq!(3, stats.totals.lessons);
        assert_eq!(2, stats.totals.sections);
        assert_eq!(3, stats.totals.code_examples);
        assert_eq!(Some(&2), stats.totals.languages.get("go"));
        assert_eq!(Some(&1), stats.totals.languages.get("none"));
    }

    #[test]
    fn matches_readme_names_case_insensitively() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "go/basics/readme.md", "# Basics");
        write(dir.path(), "go/basics/01-intro/Readme.md", "# Intro");
        write(dir.path(), "go/basics/01-intro/01-hello.md", "# Hello");

        let corpus = Corpus::load(dir.path(), &Config::default()).expect("corpus loads");
        let config = CorpusConfig::default();
        let course = &corpus.courses[0];
        let section = &course.sections[0];

        assert_eq!("Basics", course.title());
        assert_eq!(PathBuf::from("go/basics/readme.md"), course.readme_path(&config));
        assert_eq!("Intro", section.title());
        assert_eq!(
            PathBuf::from("go/basics/01-intro/Readme.md"),
            section.readme_path(&config)
        );
        assert_eq!(1, section.lessons.len());
    }

    #[test]
    fn non_utf8_lesson_is_an_error_naming_the_file() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "go/basics/README.md", "# Basics");
        let lesson = dir.path().join("go/basics/01-intro/01-hello.md");
        fs::create_dir_all(lesson.parent().expect("path has a parent")).expect("create dirs");
        fs::write(&lesson, [0x23, 0x20, 0xff, 0xfe, 0x0a]).expect("write file");

        let error = Corpus::load(dir.path(), &Config::default()).expect_err("load fails");

        assert!(format!("{error:#}").contains("01-hello.md"));
    }

    #[test]
    fn missing_source_directory_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let mut config = Config::default();
        config.corpus.source = PathBuf::from("missing");

        assert!(Corpus::load(dir.path(), &config).is_err());
    }
}
