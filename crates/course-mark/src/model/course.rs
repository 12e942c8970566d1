use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, trace};

use crate::{
    config::CorpusConfig,
    corpus::{entries, is_readme, Entry},
    error::Result,
};

use super::{naming::compare_numbered, Challenge, Index, Lesson, NumberedName};

/// A top level learning product, e.g. `react/react-hooks-deep-dive`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// The technology directory the course lives in.
    pub tech: String,
    /// The course directory name.
    pub slug: String,
    /// The location of the course relative to the corpus source root.
    pub path: PathBuf,
    /// The course README file, if there is one.
    #[serde(default)]
    pub readme: Option<PathBuf>,
    /// The parsed course README, if there is one.
    pub index: Option<Index>,
    pub sections: Vec<Section>,
    /// Markdown files placed directly in the course directory instead of a section.
    pub stray_files: Vec<PathBuf>,
}

/// A numbered grouping of lessons inside a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// The section directory name.
    pub name: String,
    pub numbered: Option<NumberedName>,
    /// The location of the section relative to the corpus source root.
    pub path: PathBuf,
    /// The section README file, if there is one.
    #[serde(default)]
    pub readme: Option<PathBuf>,
    /// The parsed section README, if there is one.
    pub index: Option<Index>,
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn load(
        source_root: impl AsRef<Path>,
        tech: &str,
        path: impl Into<PathBuf>,
        config: &CorpusConfig,
    ) -> Result<Course> {
        let source_root = source_root.as_ref();
        let path = path.into();
        let slug = file_name(&path);

        debug!(course = %path.display(), "loading course");

        let entries = entries(&source_root.join(&path), config)?;
        let readme = find_readme(&entries, &path, config);
        let index = load_index(source_root, readme.as_deref(), config)?;
        let mut sections = Vec::new();
        let mut stray_files = Vec::new();

        for entry in entries {
            match entry {
                Entry::Directory(name) => {
                    sections.push(Section::load(source_root, path.join(name), config)?);
                }
                Entry::File(name) if is_lesson_file(&name, config) => {
                    stray_files.push(path.join(name));
                }
                Entry::File(_) => (),
            }
        }

        sections.sort_by(|a, b| {
            compare_numbered((a.numbered.as_ref(), &a.name), (b.numbered.as_ref(), &b.name))
        });

        Ok(Course {
            tech: tech.to_string(),
            slug,
            path,
            readme,
            index,
            sections,
            stray_files,
        })
    }

    /// The display title: the README heading, falling back to the slug.
    pub fn title(&self) -> &str {
        self.index
            .as_ref()
            .and_then(|index| index.title.as_deref())
            .unwrap_or(&self.slug)
    }

    pub fn emoji(&self) -> Option<&str> {
        self.index.as_ref().and_then(|index| index.emoji.as_deref())
    }

    pub fn declared_lesson_count(&self) -> Option<usize> {
        self.index.as_ref().and_then(|index| index.declared_lesson_count)
    }

    /// Number of lesson files across all sections.
    pub fn lesson_count(&self) -> usize {
        self.sections.iter().map(|section| section.lessons.len()).sum()
    }

    /// The README file, or where it is expected when missing.
    pub fn readme_path(&self, config: &CorpusConfig) -> PathBuf {
        self.readme
            .clone()
            .unwrap_or_else(|| self.path.join(&config.readme))
    }
}

impl Section {
    pub fn load(
        source_root: impl AsRef<Path>,
        path: impl Into<PathBuf>,
        config: &CorpusConfig,
    ) -> Result<Section> {
        let source_root = source_root.as_ref();
        let path = path.into();
        let name = file_name(&path);

        debug!(section = %path.display(), "loading section");

        let entries = entries(&source_root.join(&path), config)?;
        let readme = find_readme(&entries, &path, config);
        let index = load_index(source_root, readme.as_deref(), config)?;
        let mut lessons = Vec::new();

        for entry in entries {
            match entry {
                Entry::File(file) if is_lesson_file(&file, config) => {
                    trace!(lesson = %file, "loading lesson");
                    lessons.push(Lesson::load(source_root, path.join(file))?);
                }
                Entry::File(_) => (),
                Entry::Directory(directory) => {
                    debug!(directory = %directory, section = %path.display(), "ignoring nested directory");
                }
            }
        }

        lessons.sort_by(|a, b| {
            compare_numbered(
                (a.numbered.as_ref(), &a.file_name),
                (b.numbered.as_ref(), &b.file_name),
            )
        });

        Ok(Section {
            numbered: NumberedName::parse(&name),
            name,
            path,
            readme,
            index,
            lessons,
        })
    }

    /// The display title: the README heading, falling back to the directory name.
    pub fn title(&self) -> &str {
        self.index
            .as_ref()
            .and_then(|index| index.title.as_deref())
            .unwrap_or(&self.name)
    }

    pub fn emoji(&self) -> Option<&str> {
        self.index.as_ref().and_then(|index| index.emoji.as_deref())
    }

    pub fn challenges(&self) -> &[Challenge] {
        self.index
            .as_ref()
            .map(|index| index.challenges.as_slice())
            .unwrap_or_default()
    }

    /// The README file, or where it is expected when missing.
    pub fn readme_path(&self, config: &CorpusConfig) -> PathBuf {
        self.readme
            .clone()
            .unwrap_or_else(|| self.path.join(&config.readme))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_lesson_file(name: &str, config: &CorpusConfig) -> bool {
    name.to_lowercase().ends_with(".md") && !is_readme(name, config)
}

fn find_readme(entries: &[Entry], path: &Path, config: &CorpusConfig) -> Option<PathBuf> {
    entries.iter().find_map(|entry| match entry {
        Entry::File(name) if is_readme(name, config) => Some(path.join(name)),
        _ => None,
    })
}

fn load_index(
    source_root: &Path,
    readme: Option<&Path>,
    config: &CorpusConfig,
) -> Result<Option<Index>> {
    let Some(readme) = readme else {
        return Ok(None);
    };
    let readme_path = source_root.join(readme);

    let source = fs::read_to_string(&readme_path)
        .with_context(|| format!("Failed to open README: {}", readme_path.display()))?;

    Ok(Some(Index::parse(&source, &config.platform_host)))
}
