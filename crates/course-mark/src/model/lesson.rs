use anyhow::Context;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Tag};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    cmark::{CMarkParser, EventIteratorExt as _, Position},
    error::Result,
};

use super::{FrontMatter, FrontMatterState, LinkRef, NumberedName};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Level {
    #[default]
    H1 = 1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl From<HeadingLevel> for Level {
    fn from(value: HeadingLevel) -> Self {
        match value {
            HeadingLevel::H1 => Level::H1,
            HeadingLevel::H2 => Level::H2,
            HeadingLevel::H3 => Level::H3,
            HeadingLevel::H4 => Level::H4,
            HeadingLevel::H5 => Level::H5,
            HeadingLevel::H6 => Level::H6,
        }
    }
}

/// A `Heading` represents all text following a heading in a lesson.
/// Any headings that have a lower-level than the `Heading` that follow it
/// will be nested inside it. Any `Heading` with the same level as the
/// current heading will be a sibling in the parent `Heading` or `Lesson`.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Heading {
    /// The title of the heading, in markdown.
    pub title: String,
    /// The heading level ranging from H1 to H6.
    pub level: Level,
    /// All text that follows this heading, excluding the text of any child or sibling headings.
    pub body: String,
    /// Where the heading starts.
    pub position: Position,
    /// Any child headings that are nested below the current heading.
    pub sections: Vec<Heading>,
}

/// A fenced or indented code block. Code examples are illustrative and never executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExample {
    /// First word of the fence info string.
    pub lang: Option<String>,
    pub fenced: bool,
    pub code: String,
    pub position: Position,
}

/// The last paragraph of a lesson, which by convention carries the attribution line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    pub text: String,
    pub position: Position,
}

/// A `Lesson` is an in-memory representation of a single lesson file on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lesson {
    pub file_name: String,
    /// Number and slug parsed from the file name.
    pub numbered: Option<NumberedName>,
    /// The location of the lesson relative to the corpus source root.
    pub path: PathBuf,
    pub front_matter: FrontMatterState,
    /// Plain text of the first H1, or of the first heading when there is no H1.
    pub title: Option<String>,
    /// The heading tree of the lesson body.
    pub sections: Vec<Heading>,
    pub code_examples: Vec<CodeExample>,
    pub links: Vec<LinkRef>,
    /// Set when the lesson ends with a paragraph.
    pub footer: Option<Footer>,
}

impl Lesson {
    /// Reads and parses `path`, which is relative to `source_root`.
    pub fn load(source_root: impl AsRef<Path>, path: impl Into<PathBuf>) -> Result<Lesson> {
        let path = path.into();
        let file_path = source_root.as_ref().join(&path);
        let source = fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to open lesson: {}", file_path.display()))?;

        Lesson::parse(path, &source)
            .with_context(|| format!("Failed to parse lesson: {}", file_path.display()))
    }

    pub fn parse(path: impl Into<PathBuf>, source: &str) -> Result<Lesson> {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let split = FrontMatter::split(source);
        let sections = HeadingParser::new(split.body, split.body_line).parse()?;
        let scan = scan_body(split.body, split.body_line);

        let title = first_title(split.body);

        Ok(Lesson {
            numbered: NumberedName::parse(&file_name),
            file_name,
            path,
            front_matter: split.state,
            title,
            sections,
            code_examples: scan.code_examples,
            links: scan.links,
            footer: scan.footer,
        })
    }

    /// The lesson slug: taken from the numbered file name, or the file stem otherwise.
    pub fn slug(&self) -> &str {
        match &self.numbered {
            Some(numbered) => &numbered.slug,
            None => self
                .file_name
                .strip_suffix(".md")
                .unwrap_or(&self.file_name),
        }
    }

    /// Iterate over a flattened representation of all headings in the lesson, in document order.
    pub fn for_each_heading<F>(&self, mut func: F)
    where
        F: FnMut(&Heading),
    {
        for_each(&mut func, &self.sections)
    }

    /// All headings of the lesson, in document order.
    pub fn headings(&self) -> Vec<&Heading> {
        let mut headings = Vec::new();
        collect(&self.sections, &mut headings);

        headings
    }
}

fn for_each<'a, I, F>(func: &mut F, sections: I)
where
    I: IntoIterator<Item = &'a Heading>,
    F: FnMut(&Heading),
{
    for section in sections {
        func(section);

        for_each(func, &section.sections);
    }
}

fn collect<'a>(sections: &'a [Heading], out: &mut Vec<&'a Heading>) {
    for section in sections {
        out.push(section);
        collect(&section.sections, out);
    }
}

fn first_title(body: &str) -> Option<String> {
    let mut parser = CMarkParser::new(body);
    let mut fallback = None;

    while let Some(event) = parser.next_event() {
        if let Event::Start(Tag::Heading(level, ..)) = event {
            let title = parser
                .iter_until_and_consume(|event| matches!(event, Event::End(Tag::Heading(..))))
                .plain_text();

            if level == HeadingLevel::H1 {
                return Some(title);
            }

            fallback.get_or_insert(title);
        }
    }

    fallback
}

#[derive(Default)]
struct Scan {
    code_examples: Vec<CodeExample>,
    links: Vec<LinkRef>,
    footer: Option<Footer>,
}

/// Collects code examples, links and the trailing paragraph in a single pass.
fn scan_body(body: &str, line_offset: usize) -> Scan {
    let mut parser = CMarkParser::with_line_offset(body, line_offset);
    let mut scan = Scan::default();

    let mut depth = 0usize;
    let mut paragraph: Option<(Position, String)> = None;
    let mut code: Option<(Option<String>, bool, Position, String)> = None;
    let mut link: Option<(String, Position, String)> = None;

    while let Some(event) = parser.next_event() {
        match event {
            Event::Start(tag) => {
                match &tag {
                    Tag::Paragraph if depth == 0 => {
                        paragraph = Some((parser.position(), String::new()));
                    }
                    Tag::CodeBlock(kind) => {
                        let (lang, fenced) = match kind {
                            CodeBlockKind::Fenced(info) => (
                                info.split([' ', ',', '{'])
                                    .next()
                                    .filter(|lang| !lang.is_empty())
                                    .map(String::from),
                                true,
                            ),
                            CodeBlockKind::Indented => (None, false),
                        };
                        code = Some((lang, fenced, parser.position(), String::new()));
                    }
                    Tag::Link(_, destination, _) => {
                        link = Some((destination.to_string(), parser.position(), String::new()));
                    }
                    _ => (),
                }

                depth += 1;
            }
            Event::End(tag) => {
                depth = depth.saturating_sub(1);

                match tag {
                    Tag::CodeBlock(_) => {
                        if let Some((lang, fenced, position, code)) = code.take() {
                            scan.code_examples.push(CodeExample {
                                lang,
                                fenced,
                                code,
                                position,
                            });
                        }
                    }
                    Tag::Link(..) => {
                        if let Some((destination, position, text)) = link.take() {
                            scan.links.push(LinkRef {
                                destination,
                                text: text.trim().to_string(),
                                position,
                            });
                        }
                    }
                    _ => (),
                }

                if depth == 0 {
                    scan.footer = paragraph.take().map(|(position, text)| Footer {
                        text: text.trim().to_string(),
                        position,
                    });
                }
            }
            Event::Text(text) => {
                if let Some((_, _, _, buffer)) = code.as_mut() {
                    buffer.push_str(&text);
                    continue;
                }

                if let Some((_, buffer)) = paragraph.as_mut() {
                    buffer.push_str(&text);
                }

                if let Some((_, _, buffer)) = link.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::Code(text) => {
                if let Some((_, buffer)) = paragraph.as_mut() {
                    buffer.push_str(&text);
                }

                if let Some((_, _, buffer)) = link.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some((_, buffer)) = paragraph.as_mut() {
                    buffer.push(' ');
                }
            }
            Event::Rule if depth == 0 => {
                scan.footer = None;
            }
            _ => (),
        }
    }

    scan
}

struct HeadingParser<'a> {
    parser: CMarkParser<'a>,
}

impl<'a> HeadingParser<'a> {
    fn new(source: &'a str, line_offset: usize) -> Self {
        Self {
            parser: CMarkParser::with_line_offset(source, line_offset),
        }
    }

    fn parse(mut self) -> Result<Vec<Heading>> {
        let mut sections = Vec::new();

        loop {
            match self.parser.next_event() {
                Some(Event::Start(Tag::Heading(heading_level, ..))) => {
                    let section = self.parse_section(heading_level)?;
                    sections.push(section)
                }
                Some(_) => (), // Content before the first heading belongs to no section.
                None => break,
            }
        }

        Ok(sections)
    }

    fn parse_section(&mut self, level: HeadingLevel) -> Result<Heading> {
        let position = self.parser.position();
        let title = self
            .parser
            .iter_until_and_consume(|event| {
                matches! {
                    event,
                    Event::End(Tag::Heading(..))
                }
            })
            .stringify()?;

        let body = self
            .parser
            .iter_until(|event| {
                matches! {
                    event,
                    Event::Start(Tag::Heading(..))
                }
            })
            .stringify()?;

        let mut sections = Vec::new();

        loop {
            match self.parser.peek_event() {
                Some(Event::Start(Tag::Heading(heading_level, ..))) if *heading_level > level => {
                    let heading_level = *heading_level;
                    self.parser.next_event();
                    sections.push(self.parse_section(heading_level)?);
                }
                Some(_) => break,
                None => break,
            }
        }

        Ok(Heading {
            title,
            level: level.into(),
            body,
            position,
            sections,
        })
    }
}
