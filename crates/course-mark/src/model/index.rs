use pulldown_cmark::{Event, HeadingLevel, Tag};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, sync::OnceLock};

use crate::cmark::{split_emoji, CMarkParser, Position};

use super::LinkRef;

/// A practice challenge announced by a README. Challenges are metadata only, the exercises
/// themselves live on the learning platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// The emoji tag describing the kind of challenge, when present.
    pub kind: Option<String>,
    pub text: String,
    pub position: Position,
}

/// The parsed contents of a course or section `README.md`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Text of the first H1, without its emoji.
    pub title: Option<String>,
    pub emoji: Option<String>,
    /// First paragraph following the title.
    pub description: Option<String>,
    /// Links to local markdown files found in lists, in listed order.
    pub lessons: Vec<LinkRef>,
    /// Items listed under the practice challenges heading.
    pub challenges: Vec<Challenge>,
    /// Every link in the document.
    pub links: Vec<LinkRef>,
    /// First link back to the parent README.
    pub course_link: Option<LinkRef>,
    /// First link pointing at the learning platform.
    pub call_to_action: Option<LinkRef>,
    /// Lesson count announced in the text, e.g. "5 lessons".
    pub declared_lesson_count: Option<usize>,
    /// Challenge count announced in the text, e.g. "12 practice challenges".
    pub declared_challenge_count: Option<usize>,
}

impl Index {
    /// Parses a README. `platform_host` identifies call to action links.
    pub fn parse(source: &str, platform_host: &str) -> Index {
        IndexParser::new(source, platform_host).parse()
    }
}

fn lesson_count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\b(\d+)\s+lessons?\b").expect("static regex"))
}

fn challenge_count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(\d+)\s+(?:practice\s+)?challenges?\b").expect("static regex")
    })
}

/// Finds the announced count. A count in the preamble (title and introduction, before any list or
/// secondary heading) wins; otherwise the document must announce a single unambiguous value.
fn declared_count(pattern: &Regex, preamble: &str, text: &str) -> Option<usize> {
    let first = |haystack: &str| {
        pattern
            .captures(haystack)
            .and_then(|captures| captures[1].parse().ok())
    };

    if let Some(count) = first(preamble) {
        return Some(count);
    }

    let values: BTreeSet<usize> = pattern
        .captures_iter(text)
        .filter_map(|captures| captures[1].parse().ok())
        .collect();

    match values.len() {
        1 => values.into_iter().next(),
        _ => None,
    }
}

fn is_challenge_heading(heading: &str) -> bool {
    heading.to_lowercase().contains("practice challenge")
}

fn is_course_link(destination: &str) -> bool {
    matches!(
        destination.trim_end_matches('/'),
        ".." | "../README.md" | "../readme.md"
    )
}

fn is_platform_link(destination: &str, platform_host: &str) -> bool {
    let Some((_, rest)) = destination.split_once("://") else {
        return false;
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();

    host == platform_host || host.ends_with(&format!(".{platform_host}"))
}

struct PendingLink {
    destination: String,
    position: Position,
    text: String,
    listed: bool,
}

struct IndexParser<'a> {
    parser: CMarkParser<'a>,
    platform_host: &'a str,
}

impl<'a> IndexParser<'a> {
    fn new(source: &'a str, platform_host: &'a str) -> Self {
        Self {
            parser: CMarkParser::new(source),
            platform_host,
        }
    }

    fn parse(mut self) -> Index {
        let mut index = Index::default();

        let mut text = String::new();
        let mut preamble = String::new();
        let mut in_preamble = true;
        let mut awaiting_description = false;
        let mut in_challenges = false;

        let mut item_depth = 0usize;
        let mut heading: Option<(HeadingLevel, String)> = None;
        let mut paragraph: Option<String> = None;
        // Whether the open paragraph has text outside of links.
        let mut paragraph_prose = false;
        let mut challenge: Option<(Position, String)> = None;
        let mut link: Option<PendingLink> = None;

        while let Some(event) = self.parser.next_event() {
            match event {
                Event::Start(Tag::Heading(level, ..)) => {
                    heading = Some((level, String::new()));
                }
                Event::End(Tag::Heading(..)) => {
                    let Some((level, content)) = heading.take() else {
                        continue;
                    };
                    let content = content.trim().to_string();

                    if level == HeadingLevel::H1 && index.title.is_none() {
                        let (emoji, title) = split_emoji(&content);
                        index.emoji = emoji;
                        index.title = Some(title);
                        awaiting_description = true;
                    } else {
                        in_preamble = false;
                        awaiting_description = false;
                    }

                    in_challenges = is_challenge_heading(&content);
                    text.push_str(&content);
                    text.push('\n');

                    if in_preamble {
                        preamble.push_str(&content);
                        preamble.push('\n');
                    }
                }
                Event::Start(Tag::Paragraph) => {
                    paragraph = Some(String::new());
                    paragraph_prose = false;
                }
                Event::End(Tag::Paragraph) => {
                    let Some(content) = paragraph.take() else {
                        continue;
                    };
                    let content = content.trim().to_string();

                    if awaiting_description && item_depth == 0 && paragraph_prose {
                        index.description = Some(content.clone());
                        awaiting_description = false;
                    }

                    text.push_str(&content);
                    text.push('\n');

                    if in_preamble {
                        preamble.push_str(&content);
                        preamble.push('\n');
                    }
                }
                Event::Start(Tag::List(..)) => {
                    in_preamble = false;
                    awaiting_description = false;
                }
                Event::Start(Tag::Item) => {
                    if item_depth == 0 && in_challenges {
                        challenge = Some((self.parser.position(), String::new()));
                    }

                    item_depth += 1;
                }
                Event::End(Tag::Item) => {
                    item_depth = item_depth.saturating_sub(1);

                    if item_depth == 0 {
                        if let Some((position, content)) = challenge.take() {
                            let (kind, description) = split_emoji(&content);
                            index.challenges.push(Challenge {
                                kind,
                                text: description,
                                position,
                            });
                        }
                    }

                    text.push('\n');
                }
                Event::Start(Tag::Link(_, destination, _)) => {
                    link = Some(PendingLink {
                        destination: destination.to_string(),
                        position: self.parser.position(),
                        text: String::new(),
                        listed: item_depth > 0 && !in_challenges,
                    });
                }
                Event::End(Tag::Link(..)) => {
                    let Some(pending) = link.take() else {
                        continue;
                    };

                    let link = LinkRef {
                        destination: pending.destination,
                        text: pending.text.trim().to_string(),
                        position: pending.position,
                    };

                    if pending.listed && link.is_local_markdown() {
                        index.lessons.push(link.clone());
                    }

                    if index.course_link.is_none() && is_course_link(&link.destination) {
                        index.course_link = Some(link.clone());
                    }

                    if index.call_to_action.is_none()
                        && is_platform_link(&link.destination, self.platform_host)
                    {
                        index.call_to_action = Some(link.clone());
                    }

                    index.links.push(link);
                }
                Event::Text(content) | Event::Code(content) => {
                    if paragraph.is_some() && link.is_none() && !content.trim().is_empty() {
                        paragraph_prose = true;
                    }

                    let buffers = [
                        heading.as_mut().map(|(_, buffer)| buffer),
                        paragraph.as_mut(),
                        challenge.as_mut().map(|(_, buffer)| buffer),
                        link.as_mut().map(|pending| &mut pending.text),
                    ];

                    for buffer in buffers.into_iter().flatten() {
                        buffer.push_str(&content);
                    }

                    // Text of tight list items is not wrapped in a paragraph.
                    if paragraph.is_none() && heading.is_none() {
                        text.push_str(&content);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    let buffers = [
                        heading.as_mut().map(|(_, buffer)| buffer),
                        paragraph.as_mut(),
                        challenge.as_mut().map(|(_, buffer)| buffer),
                        link.as_mut().map(|pending| &mut pending.text),
                    ];

                    for buffer in buffers.into_iter().flatten() {
                        buffer.push(' ');
                    }
                }
                _ => (),
            }
        }

        index.declared_lesson_count = declared_count(lesson_count_pattern(), &preamble, &text);
        index.declared_challenge_count =
            declared_count(challenge_count_pattern(), &preamble, &text);

        index
    }
}
