use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DELIMITER: &str = "---";

/// Metadata block at the top of a lesson file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Slug of the course the lesson was written for.
    pub source_course: Option<String>,
    /// Identifier of the lesson within its course.
    pub source_lesson: Option<String>,
    /// Every other key found in the block.
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrontMatterError {
    #[error("front matter starting on line 1 is never closed with `---`")]
    Unterminated,
    #[error("line {line}: expected `key: value`")]
    MalformedLine { line: usize },
    #[error("line {line}: nested values are not supported in front matter")]
    Nested { line: usize },
    #[error("line {line}: duplicate key `{key}`")]
    DuplicateKey { key: String, line: usize },
}

impl FrontMatterError {
    /// The 1-based line of the file the error points at.
    pub fn line(&self) -> usize {
        match self {
            FrontMatterError::Unterminated => 1,
            FrontMatterError::MalformedLine { line }
            | FrontMatterError::Nested { line }
            | FrontMatterError::DuplicateKey { line, .. } => *line,
        }
    }
}

/// The outcome of reading a lesson's front matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum FrontMatterState {
    Missing,
    Invalid { message: String, line: usize },
    Present(FrontMatter),
}

impl FrontMatterState {
    pub fn front_matter(&self) -> Option<&FrontMatter> {
        match self {
            FrontMatterState::Present(front_matter) => Some(front_matter),
            _ => None,
        }
    }
}

/// A source file split into its front matter and markdown body.
#[derive(Debug)]
pub struct Split<'a> {
    pub state: FrontMatterState,
    pub body: &'a str,
    /// Number of lines preceding `body` in the file.
    pub body_line: usize,
}

impl FrontMatter {
    /// Splits `source` into front matter and body. When the front matter is malformed the state
    /// records the error and the body still starts after the closing delimiter (or is the whole
    /// file when the block is unterminated).
    pub fn split(source: &str) -> Split<'_> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        let Some(block) = find_block(source) else {
            return Split {
                state: FrontMatterState::Missing,
                body: source,
                body_line: 0,
            };
        };

        let block = match block {
            Ok(block) => block,
            Err(error) => {
                return Split {
                    state: FrontMatterState::Invalid {
                        line: error.line(),
                        message: error.to_string(),
                    },
                    body: source,
                    body_line: 0,
                }
            }
        };

        let state = match FrontMatter::parse_lines(block.lines) {
            Ok(front_matter) => FrontMatterState::Present(front_matter),
            Err(error) => FrontMatterState::Invalid {
                line: error.line(),
                message: error.to_string(),
            },
        };

        Split {
            state,
            body: &source[block.body_start..],
            body_line: block.line_count,
        }
    }

    /// Parses the `key: value` lines between the delimiters. Line numbers in errors are relative to
    /// the file, assuming the opening delimiter is line 1.
    pub fn parse_lines<'a>(
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Result<FrontMatter, FrontMatterError> {
        let mut front_matter = FrontMatter::default();
        let mut seen = BTreeMap::new();

        for (index, raw) in lines.into_iter().enumerate() {
            let line = index + 2;
            let raw = raw.trim_end_matches('\r');

            if raw.trim().is_empty() || raw.trim_start().starts_with('#') {
                continue;
            }

            if raw.starts_with(char::is_whitespace) || raw.trim_start().starts_with("- ") {
                return Err(FrontMatterError::Nested { line });
            }

            let Some((key, value)) = raw.split_once(':') else {
                return Err(FrontMatterError::MalformedLine { line });
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(FrontMatterError::MalformedLine { line });
            }

            if seen.insert(key.to_string(), line).is_some() {
                return Err(FrontMatterError::DuplicateKey {
                    key: key.to_string(),
                    line,
                });
            }

            let value = unquote(value.trim()).to_string();

            match key {
                "source_course" => front_matter.source_course = Some(value),
                "source_lesson" => front_matter.source_lesson = Some(value),
                _ => {
                    front_matter.extra.insert(key.to_string(), value);
                }
            }
        }

        Ok(front_matter)
    }
}

struct Block<'a> {
    lines: Vec<&'a str>,
    body_start: usize,
    line_count: usize,
}

fn find_block(source: &str) -> Option<Result<Block<'_>, FrontMatterError>> {
    let mut lines = source.split_inclusive('\n');
    let first = lines.next()?;

    if first.trim_end() != DELIMITER {
        return None;
    }

    let mut offset = first.len();
    let mut inner = Vec::new();

    for line in lines {
        offset += line.len();

        if line.trim_end() == DELIMITER {
            let line_count = inner.len() + 2;

            return Some(Ok(Block {
                lines: inner,
                body_start: offset,
                line_count,
            }));
        }

        inner.push(line.trim_end_matches('\n'));
    }

    Some(Err(FrontMatterError::Unterminated))
}

fn unquote(value: &str) -> &str {
    let quoted = |quote: char| {
        value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote)
    };

    if quoted('"') || quoted('\'') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_front_matter_from_body() {
        let source = "---\nsource_course: react-hooks-deep-dive\nsource_lesson: use-state\n---\n# Title\n";
        let split = FrontMatter::split(source);

        let expected = FrontMatter {
            source_course: Some(String::from("react-hooks-deep-dive")),
            source_lesson: Some(String::from("use-state")),
            extra: BTreeMap::new(),
        };

        assert_eq!(FrontMatterState::Present(expected), split.state);
        assert_eq!("# Title\n", split.body);
        assert_eq!(4, split.body_line);
    }

    #[test]
    fn accepts_quoted_values_and_crlf() {
        let source = "---\r\nsource_course: \"go-reflection\"\r\ntitle: 'Reflect'\r\n---\r\nBody";
        let split = FrontMatter::split(source);
        let front_matter = split.state.front_matter().expect("front matter is present");

        assert_eq!(Some("go-reflection"), front_matter.source_course.as_deref());
        assert_eq!(Some(&String::from("Reflect")), front_matter.extra.get("title"));
        assert_eq!("Body", split.body);
    }

    #[test]
    fn ignores_leading_byte_order_mark() {
        let split = FrontMatter::split("\u{feff}---\nsource_course: go-basics\n---\n# Title\n");
        let front_matter = split.state.front_matter().expect("front matter is present");

        assert_eq!(Some("go-basics"), front_matter.source_course.as_deref());
        assert_eq!("# Title\n", split.body);
        assert_eq!(3, split.body_line);
    }

    #[test]
    fn files_without_delimiter_have_no_front_matter() {
        let split = FrontMatter::split("# Just a lesson\n---\n");

        assert_eq!(FrontMatterState::Missing, split.state);
        assert_eq!(0, split.body_line);
    }

    #[test]
    fn unterminated_front_matter_is_invalid() {
        let split = FrontMatter::split("---\nsource_course: x\n# Title");

        assert!(matches!(
            split.state,
            FrontMatterState::Invalid { line: 1, .. }
        ));
    }

    #[test]
    fn reports_line_of_malformed_entry() {
        let error = FrontMatter::parse_lines(["source_course: x", "not a pair"])
            .expect_err("second line is malformed");

        assert_eq!(FrontMatterError::MalformedLine { line: 3 }, error);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let error = FrontMatter::parse_lines(["source_course: x", "source_course: y"])
            .expect_err("key is duplicated");

        assert_eq!(
            FrontMatterError::DuplicateKey {
                key: String::from("source_course"),
                line: 3
            },
            error
        );
    }

    #[test]
    fn rejects_nested_values() {
        let error = FrontMatter::parse_lines(["tags:", "  - go"]).expect_err("nested");

        assert_eq!(FrontMatterError::Nested { line: 3 }, error);
    }

    #[test]
    fn ignores_comments_and_blank_lines() {
        let front_matter = FrontMatter::parse_lines(["# comment", "", "source_lesson: intro"])
            .expect("should parse");

        assert_eq!(Some("intro"), front_matter.source_lesson.as_deref());
    }
}
