use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt::Display};

/// A `<number>-<slug>` name as used by section directories and lesson files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumberedName {
    pub number: u32,
    pub slug: String,
}

impl NumberedName {
    /// Parses a directory or file name. A trailing `.md` extension is ignored.
    pub fn parse(name: &str) -> Option<NumberedName> {
        let name = name.strip_suffix(".md").unwrap_or(name);
        let (number, slug) = name.split_once('-')?;

        if number.is_empty() || !number.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }

        if slug.is_empty() {
            return None;
        }

        let number = number.parse().ok()?;

        Some(NumberedName {
            number,
            slug: slug.to_string(),
        })
    }
}

impl Display for NumberedName {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{:02}-{}", self.number, self.slug)
    }
}

/// Orders items carrying an optional numbered name: numbered items first by number, anything else
/// after, with the raw name as a tie breaker.
pub(crate) fn compare_numbered(
    left: (Option<&NumberedName>, &str),
    right: (Option<&NumberedName>, &str),
) -> Ordering {
    match (left.0, right.0) {
        (Some(a), Some(b)) => a.number.cmp(&b.number).then_with(|| left.1.cmp(right.1)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left.1.cmp(right.1),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_section_directory_names() {
        let expected = NumberedName {
            number: 1,
            slug: String::from("use-state"),
        };

        assert_eq!(Some(expected), NumberedName::parse("01-use-state"));
    }

    #[test]
    fn strips_markdown_extension() {
        let expected = NumberedName {
            number: 12,
            slug: String::from("custom-hooks"),
        };

        assert_eq!(Some(expected), NumberedName::parse("12-custom-hooks.md"));
    }

    #[test]
    fn rejects_names_without_a_number() {
        assert_eq!(None, NumberedName::parse("README.md"));
        assert_eq!(None, NumberedName::parse("intro-to-hooks"));
        assert_eq!(None, NumberedName::parse("-intro"));
    }

    #[test]
    fn rejects_names_without_a_slug() {
        assert_eq!(None, NumberedName::parse("01-"));
        assert_eq!(None, NumberedName::parse("01"));
    }

    #[test]
    fn numbered_items_sort_before_unnumbered_ones() {
        let first = NumberedName::parse("02-b");
        let second = NumberedName::parse("10-a");

        assert_eq!(
            Ordering::Less,
            compare_numbered((first.as_ref(), "02-b"), (second.as_ref(), "10-a"))
        );
        assert_eq!(
            Ordering::Less,
            compare_numbered((second.as_ref(), "10-a"), (None, "appendix"))
        );
    }
}
