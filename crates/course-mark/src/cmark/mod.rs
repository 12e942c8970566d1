//! Useful utilities for parsing and working with CommonMark files.

mod parser;

pub use parser::*;

use pulldown_cmark::Event;
use pulldown_cmark_to_cmark::{cmark_with_options, Options};
use std::borrow::Borrow;

use crate::error::Result;

pub trait EventIteratorExt {
    /// Consume an event collection and return a stringified representation.
    fn stringify(self) -> Result<String>;

    /// Consume an event collection and return only its textual content, with line breaks
    /// collapsed to single spaces.
    fn plain_text(self) -> String;
}

impl<'a, I, E> EventIteratorExt for I
where
    I: Iterator<Item = E>,
    E: Borrow<Event<'a>>,
{
    fn stringify(self) -> Result<String> {
        let mut buffer = String::new();
        let options = Options {
            code_block_token_count: 3,
            ..Default::default()
        };

        cmark_with_options(self, &mut buffer, options)?;

        Ok(buffer)
    }

    fn plain_text(self) -> String {
        let mut buffer = String::new();

        for event in self {
            match event.borrow() {
                Event::Text(text) | Event::Code(text) => buffer.push_str(text),
                Event::SoftBreak | Event::HardBreak => buffer.push(' '),
                _ => (),
            }
        }

        buffer.trim().to_string()
    }
}

/// Splits a leading emoji run off a piece of text, returning the emoji (if any) and the
/// remaining text with surrounding whitespace removed.
pub fn split_emoji(text: &str) -> (Option<String>, String) {
    let text = text.trim();
    let mut chars = text.char_indices().peekable();
    let mut end = text.len();

    while let Some((index, c)) = chars.next() {
        let next = chars.peek().map(|(_, next)| *next);

        // Plain arrows only count as emoji with an emoji presentation selector.
        if (is_arrow(c) && next == Some('\u{FE0F}')) || is_emoji_component(c) {
            continue;
        }

        end = index;
        break;
    }

    let emoji = text[..end].trim();
    let rest = text[end..].trim().to_string();

    if emoji.is_empty() {
        (None, rest)
    } else {
        (Some(emoji.to_string()), rest)
    }
}

fn is_arrow(c: char) -> bool {
    matches!(c as u32, 0x2190..=0x21FF)
}

fn is_emoji_component(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF // Pictographs, emoticons, transport, supplemental symbols.
            | 0x2600..=0x27BF // Miscellaneous symbols and dingbats.
            | 0x2B00..=0x2BFF // Stars, arrows.
            | 0x2300..=0x23FF // Technical (hourglass, keyboard, ...).
            | 0x2122 | 0x2139 | 0x24C2 | 0x3030 | 0x303D | 0x3297 | 0x3299
            | 0x200D // Zero width joiner.
            | 0xFE0E..=0xFE0F // Variation selectors.
            | 0xE0020..=0xE007F // Tag sequences.
    ) || c == ' '
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_leading_emoji() {
        assert_eq!(
            (Some(String::from("⚛️")), String::from("React Hooks")),
            split_emoji("⚛️ React Hooks")
        );
    }

    #[test]
    fn splits_joined_emoji_sequences() {
        assert_eq!(
            (Some(String::from("👩‍💻")), String::from("Practice")),
            split_emoji("👩‍💻 Practice")
        );
    }

    #[test]
    fn keeps_plain_arrows_in_text() {
        assert_eq!((None, String::from("← Back")), split_emoji("← Back"));
        assert_eq!(
            (Some(String::from("↩\u{FE0F}")), String::from("Return")),
            split_emoji("↩\u{FE0F} Return")
        );
    }

    #[test]
    fn leaves_text_without_emoji_alone() {
        assert_eq!((None, String::from("Summary")), split_emoji("  Summary "));
    }

    #[test]
    fn collapses_breaks_in_plain_text() {
        let parser = CMarkParser::new("Some *emphasis*\nand `code`");

        assert_eq!("Some emphasis and code", parser_text(parser));
    }

    fn parser_text(mut parser: CMarkParser<'_>) -> String {
        std::iter::from_fn(move || parser.next_event()).plain_text()
    }
}
