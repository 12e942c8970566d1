//! The course content model: courses made of sections, sections made of lessons, each indexed by
//! README files.

mod course;
mod front_matter;
mod index;
mod lesson;
mod naming;

pub use course::*;
pub use front_matter::*;
pub use index::*;
pub use lesson::*;
pub use naming::*;

use crate::cmark::Position;
use serde::{Deserialize, Serialize};

/// A link as written in a markdown file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub destination: String,
    /// Plain text of the link label.
    pub text: String,
    pub position: Position,
}

impl LinkRef {
    /// Whether the link points somewhere outside the repository (or nowhere on disk at all).
    pub fn is_external(&self) -> bool {
        let destination = self.destination.trim();

        destination.starts_with("//")
            || destination.starts_with('#')
            || destination.is_empty()
            || destination
                .split_once(':')
                .map(|(scheme, _)| {
                    !scheme.is_empty()
                        && scheme
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                })
                .unwrap_or(false)
    }

    /// The on-disk part of a local link: fragment and query removed, `%20` decoded.
    pub fn local_path(&self) -> Option<String> {
        if self.is_external() {
            return None;
        }

        let path = self
            .destination
            .trim()
            .split(['#', '?'])
            .next()
            .unwrap_or_default()
            .replace("%20", " ");

        if path.is_empty() {
            None
        } else {
            Some(path)
        }
    }

    pub fn is_local_markdown(&self) -> bool {
        self.local_path()
            .map(|path| path.to_lowercase().ends_with(".md"))
            .unwrap_or(false)
    }
}
