//! The rules built into the linter.

mod content;
mod counts;
mod footer;
mod front_matter;
mod links;
mod structure;

pub use content::*;
pub use counts::*;
pub use footer::*;
pub use front_matter::*;
pub use links::*;
pub use structure::*;

use super::Rule;

/// Every built in rule, in the order they run.
pub fn builtin() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(ReadmePresentRule),
        Box::new(NamingRule),
        Box::new(FrontMatterRule),
        Box::new(ReadmeLinksRule),
        Box::new(LessonListingRule),
        Box::new(LessonCountRule),
        Box::new(ChallengeCountRule),
        Box::new(AttributionFooterRule),
        Box::new(RequiredSectionsRule),
        Box::new(CodeLanguageRule),
    ]
}
