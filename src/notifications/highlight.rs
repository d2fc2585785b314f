//! Personal highlight keyword matching.

use log::warn;
use regex::RegexBuilder;

/// Whether `text` contains any of the `highlights` keywords, ignoring case.
///
/// Keywords are matched literally; blank keywords never match.
pub fn contains_highlight(text: &str, highlights: &[String]) -> bool {
    highlights
        .iter()
        .map(|highlight| highlight.trim())
        .filter(|highlight| !highlight.is_empty())
        .any(|highlight| {
            match RegexBuilder::new(&regex::escape(highlight))
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => regex.is_match(text),
                Err(e) => {
                    warn!("ignoring highlight {:?}: {}", highlight, e);
                    false
                }
            }
        })
}
