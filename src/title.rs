//! Headline compaction.
//!
//! Finance headlines tend to carry reporting verbs ("says", "announces") and
//! short prepositions that add little in a table column. [`shorten_title`]
//! drops those and caps the result at a fixed number of words.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Default word cap for [`shorten_title`].
pub const DEFAULT_MAX_TITLE_WORDS: usize = 12;

/// Lowercase tokens removed from headlines.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "says", "reports", "claims", "announces", "reveals", "on", "in", "at", "of", "to",
    ]
    .into_iter()
    .collect()
});

/// Whether `token` is a stop word, compared case-insensitively.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token.to_lowercase().as_str())
}

/// Compact a headline.
///
/// Splits on whitespace, removes stop words (case-insensitively), keeps at
/// most `max_words` of the remaining tokens in their original order, and joins
/// them with single spaces. An empty or all-stop-word title yields `""`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     shorten_title("RBI Announces Rate Cut To Boost Economy On Markets", 12),
///     "RBI Rate Cut Boost Economy Markets"
/// );
/// ```
pub fn shorten_title(title: &str, max_words: usize) -> String {
    title
        .split_whitespace()
        .filter(|token| !is_stop_word(token))
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
