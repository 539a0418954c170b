// src/ledger/title.rs — Session title synthesis
//
// Derives a short human-readable title from the opening user message by
// running an ordered table of destination-extraction patterns against the
// lower-cased text. First pattern yielding a plausible destination wins.

use regex::Regex;
use std::sync::OnceLock;

use super::DEFAULT_TITLE;
use crate::util::truncate_chars;

/// Extraction patterns in priority order. Specific travel phrasings come
/// before the bare prepositions so "plan a trip to japan" extracts
/// "japan", not the first word after an unrelated "to".
const DESTINATION_PATTERNS: &[&str] = &[
    r"(?:trip to|going to|traveling to|travelling to|visit)\s+([a-z\s]+?)(?:\s|$|,|\.|!|\?)",
    r"to\s+([a-z\s]+?)(?:\s|$|,|\.|!|\?)",
    r"(?:in|at)\s+([a-z\s]+?)(?:\s|$|,|\.|!|\?)",
    r"([a-z\s]+?)\s+(?:trip|travel|vacation|holiday)",
];

/// A destination is plausible when its length is strictly between
/// these bounds.
const MIN_DESTINATION_CHARS: usize = 2;
const MAX_DESTINATION_CHARS: usize = 30;

/// Fallback titles keep at most this many characters of the message.
const FALLBACK_TITLE_CHARS: usize = 30;

static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();

fn patterns() -> &'static [Regex] {
    COMPILED.get_or_init(|| {
        DESTINATION_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("static destination pattern"))
            .collect()
    })
}

/// Derive a session title from the first user message.
///
/// Deterministic and total: any input yields a title, empty or
/// whitespace-only input yields the placeholder.
pub fn synthesize(first_user_message: &str) -> String {
    let trimmed = first_user_message.trim();
    if trimmed.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    let message = trimmed.to_lowercase();

    for pattern in patterns() {
        let Some(captures) = pattern.captures(&message) else {
            continue;
        };
        let Some(destination) = captures.get(1) else {
            continue;
        };
        let destination = destination.as_str().trim();
        let len = destination.chars().count();
        if len > MIN_DESTINATION_CHARS && len < MAX_DESTINATION_CHARS {
            return format!("Trip to {}", capitalize(destination));
        }
    }

    // No destination found: fall back to the message itself.
    if trimmed.chars().count() > FALLBACK_TITLE_CHARS {
        format!("{}...", truncate_chars(trimmed, FALLBACK_TITLE_CHARS))
    } else {
        trimmed.to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
