//! Suspicious URL patterns
//!
//! Matched against the raw URL string, case-insensitive, before any domain
//! check. A match rejects even allow-listed domains.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

fn pattern(source: &str) -> Regex {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .unwrap()
}

static SUSPICIOUS_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("answer_site", pattern(r"chegg|brainly|stackoverflow|github|chatgpt|openai")),
        ("exam_keyword", pattern(r"exam|test|quiz|answer.*bank")),
        ("content_sharing", pattern(r"screenshot|clip|share|pastebin|paste\.ee")),
        ("privacy_tool", pattern(r"vpn|proxy|tor|anonymizer")),
        ("remote_access", pattern(r"remote.*desktop|teamviewer|chrome.*remote")),
        ("recording_tool", pattern(r"recording|stream|broadcast")),
    ]
});

/// Category of the first pattern `url` matches
pub fn match_suspicious(url: &str) -> Option<&'static str> {
    SUSPICIOUS_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(url))
        .map(|(category, _)| *category)
}
