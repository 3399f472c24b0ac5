//! Suppression checks: the reasons a matched span is left unwrapped.
//!
//! Checks run in a fixed order, first hit wins:
//!
//! 1. blacklist (exact match on the full matched text, always on)
//! 2. already linked (if `ignore_links`)
//! 3. inside a protected URL (if `ignore_urls`)
//!
//! All context checks read the line as it stood before the current rule's
//! replace pass. That buffer still carries every earlier rule's wraps, which
//! is what makes the already-linked check an idempotence guard across rules
//! and across repeated runs.

use std::sync::LazyLock;

use regex::Regex;

use wikiwrap_types::SuppressionPolicy;

/// URL-shaped substrings, as seen by the `ignore_urls` check.
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("static pattern should compile"));

/// An existing wrapped span. Lazy so adjacent links on one line stay separate.
static LINK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[.*?\]\]").expect("static pattern should compile"));

/// URLs ending in one of these extensions do not protect their contents:
/// they point at inert artifacts, not live pages.
static EXCLUDED_URL_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(exe|lnk|xls|md|sh|elf|bin|tmp|doc|odt|docx|pdf|yara|dll|txt)$")
        .expect("static pattern should compile")
});

/// Why a match was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    Blacklisted,
    InsideLink,
    InsideUrl,
}

impl SuppressReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SuppressReason::Blacklisted => "blacklisted",
            SuppressReason::InsideLink => "inside_link",
            SuppressReason::InsideUrl => "inside_url",
        }
    }
}

/// Exact-match lookup of the full matched text in the policy blacklist.
pub fn is_blacklisted(policy: &SuppressionPolicy, full_match: &str) -> bool {
    policy.blacklist.contains(full_match)
}

/// True when the byte span `[start, end)` lies fully inside a `[[...]]`
/// span on the line.
pub fn inside_existing_link(line: &str, start: usize, end: usize) -> bool {
    LINK_SPAN
        .find_iter(line)
        .any(|m| m.start() <= start && end <= m.end())
}

/// True when `value` appears inside a URL on the line whose trailing
/// extension is not in the exclusion set.
pub fn inside_protected_url(line: &str, value: &str) -> bool {
    URL_PATTERN
        .find_iter(line)
        .map(|m| m.as_str())
        .any(|url| !EXCLUDED_URL_EXTENSION.is_match(url) && url.contains(value))
}

/// The first policy reason to skip this match, if any.
///
/// `line` is the working line before the current rule's pass; `value_start`
/// and `value_end` are the captured value's byte span within it.
pub fn suppression_reason(
    policy: &SuppressionPolicy,
    line: &str,
    full_match: &str,
    value: &str,
    value_start: usize,
    value_end: usize,
) -> Option<SuppressReason> {
    if is_blacklisted(policy, full_match) {
        return Some(SuppressReason::Blacklisted);
    }

    if policy.ignore_links && inside_existing_link(line, value_start, value_end) {
        return Some(SuppressReason::InsideLink);
    }

    if policy.ignore_urls && inside_protected_url(line, value) {
        return Some(SuppressReason::InsideUrl);
    }

    None
}
