//! Proptest strategies for generating valid test inputs.
//!
//! This module provides constructive strategies that generate valid inputs
//! without relying on filtering. All patterns are guaranteed to compile and
//! carry at most two capturing groups.
//!
//! # Bounds
//!
//! To keep tests fast, the following bounds are enforced:
//! - Max groups per rule set: 3
//! - Max rules per group: 4
//! - Max standalone rules: 4
//! - Max lines per document: 12
//! - Max blacklist entries: 3
//!
//! Generated prose avoids `[`, `]`, `!`, `@`, and defang tokens so that the
//! only bracket pairs in an annotated document are the ones the rules added.

use proptest::prelude::*;

use wikiwrap_types::{PatternRule, RuleGroup, RuleSet, SuppressionPolicy};

// =============================================================================
// Constants for bounding generated data
// =============================================================================

/// Maximum number of groups in a generated rule set
pub const MAX_GROUPS: usize = 3;

/// Maximum number of rules per group
pub const MAX_RULES_PER_GROUP: usize = 4;

/// Maximum number of standalone rules per rule set
pub const MAX_STANDALONE_RULES: usize = 4;

/// Maximum number of lines in a generated document
pub const MAX_LINES_PER_DOCUMENT: usize = 12;

/// Maximum number of blacklist entries in a generated policy
pub const MAX_BLACKLIST_ENTRIES: usize = 3;

// =============================================================================
// Pattern Strategies
// =============================================================================

/// Strategy for generating valid patterns constructively.
///
/// Instead of filtering random strings, this builds patterns from known-valid
/// components. The shapes cover the cases the engine distinguishes:
/// - one capturing group (the common case)
/// - no capturing group (the full match doubles as the value)
/// - two groups in an alternation (only the first non-empty one is used)
pub fn arb_pattern() -> impl Strategy<Value = String> {
    prop_oneof![
        // Single word in a group
        arb_word().prop_map(|w| format!("({w})")),
        // Word with boundaries
        arb_word().prop_map(|w| format!(r"\b({w})\b")),
        // Email-shaped
        Just(r"([a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,})".to_string()),
        // Hex digest
        Just(r"\b([a-f0-9]{32})\b".to_string()),
        // Domain with a fixed TLD list
        Just(r"\b([a-z0-9-]+\.(?:com|org|net))\b".to_string()),
        // Quoted term
        Just(r"'([^' ]{2,20})'".to_string()),
        // No capturing group at all
        arb_word(),
        // Two groups; at most one participates per match
        (arb_word(), arb_word()).prop_map(|(a, b)| format!("({a})|({b})")),
    ]
}

// =============================================================================
// Rule Set Strategies
// =============================================================================

/// Strategy for generating valid PatternRule instances.
pub fn arb_pattern_rule() -> impl Strategy<Value = PatternRule> {
    (arb_rule_name(), any::<bool>(), arb_pattern()).prop_map(|(name, active, pattern)| {
        PatternRule {
            name,
            active,
            pattern,
        }
    })
}

/// Strategy for generating rule groups with at least one rule each.
pub fn arb_rule_group() -> impl Strategy<Value = RuleGroup> {
    (
        arb_rule_name(),
        any::<bool>(),
        prop::collection::vec(arb_pattern_rule(), 1..=MAX_RULES_PER_GROUP),
    )
        .prop_map(|(name, active, rules)| RuleGroup {
            name,
            active,
            collapsed: false,
            rules,
        })
}

/// Strategy for generating whole rule sets, possibly empty.
pub fn arb_rule_set() -> impl Strategy<Value = RuleSet> {
    (
        prop::collection::vec(arb_rule_group(), 0..=MAX_GROUPS),
        prop::collection::vec(arb_pattern_rule(), 0..=MAX_STANDALONE_RULES),
    )
        .prop_map(|(groups, standalone)| RuleSet { groups, standalone })
}

/// Strategy for generating suppression policies with every flag combination.
pub fn arb_policy() -> impl Strategy<Value = SuppressionPolicy> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        prop::collection::btree_set(arb_word(), 0..=MAX_BLACKLIST_ENTRIES),
    )
        .prop_map(
            |(ignore_links, ignore_urls, defang_urls, ignore_code_blocks, blacklist)| {
                SuppressionPolicy {
                    ignore_links,
                    ignore_urls,
                    defang_urls,
                    ignore_code_blocks,
                    blacklist,
                }
            },
        )
}

// =============================================================================
// Document Text Strategies
// =============================================================================

/// Strategy for generating one line of bracket-free prose.
pub fn arb_prose_line() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z ]{0,40}").expect("valid regex for prose line")
}

/// Strategy for generating email addresses the built-in email shapes match.
pub fn arb_email() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-z]{1,8}@[a-z]{1,8}\.(com|org|net)")
        .expect("valid regex for email")
}

/// Strategy for generating multi-line document text. Some lines carry an
/// email so pattern rules have something to match.
pub fn arb_document_text() -> impl Strategy<Value = String> {
    let line = prop_oneof![
        arb_prose_line(),
        (arb_prose_line(), arb_email(), arb_prose_line())
            .prop_map(|(a, email, b)| format!("{a} {email} {b}")),
    ];
    prop::collection::vec(line, 0..=MAX_LINES_PER_DOCUMENT).prop_map(|lines| lines.join("\n"))
}

// =============================================================================
// Helper Strategies
// =============================================================================

/// Strategy for generating rule and group names.
fn arb_rule_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9]{0,15}").expect("valid regex for rule name")
}

/// Strategy for generating plain lowercase words.
fn arb_word() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{2,10}").expect("valid regex for word")
}

// =============================================================================
// Tests
// =============================================================================
