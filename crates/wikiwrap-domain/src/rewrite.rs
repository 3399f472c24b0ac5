//! Single-line rewriting.
//!
//! Rules run in order over a working copy of the line. Each rule performs a
//! global replace; every match is vetted by the suppression checks before it
//! is wrapped. Later rules see earlier rules' wraps, which keeps one value
//! from being wrapped twice in a pass.

use regex::Captures;

use wikiwrap_types::SuppressionPolicy;

use crate::rules::CompiledRule;
use crate::suppress;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineOutcome {
    pub text: String,
    pub links_added: u32,
}

/// Apply every rule to one line, in rule-set order. The input is never
/// mutated; the rewritten line is returned.
pub fn rewrite_line(line: &str, rules: &[CompiledRule], policy: &SuppressionPolicy) -> LineOutcome {
    let mut text = line.to_string();
    let mut links_added: u32 = 0;

    for rule in rules {
        let (next, added) = apply_rule(&text, rule, policy);
        text = next;
        links_added = links_added.saturating_add(added);
    }

    LineOutcome { text, links_added }
}

/// One rule's global-replace pass. Suppression checks read `line` itself:
/// it is stable for the duration of the pass and carries all earlier wraps.
fn apply_rule(line: &str, rule: &CompiledRule, policy: &SuppressionPolicy) -> (String, u32) {
    let mut added: u32 = 0;

    let replaced = rule.regex.replace_all(line, |caps: &Captures<'_>| {
        let full = caps.get(0).expect("group 0 always participates");
        if full.as_str().is_empty() {
            return String::new();
        }

        // The captured value: first non-empty capturing group, or the full
        // match for a rule without groups.
        let value = if rule.capture_groups == 0 {
            full
        } else if let Some(m) = caps.iter().skip(1).flatten().find(|m| !m.as_str().is_empty()) {
            m
        } else {
            // Groups exist but captured nothing usable.
            return full.as_str().to_string();
        };

        let reason = suppress::suppression_reason(
            policy,
            line,
            full.as_str(),
            value.as_str(),
            value.start(),
            value.end(),
        );
        if reason.is_some() {
            return full.as_str().to_string();
        }

        added = added.saturating_add(1);

        // A backslash directly before the match would escape the opening
        // bracket in the host markup; pad with one space.
        if full.start() > 0 && line.as_bytes()[full.start() - 1] == b'\\' {
            format!(" [[{}]]", full.as_str())
        } else {
            format!("[[{}]]", full.as_str())
        }
    });

    (replaced.into_owned(), added)
}
