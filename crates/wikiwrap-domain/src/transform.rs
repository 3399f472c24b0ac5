//! Document-level annotation.
//!
//! A document is transformed as a whole: optional refang pre-pass, then a
//! sequential line walk that skips fenced code blocks, then rejoin and a
//! trailing trim. Line order and rule order are never reordered; the
//! suppression checks depend on earlier wraps being visible.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use wikiwrap_types::{RuleSet, RuleWarning, SuppressionPolicy};

use crate::rewrite::rewrite_line;
use crate::rules::{CompiledRule, compile_rule_set};

/// Defanged URL punctuation: `[.]` and `[:]`.
static DEFANG_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([.:])\]").expect("static pattern should compile"));

/// Restore defanged URL punctuation: `[.]` becomes `.` and `[:]` becomes
/// `:`. A single pass over the buffer; replacements are never re-scanned.
pub fn refang(text: &str) -> Cow<'_, str> {
    DEFANG_TOKEN.replace_all(text, "$1")
}

/// The result of one document transformation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotated {
    pub text: String,
    pub links_added: u32,
    pub warnings: Vec<RuleWarning>,
}

/// Annotate one document with a rule set. Rules are compiled on the spot;
/// rules that fail to compile are skipped and reported in the outcome's
/// warnings.
pub fn annotate(text: &str, set: &RuleSet, policy: &SuppressionPolicy) -> Annotated {
    let compiled = compile_rule_set(set);
    let mut out = annotate_compiled(text, &compiled.rules, policy);
    out.warnings = compiled.warnings;
    out
}

/// Annotate with pre-compiled rules. Batch callers compile once and reuse
/// the rules across documents; compile warnings are reported there, so the
/// outcome returned here carries none.
pub fn annotate_compiled(
    text: &str,
    rules: &[CompiledRule],
    policy: &SuppressionPolicy,
) -> Annotated {
    let refanged;
    let input: &str = if policy.defang_urls {
        refanged = refang(text);
        &refanged
    } else {
        text
    };

    let mut lines: Vec<String> = Vec::new();
    let mut links_added: u32 = 0;
    let mut in_code_block = false;

    for line in input.split('\n') {
        if policy.ignore_code_blocks && line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(line.to_string());
            continue;
        }

        if in_code_block {
            lines.push(line.to_string());
            continue;
        }

        let outcome = rewrite_line(line, rules, policy);
        links_added = links_added.saturating_add(outcome.links_added);
        lines.push(outcome.text);
    }

    let mut text = lines.join("\n");
    text.truncate(text.trim_end().len());

    Annotated {
        text,
        links_added,
        warnings: Vec::new(),
    }
}
