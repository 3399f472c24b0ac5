use std::collections::HashSet;

use regex::Regex;

use wikiwrap_types::{PatternRule, RuleSet, RuleWarning, WarningKind};

#[derive(Debug, thiserror::Error)]
pub enum RuleCompileError {
    #[error("rule '{rule}' has an empty pattern")]
    EmptyPattern { rule: String },

    #[error("rule '{rule}' has invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        source: regex::Error,
    },
}

/// A rule ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub regex: Regex,
    /// Number of explicit capturing groups in the pattern, counted
    /// structurally by the regex engine rather than by scanning the source
    /// for `(` characters.
    pub capture_groups: usize,
}

pub fn compile_rule(rule: &PatternRule) -> Result<CompiledRule, RuleCompileError> {
    if rule.pattern.trim().is_empty() {
        return Err(RuleCompileError::EmptyPattern {
            rule: rule.name.clone(),
        });
    }

    let regex = Regex::new(&rule.pattern).map_err(|e| RuleCompileError::InvalidPattern {
        rule: rule.name.clone(),
        pattern: rule.pattern.clone(),
        source: e,
    })?;

    // captures_len() includes the implicit whole-match group.
    let capture_groups = regex.captures_len() - 1;

    Ok(CompiledRule {
        name: rule.name.clone(),
        regex,
        capture_groups,
    })
}

/// The active rules of a rule set, compiled in evaluation order.
///
/// Rules whose patterns fail to compile are dropped and reported in
/// `warnings`; they never abort the set.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub rules: Vec<CompiledRule>,
    pub warnings: Vec<RuleWarning>,
}

/// Compile every active rule, preserving evaluation order: groups first (in
/// order, each group's rules in order), then standalone rules. An inactive
/// group disables all of its rules regardless of their own flags.
pub fn compile_rule_set(set: &RuleSet) -> CompiledRules {
    let mut out = CompiledRules::default();

    for rule in active_rules(set) {
        match compile_rule(rule) {
            Ok(compiled) => out.rules.push(compiled),
            Err(err) => out.warnings.push(RuleWarning {
                rule: rule.name.clone(),
                kind: WarningKind::InvalidPattern,
                detail: compile_detail(&err),
            }),
        }
    }

    out
}

/// Check every rule in the set, active or not. Used by rule authors to vet a
/// config before running it.
pub fn validate_rule_set(set: &RuleSet) -> Vec<RuleWarning> {
    let mut warnings = Vec::new();

    for rule in all_rules(set) {
        match compile_rule(rule) {
            Err(err) => warnings.push(RuleWarning {
                rule: rule.name.clone(),
                kind: WarningKind::InvalidPattern,
                detail: compile_detail(&err),
            }),
            Ok(c) if c.capture_groups == 0 => warnings.push(RuleWarning {
                rule: rule.name.clone(),
                kind: WarningKind::NoCaptureGroup,
                detail: "no capturing group; the full match doubles as the captured value"
                    .to_string(),
            }),
            Ok(c) if c.capture_groups > 1 => warnings.push(RuleWarning {
                rule: rule.name.clone(),
                kind: WarningKind::MultipleCaptureGroups,
                detail: format!(
                    "{} capturing groups; only the first non-empty one is used",
                    c.capture_groups
                ),
            }),
            Ok(_) => {}
        }
    }

    for group in &set.groups {
        duplicate_names(&group.rules, &format!("group '{}'", group.name), &mut warnings);
    }
    duplicate_names(&set.standalone, "the standalone rules", &mut warnings);

    warnings
}

/// Names are unique per container: they key warnings and include overrides.
/// Warns once per repeated occurrence.
fn duplicate_names(rules: &[PatternRule], container: &str, warnings: &mut Vec<RuleWarning>) {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.name.as_str()) {
            warnings.push(RuleWarning {
                rule: rule.name.clone(),
                kind: WarningKind::DuplicateName,
                detail: format!("name appears more than once in {container}"),
            });
        }
    }
}

fn compile_detail(err: &RuleCompileError) -> String {
    match err {
        RuleCompileError::EmptyPattern { .. } => "pattern is empty".to_string(),
        RuleCompileError::InvalidPattern { source, .. } => source.to_string(),
    }
}

fn active_rules(set: &RuleSet) -> impl Iterator<Item = &PatternRule> {
    set.groups
        .iter()
        .filter(|g| g.active)
        .flat_map(|g| g.rules.iter())
        .filter(|r| r.active)
        .chain(set.standalone.iter().filter(|r| r.active))
}

fn all_rules(set: &RuleSet) -> impl Iterator<Item = &PatternRule> {
    set.groups
        .iter()
        .flat_map(|g| g.rules.iter())
        .chain(set.standalone.iter())
}
