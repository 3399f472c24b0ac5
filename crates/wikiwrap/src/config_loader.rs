//! Rules file loading with include support.
//!
//! A rules file may pull in other rules files via `includes`. Included
//! files are loaded first, in listing order, and the including file is
//! merged last, so its definitions win on name collisions. Because rules
//! run top to bottom, merging never reorders: an override replaces the
//! existing entry in place and new entries are appended.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use wikiwrap_types::{PatternRule, RuleGroup, RulesFile, SuppressionPolicy};

/// Maximum include nesting depth.
const MAX_INCLUDE_DEPTH: usize = 10;

/// Load a rules file, following `includes` recursively.
pub fn load_rules_with_includes(path: &Path) -> Result<RulesFile> {
    let mut visited = HashSet::new();
    load_recursive(path, 0, &mut visited)
}

fn load_recursive(
    path: &Path,
    depth: usize,
    visited: &mut HashSet<PathBuf>,
) -> Result<RulesFile> {
    if depth > MAX_INCLUDE_DEPTH {
        bail!(
            "include depth exceeds maximum of {} (checking {})",
            MAX_INCLUDE_DEPTH,
            path.display()
        );
    }

    // Canonicalize for cycle detection; the same file reached through two
    // different relative paths must still count as one file.
    let canonical = path
        .canonicalize()
        .with_context(|| format!("resolve rules path {}", path.display()))?;
    if !visited.insert(canonical) {
        bail!("circular include detected: {}", path.display());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read rules {}", path.display()))?;

    let file: RulesFile =
        toml::from_str(&text).with_context(|| format!("parse rules {}", path.display()))?;

    if file.includes.is_empty() {
        return Ok(file);
    }

    // Includes are resolved relative to the directory of the including file.
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut merged = RulesFile::default();
    for include in &file.includes {
        let include_path = base_dir.join(include);
        if !include_path.exists() {
            bail!(
                "include not found: {} (included from {})",
                include_path.display(),
                path.display()
            );
        }
        let included = load_recursive(&include_path, depth + 1, visited)?;
        merged = merge_rules_files(merged, included);
    }

    // The including file is merged last, so its definitions win.
    Ok(merge_rules_files(merged, file))
}

/// Merge two rules files; `other` wins where both define something.
fn merge_rules_files(base: RulesFile, other: RulesFile) -> RulesFile {
    // A policy left at its defaults never overrides one that was set.
    let policy = if other.policy != SuppressionPolicy::default() {
        other.policy
    } else {
        base.policy
    };

    RulesFile {
        includes: Vec::new(),
        policy,
        groups: merge_groups(base.groups, other.groups),
        standalone: merge_rules(base.standalone, other.standalone),
    }
}

/// Merge groups by name. A same-name group replaces the base one in place,
/// keeping its position in the evaluation order; new groups are appended.
fn merge_groups(mut base: Vec<RuleGroup>, other: Vec<RuleGroup>) -> Vec<RuleGroup> {
    for group in other {
        match base.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => *existing = group,
            None => base.push(group),
        }
    }
    base
}

/// Merge standalone rules by name, same in-place override as groups.
fn merge_rules(mut base: Vec<PatternRule>, other: Vec<PatternRule>) -> Vec<PatternRule> {
    for rule in other {
        match base.iter_mut().find(|r| r.name == rule.name) {
            Some(existing) => *existing = rule,
            None => base.push(rule),
        }
    }
    base
}
