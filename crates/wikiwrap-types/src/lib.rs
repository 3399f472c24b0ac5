//! Data types (rules, policy, receipts) for wikiwrap.
//!
//! This crate is intentionally "dumb": pure DTOs with serde + schemars.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Schema Identifiers ─────────────────────────────────────────
pub const BATCH_SCHEMA_V1: &str = "wikiwrap.batch.v1";

/// A single named regular expression with an activation flag.
///
/// `pattern` is regex source in the `regex` crate dialect. A rule is expected
/// to define at most one capturing group; the engine wraps the full match and
/// uses the first non-empty group (or the full match when no group exists)
/// for suppression checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PatternRule {
    pub name: String,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub active: bool,

    pub pattern: String,
}

/// A named, independently-activatable collection of rules.
///
/// `collapsed` is presentation state for settings surfaces; it round-trips
/// through the config file but the engine never reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleGroup {
    pub name: String,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub active: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,

    #[serde(default)]
    pub rules: Vec<PatternRule>,
}

/// The ordered rule collection the engine evaluates.
///
/// Evaluation order is groups first (in order, each group's rules in order),
/// then standalone rules in order. Order is significant: a span wrapped by an
/// earlier rule must not be re-wrapped by a later one in the same pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleSet {
    #[serde(default, rename = "group", skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<RuleGroup>,

    #[serde(default, rename = "rule", skip_serializing_if = "Vec::is_empty")]
    pub standalone: Vec<PatternRule>,
}

impl RuleSet {
    /// Total number of rules, grouped and standalone, active or not.
    pub fn rule_count(&self) -> usize {
        self.groups.iter().map(|g| g.rules.len()).sum::<usize>() + self.standalone.len()
    }
}

/// Feature flags and exclusion data deciding whether a matched span is left
/// alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SuppressionPolicy {
    /// Skip values already inside a `[[...]]` span (idempotence guard).
    pub ignore_links: bool,

    /// Skip values contained in live URLs (unless the URL ends in an
    /// extension from the fixed exclusion set).
    pub ignore_urls: bool,

    /// Refang `[.]` and `[:]` tokens across the buffer before matching.
    pub defang_urls: bool,

    /// Leave fenced code blocks untouched.
    pub ignore_code_blocks: bool,

    /// Exact-match strings that must never be wrapped.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub blacklist: BTreeSet<String>,
}

impl Default for SuppressionPolicy {
    fn default() -> Self {
        Self {
            ignore_links: true,
            ignore_urls: false,
            defang_urls: true,
            ignore_code_blocks: true,
            blacklist: [
                "127.0.0.1".to_string(),
                r"\Users\Public\".to_string(),
                r"\Users\Administrator\".to_string(),
            ]
            .into_iter()
            .collect(),
        }
    }
}

/// The on-disk configuration file (`wikiwrap.toml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RulesFile {
    /// Include other rules files. Paths are relative to this file's
    /// directory. Groups and rules are merged: later definitions override
    /// earlier ones by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    #[serde(default)]
    pub policy: SuppressionPolicy,

    #[serde(default, rename = "group", skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<RuleGroup>,

    #[serde(default, rename = "rule", skip_serializing_if = "Vec::is_empty")]
    pub standalone: Vec<PatternRule>,
}

impl RulesFile {
    pub fn rule_set(&self) -> RuleSet {
        RuleSet {
            groups: self.groups.clone(),
            standalone: self.standalone.clone(),
        }
    }

    pub fn built_in() -> Self {
        Self {
            includes: vec![],
            policy: SuppressionPolicy::default(),
            groups: vec![
                RuleGroup {
                    name: "Email and Domains".to_string(),
                    active: true,
                    collapsed: false,
                    rules: vec![
                        PatternRule {
                            name: "eMail".to_string(),
                            active: true,
                            pattern: r"([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})"
                                .to_string(),
                        },
                        PatternRule {
                            name: "Domains".to_string(),
                            active: true,
                            pattern:
                                r"\b([a-zA-Z0-9\-\.]+\.(?:com|org|net|mil|edu|COM|ORG|NET|MIL|EDU))"
                                    .to_string(),
                        },
                        PatternRule {
                            name: "IP".to_string(),
                            active: true,
                            // Loopback and other never-link addresses belong in
                            // the policy blacklist, not in the pattern.
                            pattern: r"\b((?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?))\b"
                                .to_string(),
                        },
                    ],
                },
                RuleGroup {
                    name: "Hashes and Identifiers".to_string(),
                    active: true,
                    collapsed: false,
                    rules: vec![
                        PatternRule {
                            name: "GUID".to_string(),
                            active: true,
                            pattern: r"([A-Fa-f0-9]{8}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{12})"
                                .to_string(),
                        },
                        PatternRule {
                            name: "SHA256".to_string(),
                            active: true,
                            pattern: r"\b([a-fA-F0-9]{64})\b".to_string(),
                        },
                        PatternRule {
                            name: "JARM".to_string(),
                            active: true,
                            pattern: r"\b([a-fA-F0-9]{62})\b".to_string(),
                        },
                        PatternRule {
                            name: "SHA1".to_string(),
                            active: true,
                            pattern: r"\b([a-fA-F0-9]{40})\b".to_string(),
                        },
                        PatternRule {
                            name: "MD5".to_string(),
                            active: true,
                            pattern: r"\b([a-fA-F0-9]{32})\b".to_string(),
                        },
                        PatternRule {
                            name: "Bitcoin".to_string(),
                            active: true,
                            pattern: r"\b([13]{1}[a-km-zA-HJ-NP-Z1-9]{26,33}|bc1[a-z0-9]{39,59})\b"
                                .to_string(),
                        },
                    ],
                },
                RuleGroup {
                    name: "Forensics".to_string(),
                    active: true,
                    collapsed: false,
                    rules: vec![
                        PatternRule {
                            name: "Date".to_string(),
                            active: true,
                            pattern: r"((?:0[1-9]|[12][0-9]|3[01])[\\/.\-](?:0[1-9]|1[012])[\\/.\-](?:19|20)?\d\d)"
                                .to_string(),
                        },
                        PatternRule {
                            name: "Windows Usernames".to_string(),
                            active: true,
                            // Service accounts are excluded through the policy
                            // blacklist.
                            pattern: r"\\Users\\+([^\\]+)\\".to_string(),
                        },
                        PatternRule {
                            name: "Windows Artifacts".to_string(),
                            active: true,
                            pattern: r"\b(\w+\.(?:bat|ps1|dll|exe|reg))\b".to_string(),
                        },
                        PatternRule {
                            name: "Linux Artifacts".to_string(),
                            active: true,
                            pattern: r"\b(\w+\.(?:sh|so|conf|tar\.gz))\b".to_string(),
                        },
                        PatternRule {
                            name: "Mac Artifacts".to_string(),
                            active: true,
                            pattern: r"\b(\w+\.(?:app|pkg|dmg))\b".to_string(),
                        },
                    ],
                },
                RuleGroup {
                    name: "Research".to_string(),
                    active: true,
                    collapsed: false,
                    rules: vec![
                        PatternRule {
                            name: "Quoted Terms".to_string(),
                            active: true,
                            pattern: r"[´]([^´ ]{4,30})[´]".to_string(),
                        },
                        PatternRule {
                            name: "Emphasized Terms".to_string(),
                            active: true,
                            pattern: r"_([^_ ]{4,30})_".to_string(),
                        },
                        PatternRule {
                            name: "BibTeX Entries".to_string(),
                            active: true,
                            pattern: r"@(article|book|inbook|conference|inproceedings)\{[^}]+\}"
                                .to_string(),
                        },
                        PatternRule {
                            name: "GPS Coordinates".to_string(),
                            active: true,
                            pattern: r"(\b[+-]?[0-9]{1,2}\.[0-9]+,\s*[+-]?[0-9]{1,3}\.[0-9]+\b)"
                                .to_string(),
                        },
                        PatternRule {
                            name: "ISBN Numbers".to_string(),
                            active: true,
                            pattern: r"(\bISBN\s?(?:-?13|-10)?:?\s?[0-9-]{10,17}\b)".to_string(),
                        },
                        PatternRule {
                            name: "Signal Frequencies".to_string(),
                            active: true,
                            pattern: r"(\b[0-9]{1,4}(?:\.\d{1,4})?\s?(?:Hz|kHz|MHz|GHz)\b)"
                                .to_string(),
                        },
                        PatternRule {
                            name: "Hex Colors".to_string(),
                            active: false,
                            pattern: r"#([a-fA-F0-9]{6}|[a-fA-F0-9]{3})".to_string(),
                        },
                        PatternRule {
                            name: "Temperature Readings".to_string(),
                            active: false,
                            pattern: r"\b([0-9]+\s?(?:°C|°F|K))\b".to_string(),
                        },
                    ],
                },
                RuleGroup {
                    name: "Media Files".to_string(),
                    active: true,
                    collapsed: false,
                    rules: vec![
                        PatternRule {
                            name: "Images".to_string(),
                            active: true,
                            pattern: r"\b(\w+\.(?:jpg|jpeg|png|gif|bmp|tiff))\b".to_string(),
                        },
                        PatternRule {
                            name: "Movies".to_string(),
                            active: true,
                            pattern: r"\b(\w+\.(?:mp4|avi|mkv|mov|wmv))\b".to_string(),
                        },
                        PatternRule {
                            name: "Audio".to_string(),
                            active: true,
                            pattern: r"\b(\w+\.(?:mp3|wav|aac|flac))\b".to_string(),
                        },
                        PatternRule {
                            name: "Harmless Files".to_string(),
                            active: false,
                            pattern: r"\b(\w+\.(?:txt|asc|csv|log|md))\b".to_string(),
                        },
                        PatternRule {
                            name: "Script Files".to_string(),
                            active: false,
                            pattern: r"\b(\w+\.(?:py|js|java|cs|cpp|rb|go|php))\b".to_string(),
                        },
                    ],
                },
            ],
            standalone: vec![],
        }
    }
}

// ============================================================================
// Rule validation warnings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The pattern does not compile; the rule is skipped at transform time.
    InvalidPattern,
    /// More than one capturing group; only the first non-empty one is used.
    MultipleCaptureGroups,
    /// No capturing group; the whole match doubles as the captured value.
    NoCaptureGroup,
    /// Another rule in the same group (or standalone list) carries this
    /// name. Names key warnings and include overrides, so duplicates make
    /// both ambiguous.
    DuplicateName,
}

impl WarningKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningKind::InvalidPattern => "invalid_pattern",
            WarningKind::MultipleCaptureGroups => "multiple_capture_groups",
            WarningKind::NoCaptureGroup => "no_capture_group",
            WarningKind::DuplicateName => "duplicate_name",
        }
    }
}

/// A per-rule diagnostic, keyed by rule name. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleWarning {
    pub rule: String,
    pub kind: WarningKind,
    pub detail: String,
}

// ============================================================================
// Batch receipt types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Changed,
    Unchanged,
    Failed,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Changed => "changed",
            DocumentStatus::Unchanged => "unchanged",
            DocumentStatus::Failed => "failed",
            DocumentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentOutcome {
    pub name: String,
    pub status: DocumentStatus,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub links_added: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct BatchTotals {
    pub total: u32,
    pub processed: u32,
    pub changed: u32,
    pub unchanged: u32,
    pub failed: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub cancelled: u32,
    pub links_added: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BatchReceipt {
    pub schema: String,
    pub tool: ToolMeta,
    pub totals: BatchTotals,
    /// Rule warnings apply to the whole batch, not to individual documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RuleWarning>,
    pub documents: Vec<DocumentOutcome>,
}

fn default_true() -> bool {
    true
}

fn is_true(b: &bool) -> bool {
    *b
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}
