//! Domain logic: rule compilation + line annotation.
//!
//! This crate is designed to be I/O-free and highly testable. Hosts hand it
//! a rule set and a suppression policy (from `wikiwrap-types`) and get
//! rewritten text back.

pub mod invert;
pub mod rewrite;
pub mod rules;
pub mod suppress;
pub mod transform;

pub use invert::{unlink, unlink_all};
pub use rewrite::{LineOutcome, rewrite_line};
pub use rules::{
    CompiledRule, CompiledRules, RuleCompileError, compile_rule, compile_rule_set,
    validate_rule_set,
};
pub use suppress::{
    SuppressReason, inside_existing_link, inside_protected_url, is_blacklisted,
    suppression_reason,
};
pub use transform::{Annotated, annotate, annotate_compiled, refang};
