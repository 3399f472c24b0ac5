//! Shared test utilities for the wikiwrap workspace.
//!
//! This crate provides:
//! - **arb**: Proptest strategies for generating valid rule sets, policies,
//!   and document text
//! - **fixtures**: In-memory document handles and sample rule sets
//!
//! # Example
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use wikiwrap_testkit::arb;
//!
//! proptest! {
//!     fn annotation_never_panics(set in arb::arb_rule_set(), text in arb::arb_document_text()) {
//!         let _ = wikiwrap_domain::annotate(&text, &set, &Default::default());
//!     }
//! }
//! ```

pub mod arb;
pub mod fixtures;

// Re-export commonly used items
pub use arb::{
    arb_document_text, arb_pattern, arb_pattern_rule, arb_policy, arb_rule_group, arb_rule_set,
};
pub use fixtures::{FailingDocument, MemDocument, sample_notes, sample_rules};
