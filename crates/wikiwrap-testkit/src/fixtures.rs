//! Common test fixtures: in-memory document handles, sample rule sets, and
//! sample note text for use in tests across the workspace.

use std::sync::{Arc, Mutex};

use anyhow::anyhow;

use wikiwrap_core::Document;
use wikiwrap_types::{PatternRule, RuleGroup, RuleSet, RulesFile};

// =============================================================================
// Document Handles
// =============================================================================

/// An in-memory document. Clones share one buffer, so a test can keep a
/// handle and pass another to a batch run, then inspect what was written.
#[derive(Debug, Clone)]
pub struct MemDocument {
    name: String,
    text: Arc<Mutex<String>>,
}

impl MemDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Arc::new(Mutex::new(text.into())),
        }
    }

    /// Current buffer contents.
    pub fn text(&self) -> String {
        self.text.lock().expect("document lock poisoned").clone()
    }
}

impl Document for MemDocument {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn read(&self) -> anyhow::Result<String> {
        Ok(self.text())
    }

    fn write(&self, text: &str) -> anyhow::Result<()> {
        *self.text.lock().expect("document lock poisoned") = text.to_string();
        Ok(())
    }
}

/// Which operation of a [`FailingDocument`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Read,
    Write,
}

/// A document whose read or write always fails, for exercising failure
/// isolation in batch runs.
#[derive(Debug, Clone)]
pub struct FailingDocument {
    name: String,
    mode: FailureMode,
    text: String,
}

impl FailingDocument {
    /// A document that cannot be read.
    pub fn read_error(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: FailureMode::Read,
            text: String::new(),
        }
    }

    /// A document that reads `text` but rejects every write. Pass text the
    /// rules will change, otherwise the write is never attempted.
    pub fn write_error(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: FailureMode::Write,
            text: text.into(),
        }
    }
}

impl Document for FailingDocument {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn read(&self) -> anyhow::Result<String> {
        match self.mode {
            FailureMode::Read => Err(anyhow!("simulated read failure for {}", self.name)),
            FailureMode::Write => Ok(self.text.clone()),
        }
    }

    fn write(&self, _text: &str) -> anyhow::Result<()> {
        Err(anyhow!("simulated write failure for {}", self.name))
    }
}

// =============================================================================
// Sample Rule Sets
// =============================================================================

/// Collection of sample rule sets for testing.
pub mod sample_rules {
    use super::*;

    /// No rules at all.
    pub fn empty() -> RuleSet {
        RuleSet {
            groups: vec![],
            standalone: vec![],
        }
    }

    /// The built-in library shipped with the tool.
    pub fn built_in() -> RuleSet {
        RulesFile::built_in().rule_set()
    }

    /// One email rule, the smallest useful set.
    pub fn email_only() -> RuleSet {
        RuleSet {
            groups: vec![],
            standalone: vec![PatternRule {
                name: "eMail".to_string(),
                active: true,
                pattern: r"([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})".to_string(),
            }],
        }
    }

    /// Email, domain, and MD5 rules in one group, in that order. Emails run
    /// before domains, so a wrapped email shields its domain part.
    pub fn ioc_group() -> RuleSet {
        RuleSet {
            groups: vec![RuleGroup {
                name: "Indicators".to_string(),
                active: true,
                collapsed: false,
                rules: vec![
                    PatternRule {
                        name: "eMail".to_string(),
                        active: true,
                        pattern: r"([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})".to_string(),
                    },
                    PatternRule {
                        name: "Domains".to_string(),
                        active: true,
                        pattern: r"\b([a-zA-Z0-9\-\.]+\.(?:com|org|net))\b".to_string(),
                    },
                    PatternRule {
                        name: "MD5".to_string(),
                        active: true,
                        pattern: r"\b([a-fA-F0-9]{32})\b".to_string(),
                    },
                ],
            }],
            standalone: vec![],
        }
    }

    /// The email rule plus one rule whose pattern does not compile.
    pub fn with_broken_rule() -> RuleSet {
        let mut set = email_only();
        set.standalone.push(PatternRule {
            name: "Broken".to_string(),
            active: true,
            pattern: "(".to_string(),
        });
        set
    }
}

// =============================================================================
// Sample Notes
// =============================================================================

/// Collection of sample note text for testing.
pub mod sample_notes {
    /// A short incident note with an email, a domain, and an MD5 hash.
    pub fn incident() -> &'static str {
        "# Incident 4711\n\
         Reported by ops@example.com after traffic to evil.example.com.\n\
         Dropper hash d41d8cd98f00b204e9800998ecf8427e matched the feed."
    }

    /// A note whose indicator sits inside a fenced code block.
    pub fn fenced() -> &'static str {
        "Before the fence.\n\
         ```\n\
         probe ops@example.com\n\
         ```\n\
         After the fence."
    }

    /// A note with defanged URL and IP punctuation.
    pub fn defanged() -> &'static str {
        "C2 was hxxp style: http[:]//bad[.]example[.]com and 10[.]0[.]0[.]5 apart."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikiwrap_core::{BatchPlan, CancelToken, run_batch};
    use wikiwrap_types::SuppressionPolicy;

    #[test]
    fn mem_document_round_trips() {
        let doc = MemDocument::new("note.md", "before");
        assert_eq!(doc.name(), "note.md");
        assert_eq!(doc.read().unwrap(), "before");

        doc.write("after").unwrap();
        assert_eq!(doc.read().unwrap(), "after");
    }

    #[test]
    fn mem_document_clones_share_one_buffer() {
        let doc = MemDocument::new("note.md", "before");
        let clone = doc.clone();

        clone.write("after").unwrap();
        assert_eq!(doc.text(), "after");
    }

    #[test]
    fn failing_document_fails_the_declared_operation() {
        let unreadable = FailingDocument::read_error("broken.md");
        assert!(unreadable.read().is_err());

        let unwritable = FailingDocument::write_error("stuck.md", "mail bob@example.com");
        assert_eq!(unwritable.read().unwrap(), "mail bob@example.com");
        assert!(unwritable.write("anything").is_err());
    }

    #[test]
    fn sample_rule_patterns_compile() {
        for set in [
            sample_rules::empty(),
            sample_rules::built_in(),
            sample_rules::email_only(),
            sample_rules::ioc_group(),
        ] {
            let rules = set
                .groups
                .iter()
                .flat_map(|g| g.rules.iter())
                .chain(set.standalone.iter());
            for rule in rules {
                assert!(
                    regex::Regex::new(&rule.pattern).is_ok(),
                    "pattern for '{}' should compile",
                    rule.name
                );
            }
        }
    }

    #[test]
    fn broken_rule_fixture_really_is_broken() {
        let set = sample_rules::with_broken_rule();
        let broken = set
            .standalone
            .iter()
            .find(|r| r.name == "Broken")
            .expect("fixture keeps the broken rule");
        assert!(regex::Regex::new(&broken.pattern).is_err());
    }

    #[test]
    fn mem_documents_run_through_a_batch() {
        let doc = MemDocument::new("note.md", "mail bob@example.com");
        let documents: Vec<Box<dyn Document>> = vec![Box::new(doc.clone())];

        let run = run_batch(
            &BatchPlan::default(),
            &sample_rules::email_only(),
            &SuppressionPolicy::default(),
            &documents,
            &CancelToken::new(),
        )
        .expect("batch should run");

        assert_eq!(run.receipt.totals.changed, 1);
        assert_eq!(doc.text(), "mail [[bob@example.com]]");
    }
}
