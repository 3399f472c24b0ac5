//! Property-based tests for wikiwrap-core.
//!
//! These tests verify batch scheduling: outcome ordering, totals accounting,
//! failure isolation, cancellation, and agreement with the single-document
//! transform, at several concurrency levels.

use proptest::prelude::*;

use wikiwrap_core::{BatchPlan, CancelToken, Document, run_batch};
use wikiwrap_domain::{annotate_compiled, compile_rule_set};
use wikiwrap_testkit::arb;
use wikiwrap_testkit::fixtures::{FailingDocument, MemDocument, sample_notes, sample_rules};
use wikiwrap_types::{DocumentStatus, SuppressionPolicy};

// ============================================================================
// Helpers
// ============================================================================

/// Maximum documents per generated batch.
const MAX_DOCUMENTS: usize = 8;

fn arb_document_texts() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb::arb_document_text(), 0..MAX_DOCUMENTS)
}

fn arb_concurrency() -> impl Strategy<Value = usize> {
    1usize..=8
}

/// Build one shared-buffer handle per text, named by input position.
fn mem_documents(texts: &[String]) -> (Vec<MemDocument>, Vec<Box<dyn Document>>) {
    let mut mems = Vec::with_capacity(texts.len());
    let mut documents: Vec<Box<dyn Document>> = Vec::with_capacity(texts.len());
    for (i, text) in texts.iter().enumerate() {
        let mem = MemDocument::new(format!("doc{i}.md"), text.clone());
        mems.push(mem.clone());
        documents.push(Box::new(mem));
    }
    (mems, documents)
}

fn plan_with(concurrency: usize, write: bool) -> BatchPlan {
    BatchPlan { concurrency, write }
}

proptest! {
    // Every case builds at least one thread pool, so keep the case count
    // lower than in the domain crate.
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Outcomes keep input order and the totals line agrees with them.
    #[test]
    fn property_receipt_orders_and_tallies(
        texts in arb_document_texts(),
        concurrency in arb_concurrency(),
    ) {
        let (_mems, documents) = mem_documents(&texts);

        let run = run_batch(
            &plan_with(concurrency, true),
            &sample_rules::email_only(),
            &SuppressionPolicy::default(),
            &documents,
            &CancelToken::new(),
        )
        .expect("batch should run");

        let receipt = &run.receipt;
        prop_assert_eq!(receipt.totals.total as usize, texts.len());
        for (i, outcome) in receipt.documents.iter().enumerate() {
            prop_assert_eq!(&outcome.name, &format!("doc{i}.md"));
        }

        let changed = receipt
            .documents
            .iter()
            .filter(|d| d.status == DocumentStatus::Changed)
            .count();
        let unchanged = receipt
            .documents
            .iter()
            .filter(|d| d.status == DocumentStatus::Unchanged)
            .count();
        let links: u32 = receipt.documents.iter().map(|d| d.links_added).sum();

        prop_assert_eq!(receipt.totals.changed as usize, changed);
        prop_assert_eq!(receipt.totals.unchanged as usize, unchanged);
        prop_assert_eq!(receipt.totals.failed, 0);
        prop_assert_eq!(receipt.totals.processed as usize, changed + unchanged);
        prop_assert_eq!(receipt.totals.links_added, links);
        prop_assert_eq!(run.exit_code, 0);
    }

    /// A dry run produces the same receipt at any concurrency level.
    #[test]
    fn property_concurrency_never_changes_the_receipt(
        texts in arb_document_texts(),
        concurrency in arb_concurrency(),
    ) {
        let (_mems, serial_docs) = mem_documents(&texts);
        let (_mems2, parallel_docs) = mem_documents(&texts);

        let rules = sample_rules::email_only();
        let policy = SuppressionPolicy::default();
        let cancel = CancelToken::new();

        let serial = run_batch(&plan_with(1, false), &rules, &policy, &serial_docs, &cancel)
            .expect("batch should run");
        let parallel = run_batch(
            &plan_with(concurrency, false),
            &rules,
            &policy,
            &parallel_docs,
            &cancel,
        )
        .expect("batch should run");

        prop_assert_eq!(serial.receipt, parallel.receipt);
        prop_assert_eq!(serial.exit_code, parallel.exit_code);
    }

    /// The batch writes exactly what the single-document transform produces,
    /// for any rule set and policy.
    #[test]
    fn property_batch_agrees_with_single_transform(
        texts in arb_document_texts(),
        set in arb::arb_rule_set(),
        policy in arb::arb_policy(),
        concurrency in arb_concurrency(),
    ) {
        let (mems, documents) = mem_documents(&texts);

        let run = run_batch(
            &plan_with(concurrency, true),
            &set,
            &policy,
            &documents,
            &CancelToken::new(),
        )
        .expect("batch should run");

        let compiled = compile_rule_set(&set);
        for (i, (mem, text)) in mems.iter().zip(texts.iter()).enumerate() {
            let expected = annotate_compiled(text, &compiled.rules, &policy);
            prop_assert_eq!(mem.text(), expected.text.clone());

            let outcome = &run.receipt.documents[i];
            if expected.text == *text {
                prop_assert_eq!(outcome.status, DocumentStatus::Unchanged);
                prop_assert_eq!(outcome.links_added, 0);
            } else {
                prop_assert_eq!(outcome.status, DocumentStatus::Changed);
                prop_assert_eq!(outcome.links_added, expected.links_added);
            }
        }
    }

    /// One unreadable document never stops the others.
    #[test]
    fn property_failures_stay_isolated(
        texts in prop::collection::vec(arb::arb_document_text(), 1..MAX_DOCUMENTS),
        fail_at_seed in any::<usize>(),
        concurrency in arb_concurrency(),
    ) {
        let (mems, mut documents) = mem_documents(&texts);
        let fail_at = fail_at_seed % (documents.len() + 1);
        documents.insert(fail_at, Box::new(FailingDocument::read_error("broken.md")));

        let run = run_batch(
            &plan_with(concurrency, true),
            &sample_rules::email_only(),
            &SuppressionPolicy::default(),
            &documents,
            &CancelToken::new(),
        )
        .expect("batch should run");

        prop_assert_eq!(run.exit_code, 1);
        prop_assert_eq!(run.receipt.totals.failed, 1);
        prop_assert_eq!(run.receipt.totals.processed as usize, mems.len());
        prop_assert_eq!(
            run.receipt.documents[fail_at].status,
            DocumentStatus::Failed
        );

        // The surviving outcomes keep their input order around the gap.
        for (i, _mem) in mems.iter().enumerate() {
            let position = if i < fail_at { i } else { i + 1 };
            prop_assert_eq!(
                &run.receipt.documents[position].name,
                &format!("doc{i}.md")
            );
        }
    }

    /// A run cancelled before it starts marks everything cancelled and
    /// writes nothing.
    #[test]
    fn property_cancelled_runs_write_nothing(
        texts in prop::collection::vec(arb::arb_document_text(), 1..MAX_DOCUMENTS),
        concurrency in arb_concurrency(),
    ) {
        let (mems, documents) = mem_documents(&texts);
        let cancel = CancelToken::new();
        cancel.cancel();

        let run = run_batch(
            &plan_with(concurrency, true),
            &sample_rules::email_only(),
            &SuppressionPolicy::default(),
            &documents,
            &cancel,
        )
        .expect("batch should run");

        prop_assert_eq!(run.receipt.totals.cancelled as usize, texts.len());
        prop_assert_eq!(run.receipt.totals.processed, 0);
        prop_assert_eq!(run.exit_code, 0);
        for (mem, text) in mems.iter().zip(texts.iter()) {
            prop_assert_eq!(&mem.text(), text);
        }
    }
}

// ============================================================================
// Fixed scenarios
// ============================================================================

#[test]
fn batch_annotates_an_incident_note_with_the_built_in_library() {
    let doc = MemDocument::new("incident.md", sample_notes::incident());
    let documents: Vec<Box<dyn Document>> = vec![Box::new(doc.clone())];

    let run = run_batch(
        &BatchPlan::default(),
        &sample_rules::built_in(),
        &SuppressionPolicy::default(),
        &documents,
        &CancelToken::new(),
    )
    .expect("batch should run");

    assert_eq!(run.receipt.totals.changed, 1);
    assert_eq!(run.receipt.totals.links_added, 3);

    let text = doc.text();
    assert!(text.contains("[[ops@example.com]]"), "text was: {text}");
    assert!(text.contains("[[evil.example.com]]"), "text was: {text}");
    assert!(
        text.contains("[[d41d8cd98f00b204e9800998ecf8427e]]"),
        "text was: {text}"
    );
}

#[test]
fn batch_leaves_fenced_indicators_alone() {
    let doc = MemDocument::new("fenced.md", sample_notes::fenced());
    let documents: Vec<Box<dyn Document>> = vec![Box::new(doc.clone())];

    let run = run_batch(
        &BatchPlan::default(),
        &sample_rules::email_only(),
        &SuppressionPolicy::default(),
        &documents,
        &CancelToken::new(),
    )
    .expect("batch should run");

    assert_eq!(run.receipt.totals.unchanged, 1);
    assert_eq!(doc.text(), sample_notes::fenced());
}

#[test]
fn batch_refangs_before_matching() {
    let doc = MemDocument::new("defanged.md", sample_notes::defanged());
    let documents: Vec<Box<dyn Document>> = vec![Box::new(doc.clone())];

    let run = run_batch(
        &BatchPlan::default(),
        &sample_rules::ioc_group(),
        &SuppressionPolicy::default(),
        &documents,
        &CancelToken::new(),
    )
    .expect("batch should run");

    assert_eq!(run.receipt.totals.changed, 1);
    assert_eq!(
        doc.text(),
        "C2 was hxxp style: http://[[bad.example.com]] and 10.0.0.5 apart."
    );
}

#[test]
fn write_failures_are_failed_outcomes() {
    let stuck = FailingDocument::write_error("stuck.md", "mail bob@example.com");
    let documents: Vec<Box<dyn Document>> = vec![Box::new(stuck)];

    let run = run_batch(
        &BatchPlan::default(),
        &sample_rules::email_only(),
        &SuppressionPolicy::default(),
        &documents,
        &CancelToken::new(),
    )
    .expect("batch should run");

    assert_eq!(run.exit_code, 1);
    assert_eq!(run.receipt.documents[0].status, DocumentStatus::Failed);
    let error = run.receipt.documents[0].error.as_deref().unwrap_or("");
    assert!(
        error.contains("simulated write failure"),
        "error was: {error}"
    );
}
