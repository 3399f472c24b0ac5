use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use wikiwrap_domain::{CompiledRule, annotate_compiled, compile_rule_set};
use wikiwrap_types::{
    BATCH_SCHEMA_V1, BatchReceipt, BatchTotals, DocumentOutcome, DocumentStatus, RuleSet,
    SuppressionPolicy, ToolMeta,
};

use crate::document::Document;
use crate::render::render_summary;

/// Upper bound on documents in flight when the caller does not pick one.
pub const DEFAULT_CONCURRENCY: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// Maximum number of documents processed at once. Clamped to at least 1
    /// and never wider than the document list.
    pub concurrency: usize,
    /// Persist rewritten text through the document handles. When false the
    /// run is a dry run: the receipt reports what would change and nothing
    /// is written.
    pub write: bool,
}

impl Default for BatchPlan {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            write: true,
        }
    }
}

/// Cooperative stop signal for an in-flight batch.
///
/// Cancellation is best effort: documents already started run to completion,
/// documents not yet started are recorded as cancelled instead of processed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every clone of this token. Irreversible.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRun {
    pub receipt: BatchReceipt,
    /// Per-document lines plus a totals line, ready for terminal output.
    pub summary: String,
    pub exit_code: i32,
}

/// Annotate every document, at most `plan.concurrency` at a time, and
/// collect one receipt for the whole run.
///
/// Rules are compiled once up front and shared read-only across workers;
/// compile warnings land on the receipt, not on individual documents. A
/// failure in one document never stops the others: it becomes a `failed`
/// outcome and the run carries on. Outcomes keep the input order of
/// `documents` regardless of completion order.
pub fn run_batch(
    plan: &BatchPlan,
    rule_set: &RuleSet,
    policy: &SuppressionPolicy,
    documents: &[Box<dyn Document>],
    cancel: &CancelToken,
) -> Result<BatchRun, anyhow::Error> {
    let compiled = compile_rule_set(rule_set);

    let threads = plan.concurrency.clamp(1, documents.len().max(1));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;

    let outcomes: Vec<DocumentOutcome> = pool.install(|| {
        documents
            .par_iter()
            .map(|doc| process_document(doc.as_ref(), &compiled.rules, policy, plan.write, cancel))
            .collect()
    });

    let totals = tally(&outcomes);
    let exit_code = compute_exit_code(&totals);

    let receipt = BatchReceipt {
        schema: BATCH_SCHEMA_V1.to_string(),
        tool: ToolMeta {
            name: "wikiwrap".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        totals,
        warnings: compiled.warnings,
        documents: outcomes,
    };
    let summary = render_summary(&receipt);

    Ok(BatchRun {
        receipt,
        summary,
        exit_code,
    })
}

/// Read, annotate, and (optionally) write back one document. Never panics;
/// every failure is folded into the returned outcome.
fn process_document(
    doc: &dyn Document,
    rules: &[CompiledRule],
    policy: &SuppressionPolicy,
    write: bool,
    cancel: &CancelToken,
) -> DocumentOutcome {
    let name = doc.name();

    if cancel.is_cancelled() {
        return DocumentOutcome {
            name,
            status: DocumentStatus::Cancelled,
            links_added: 0,
            error: None,
        };
    }

    let text = match doc.read() {
        Ok(text) => text,
        Err(err) => return failed_outcome(name, &err),
    };

    let annotated = annotate_compiled(&text, rules, policy);
    if annotated.text == text {
        return DocumentOutcome {
            name,
            status: DocumentStatus::Unchanged,
            links_added: 0,
            error: None,
        };
    }

    if write {
        if let Err(err) = doc.write(&annotated.text) {
            return failed_outcome(name, &err);
        }
    }

    DocumentOutcome {
        name,
        status: DocumentStatus::Changed,
        links_added: annotated.links_added,
        error: None,
    }
}

fn failed_outcome(name: String, err: &anyhow::Error) -> DocumentOutcome {
    DocumentOutcome {
        name,
        status: DocumentStatus::Failed,
        links_added: 0,
        // `:#` keeps the whole context chain on one line.
        error: Some(format!("{err:#}")),
    }
}

fn tally(outcomes: &[DocumentOutcome]) -> BatchTotals {
    let mut totals = BatchTotals {
        total: outcomes.len() as u32,
        ..BatchTotals::default()
    };

    for outcome in outcomes {
        match outcome.status {
            DocumentStatus::Changed => {
                totals.processed = totals.processed.saturating_add(1);
                totals.changed = totals.changed.saturating_add(1);
                totals.links_added = totals.links_added.saturating_add(outcome.links_added);
            }
            DocumentStatus::Unchanged => {
                totals.processed = totals.processed.saturating_add(1);
                totals.unchanged = totals.unchanged.saturating_add(1);
            }
            DocumentStatus::Failed => totals.failed = totals.failed.saturating_add(1),
            DocumentStatus::Cancelled => totals.cancelled = totals.cancelled.saturating_add(1),
        }
    }

    totals
}

fn compute_exit_code(totals: &BatchTotals) -> i32 {
    if totals.failed > 0 { 1 } else { 0 }
}
