//! Batch engine: schedules document reads, annotation, and write-backs.

mod batch;
mod document;
mod render;

pub use batch::{BatchPlan, BatchRun, CancelToken, DEFAULT_CONCURRENCY, run_batch};
pub use document::{Document, FsDocument};
pub use render::{render_json, render_summary};
