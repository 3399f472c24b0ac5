use std::path::{Path, PathBuf};

use anyhow::Context;

/// A named unit of text that a batch run can read and rewrite.
///
/// The scheduler never touches storage directly; it goes through this trait
/// so a run can target files on disk, editor buffers, or in-memory fixtures
/// alike. Handles are shared across worker threads by reference, hence the
/// `Send + Sync` bound and the `&self` receiver on `write`.
pub trait Document: Send + Sync {
    /// Stable identifier used in receipts and summaries.
    fn name(&self) -> String;

    fn read(&self) -> anyhow::Result<String>;

    fn write(&self, text: &str) -> anyhow::Result<()>;
}

/// A document backed by a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsDocument {
    path: PathBuf,
}

impl FsDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Document for FsDocument {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> anyhow::Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))
    }

    fn write(&self, text: &str) -> anyhow::Result<()> {
        std::fs::write(&self.path, text)
            .with_context(|| format!("write {}", self.path.display()))
    }
}
