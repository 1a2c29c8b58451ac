//! Aggregated outcome of a rename run.
//!
//! Every directory task produces a [`WalkReport`] fragment; parents merge the
//! fragments of their children, so the root fragment describes the whole tree.

use std::path::PathBuf;

use crate::core::git::ResetOutcome;

/// A per-item failure that did not stop the walk.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

/// Counters and per-item records for one subtree.
#[derive(Debug, Default)]
pub struct WalkReport {
    /// Directories listed (including the subtree root)
    pub dirs_visited: usize,
    /// Source files read and classified
    pub files_scanned: usize,
    /// Source files whose content changed
    pub changed: Vec<PathBuf>,
    /// Files actually written back (zero in dry-run)
    pub files_written: usize,
    /// Lines substituted across all files
    pub lines_rewritten: usize,
    /// Directories skipped after listing (inaccessible, ignored)
    pub skipped_dirs: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

impl WalkReport {
    /// Fold a child subtree into this one.
    pub fn merge(&mut self, other: WalkReport) {
        self.dirs_visited += other.dirs_visited;
        self.files_scanned += other.files_scanned;
        self.changed.extend(other.changed);
        self.files_written += other.files_written;
        self.lines_rewritten += other.lines_rewritten;
        self.skipped_dirs.extend(other.skipped_dirs);
        self.failures.extend(other.failures);
    }

    /// Sort path lists so output is stable regardless of scheduling.
    pub fn sort(&mut self) {
        self.changed.sort();
        self.skipped_dirs.sort();
        self.failures.sort_by(|a, b| a.path.cmp(&b.path));
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Everything a run did: manifest, walk and reset.
#[derive(Debug)]
pub struct RunReport {
    pub manifest: PathBuf,
    pub old_module: String,
    pub new_module: String,
    pub walk: WalkReport,
    /// `None` when the reset was disabled
    pub reset: Option<ResetOutcome>,
    pub dry_run: bool,
}

impl RunReport {
    /// True when every source file was processed. Reset problems are
    /// reported but never make a run unsuccessful.
    pub fn is_success(&self) -> bool {
        self.walk.is_clean()
    }
}
