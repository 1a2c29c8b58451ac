//! Whole-file rewrite built on the line classifier.
//!
//! A file is written back only when at least one line changed. Rewritten
//! files are re-joined with `\n`.

use std::fs;
use std::path::{Path, PathBuf};

use memchr::memmem;
use tracing::{debug, instrument, trace};

use crate::core::classify::{LineClassifier, LineEdit};
use crate::infra::io::{join_lines, read_file_smart, split_lines, wants_final_newline};

/// Per-file failures, recorded by the walker instead of aborting the run.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: PathBuf },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Unchanged,
    /// `written` is false in dry-run mode
    Changed { lines: usize, written: bool },
}

/// New text for a file plus the number of substituted lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub lines: usize,
}

pub struct FileRewriter {
    classifier: LineClassifier,
    keep_final_newline: bool,
    dry_run: bool,
}

impl FileRewriter {
    pub fn new(classifier: LineClassifier, keep_final_newline: bool, dry_run: bool) -> Self {
        Self {
            classifier,
            keep_final_newline,
            dry_run,
        }
    }

    /// Classify every line of `text` in order. `None` when no line changed.
    pub fn rewrite_text(&self, text: &str) -> Option<Rewritten> {
        let mut changed = 0usize;
        let lines: Vec<_> = split_lines(text)
            .into_iter()
            .enumerate()
            .map(|(idx, line)| {
                let edit = self.classifier.classify(line);
                if let LineEdit::Rewritten { kind, .. } = &edit {
                    trace!(line = idx + 1, ?kind, "line rewritten");
                    changed += 1;
                }
                edit.into_text()
            })
            .collect();

        if changed == 0 {
            return None;
        }

        Some(Rewritten {
            text: join_lines(&lines, wants_final_newline(text, self.keep_final_newline)),
            lines: changed,
        })
    }

    /// Rewrite one file in place.
    #[instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    pub fn rewrite_file(&self, path: &Path) -> Result<FileOutcome, RewriteError> {
        let content = read_file_smart(path).map_err(|source| RewriteError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        // Cheap byte search first; most files never mention the module
        let needle = self.classifier.pair().old.as_bytes();
        if needle.is_empty() || memmem::find(content.as_bytes(), needle).is_none() {
            debug!("file unchanged");
            return Ok(FileOutcome::Unchanged);
        }

        let text = content.as_str().map_err(|_| RewriteError::NotUtf8 {
            path: path.to_path_buf(),
        })?;

        let Some(rewritten) = self.rewrite_text(text) else {
            debug!("file unchanged");
            return Ok(FileOutcome::Unchanged);
        };

        // Release a possible mapping before truncating the file
        drop(content);

        if self.dry_run {
            debug!(lines = rewritten.lines, "dry run: file would change");
            return Ok(FileOutcome::Changed {
                lines: rewritten.lines,
                written: false,
            });
        }

        fs::write(path, rewritten.text).map_err(|source| RewriteError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(lines = rewritten.lines, "file changed");

        Ok(FileOutcome::Changed {
            lines: rewritten.lines,
            written: true,
        })
    }
}
