//! Filepath: src/infra/walk.rs
//! Concurrent tree walker driving the file rewriter.
//! - One task per directory; subdirectories fan out on the rayon pool
//! - Files of a directory are rewritten inside that directory's task
//! - Hidden directories (leading marker, `.` by default) are never entered
//! - Extra ignore globs match paths relative to the root: early on
//!   directories (pruned), late on source files (skipped)
//! - Symlinked files are rewritten through the link unless disabled;
//!   symlinked directories are never entered
//!
//! A directory's task returns only once its own files and every descendant
//! directory are done (`rayon::join` + `par_iter`), and hands its
//! [`WalkReport`] back to the parent. Each file path is listed by exactly
//! one directory, so no two tasks ever rewrite the same file.

use std::fs::{self, FileType};
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::core::report::{Failure, WalkReport};
use crate::core::rewrite::{FileOutcome, FileRewriter};
use crate::infra::config::RewriteConfig;

/// Failure to list a directory.
#[derive(Debug, thiserror::Error)]
#[error("cannot read directory {path}: {source}")]
pub struct WalkError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// One listed directory entry.
struct Entry {
    path: PathBuf,
    name: String,
    file_type: FileType,
}

/// Recursive, parallel walker over a source tree.
pub struct TreeWalker
{
    /// Rewriter applied to every matching source file
    rewriter: FileRewriter,

    /// Hidden marker and source extension
    conventions: RewriteConfig,

    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,

    /// Rewrite symlinked source files; default true
    follow_symlinks: bool,
}

impl TreeWalker
{
    /// Build a walker with additional ignore patterns (e.g. "vendor",
    /// "vendor/**", "**/testdata"). Patterns match on paths relative to the
    /// root, both for directories and for the source files inside them.
    pub fn new(
        rewriter: FileRewriter,
        conventions: RewriteConfig,
        additional_ignores: &[String],
    ) -> Result<Self, globset::Error>
    {
        Ok(Self {
            rewriter,
            conventions,
            ignore_patterns: compile_ignores(additional_ignores)?,
            follow_symlinks: true,
        })
    }

    /// (Optional) Whether source files reached through symbolic links are
    /// rewritten. Symlinked directories are never followed either way.
    pub fn with_follow_symlinks(
        mut self,
        follow: bool,
    ) -> Self
    {
        self.follow_symlinks = follow;
        self
    }

    /// Walk the tree under `root`. Only a failure to list `root` itself is
    /// returned as an error; everything below is recorded in the report.
    pub fn walk(
        &self,
        root: &Path,
    ) -> Result<WalkReport, WalkError>
    {
        let mut report = self.visit_dir(root, root)?;
        report.sort();
        Ok(report)
    }

    fn visit_dir(
        &self,
        root: &Path,
        dir: &Path,
    ) -> Result<WalkReport, WalkError>
    {
        let entries = list_dir(dir)?;
        info!(dir = %dir.display(), entries = entries.len(), "entering directory");

        let mut subdirs = Vec::new();
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        for entry in entries
        {
            if entry
                .file_type
                .is_dir()
            {
                if self
                    .conventions
                    .is_hidden(&entry.name)
                {
                    debug!(dir = %entry.path.display(), "skipping hidden directory");
                }
                else if self.is_ignored(root, &entry.path)
                {
                    debug!(dir = %entry.path.display(), "skipping ignored directory");
                    skipped.push(entry.path);
                }
                else
                {
                    subdirs.push(entry.path);
                }
            }
            else if entry
                .file_type
                .is_symlink()
                && !self.symlink_is_file(&entry.path)
            {
                debug!(path = %entry.path.display(), "skipping symlink");
            }
            else if !self
                .conventions
                .is_source(&entry.name)
            {
                debug!(path = %entry.path.display(), "skipping non-source file");
            }
            else if self.is_ignored(root, &entry.path)
            {
                // `vendor/**` does not match `vendor` itself, only what is in it
                debug!(path = %entry.path.display(), "skipping ignored file");
            }
            else
            {
                files.push(entry.path);
            }
        }

        // Subdirectories fan out while this task rewrites its own files;
        // both halves complete before the directory reports done.
        let (children, mut report) = rayon::join(
            || {
                subdirs
                    .par_iter()
                    .map(|sub| self.visit_subdir(root, sub))
                    .collect::<Vec<_>>()
            },
            || self.rewrite_files(&files),
        );

        report.dirs_visited += 1;
        report
            .skipped_dirs
            .extend(skipped);
        for child in children
        {
            report.merge(child);
        }

        Ok(report)
    }

    /// Recurse into a listed subdirectory, absorbing its failures.
    fn visit_subdir(
        &self,
        root: &Path,
        dir: &Path,
    ) -> WalkReport
    {
        // The directory may have vanished since the parent listed it
        if let Err(err) = fs::metadata(dir)
        {
            warn!(dir = %dir.display(), error = %err, "cannot access directory, skipping");
            return WalkReport {
                skipped_dirs: vec![dir.to_path_buf()],
                ..Default::default()
            };
        }

        match self.visit_dir(root, dir)
        {
            Ok(report) => report,
            Err(err) =>
            {
                warn!(dir = %dir.display(), error = %err, "directory listing failed");
                WalkReport {
                    failures: vec![Failure {
                        path: dir.to_path_buf(),
                        error: err.into(),
                    }],
                    ..Default::default()
                }
            }
        }
    }

    fn rewrite_files(
        &self,
        files: &[PathBuf],
    ) -> WalkReport
    {
        let mut report = WalkReport::default();

        for path in files
        {
            debug!(path = %path.display(), "source file");
            match self
                .rewriter
                .rewrite_file(path)
            {
                Ok(FileOutcome::Unchanged) => report.files_scanned += 1,
                Ok(FileOutcome::Changed { lines, written }) =>
                {
                    info!(path = %path.display(), lines, written, "file changed");
                    report.files_scanned += 1;
                    report.lines_rewritten += lines;
                    if written
                    {
                        report.files_written += 1;
                    }
                    report
                        .changed
                        .push(path.clone());
                }
                Err(err) =>
                {
                    warn!(path = %path.display(), error = %err, "file rewrite failed");
                    report
                        .failures
                        .push(Failure { path: path.clone(), error: err.into() });
                }
            }
        }

        report
    }

    fn is_ignored(
        &self,
        root: &Path,
        path: &Path,
    ) -> bool
    {
        let rel = path
            .strip_prefix(root)
            .unwrap_or(path);
        self.ignore_patterns
            .is_match(rel)
    }

    fn symlink_is_file(
        &self,
        path: &Path,
    ) -> bool
    {
        self.follow_symlinks
            && fs::metadata(path)
                .map(|m| m.is_file())
                .unwrap_or(false)
    }
}

/// Compile ignore patterns into a single matcher.
pub fn compile_ignores(patterns: &[String]) -> Result<GlobSet, globset::Error>
{
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns
    {
        builder.add(Glob::new(pattern)?);
    }

    builder.build()
}

/// List `dir` in name order.
fn list_dir(dir: &Path) -> Result<Vec<Entry>, WalkError>
{
    let wrap = |source| WalkError { path: dir.to_path_buf(), source };

    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(wrap)?
    {
        let entry = entry.map_err(wrap)?;
        let file_type = match entry.file_type()
        {
            Ok(ft) => ft,
            Err(err) =>
            {
                warn!(path = %entry.path().display(), error = %err, "cannot stat entry, skipping");
                continue;
            }
        };
        out.push(Entry {
            path: entry.path(),
            name: entry
                .file_name()
                .to_string_lossy()
                .into_owned(),
            file_type,
        });
    }

    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}
