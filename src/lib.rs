//! **remod** - Rewrite a Go module's import path across a whole source tree
//!
//! Locates the module manifest, installs the new identifier, then rewrites
//! every source file line by line on a rayon task tree while the repository
//! is detached and reinitialised alongside.

/// Command-line interface with clap integration
pub mod cli;

/// Core processing pipeline - manifest, classification, rewrite, reset
pub mod core {
    /// Manifest lookup and identifier rewrite (shallow, first match wins)
    pub mod manifest;
    pub use manifest::{Manifest, ManifestError, locate_and_rewrite};

    /// Import-context aware single-substitution line classifier
    pub mod classify;
    pub use classify::{LineClassifier, LineEdit, LineKind, ModulePair};

    /// Whole-file rewrite; writes only when a line changed
    pub mod rewrite;
    pub use rewrite::{FileOutcome, FileRewriter, RewriteError};

    /// Repository metadata removal, `git init` and remote setup
    pub mod git;
    pub use git::{RepoReset, ResetOutcome};

    /// Per-directory report fragments and the aggregated run result
    pub mod report;
    pub use report::{Failure, RunReport, WalkReport};

    /// Orchestration of manifest, walk and reset
    pub mod rename;
    pub use rename::{RenameRequest, rename};
}

/// Infrastructure - Configuration, I/O, and traversal
pub mod infra {
    /// Layered configuration (remod.toml + REMOD_* env)
    pub mod config;
    pub use config::{Config, RewriteConfig, VcsConfig, WalkConfig, load_config};

    /// File reading with memory mapping above 1 MiB, line split/join
    pub mod io;
    pub use io::{FileContent, read_file_smart};

    /// Parallel per-directory tree walker
    pub mod walk;
    pub use walk::{TreeWalker, WalkError};
}

// Strategic re-exports for clean CLI interface
pub use crate::cli::{AppContext, Cli};
pub use crate::core::{RenameRequest, RunReport, rename};
pub use crate::infra::{Config, load_config};
