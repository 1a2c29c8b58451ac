//! Version-control reset for the rewritten tree.
//!
//! Removes the repository metadata directory, runs `git init` and, for
//! identifiers on a known host, adds an HTTPS remote. Runs alongside the
//! tree walk and never aborts it: every problem lands in [`ResetOutcome`].

use std::path::PathBuf;
use std::process::{Command, Output};

use tracing::{debug, info, instrument, warn};

use crate::infra::config::VcsConfig;

/// Reset step failures
#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("cannot remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to run `{program} {command}`: {source}")]
    Spawn {
        program: String,
        command: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program} {command}` failed in {dir}: {stderr}")]
    Command {
        program: String,
        command: &'static str,
        dir: PathBuf,
        stderr: String,
    },
}

/// State of the metadata directory after the removal step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metadata {
    Removed,
    Absent,
    /// Present but left alone (dry run)
    Kept,
}

/// What the reset did. Errors are reported, never escalated.
#[derive(Debug)]
pub struct ResetOutcome {
    pub metadata: Option<Metadata>,
    pub initialized: bool,
    /// Remote URL that was configured (in a dry run: would have been)
    pub remote: Option<String>,
    /// Removal and init failures
    pub errors: Vec<ResetError>,
    /// Remote configuration failure; informational only
    pub remote_error: Option<ResetError>,
}

impl ResetOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// HTTPS remote for identifiers hosted on `domain`, e.g.
/// `github.com/acme/tool` -> `https://github.com/acme/tool`.
pub fn https_remote(module: &str, domain: &str) -> Option<String> {
    if domain.is_empty() || !module.contains(domain) {
        return None;
    }
    Some(module.replacen(domain, &format!("https://{domain}"), 1))
}

pub struct RepoReset {
    root: PathBuf,
    vcs: VcsConfig,
    dry_run: bool,
}

impl RepoReset {
    pub fn new(root: impl Into<PathBuf>, vcs: VcsConfig, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            vcs,
            dry_run,
        }
    }

    /// Detach and reinitialise the repository for `new_module`.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn run(&self, new_module: &str) -> ResetOutcome {
        let remote = https_remote(new_module, &self.vcs.hosted_domain);
        let mut outcome = ResetOutcome {
            metadata: None,
            initialized: false,
            remote: None,
            errors: Vec::new(),
            remote_error: None,
        };

        match self.remove_metadata() {
            Ok(state) => outcome.metadata = Some(state),
            Err(err) => {
                warn!(error = %err, "metadata removal failed");
                outcome.errors.push(err);
                return outcome;
            }
        }

        if self.dry_run {
            info!(remote = ?remote, "dry run: repository not reinitialised");
            outcome.remote = remote;
            return outcome;
        }

        match self.git("init", &["init"]) {
            Ok(output) => {
                info!(root = %self.root.display(), "repository initialised");
                debug!(output = %String::from_utf8_lossy(&output.stdout).trim(), "git init output");
                outcome.initialized = true;
            }
            Err(err) => {
                warn!(error = %err, "git init failed");
                outcome.errors.push(err);
                return outcome;
            }
        }

        if let Some(url) = remote {
            match self.git("remote add", &["remote", "add", self.vcs.remote_name.as_str(), url.as_str()]) {
                Ok(_) => {
                    info!(remote = %self.vcs.remote_name, url = %url, "remote configured");
                    outcome.remote = Some(url);
                }
                Err(err) => {
                    debug!(error = %err, "remote configuration failed");
                    outcome.remote_error = Some(err);
                }
            }
        }

        outcome
    }

    fn metadata_path(&self) -> PathBuf {
        self.root.join(&self.vcs.metadata_dir)
    }

    fn remove_metadata(&self) -> Result<Metadata, ResetError> {
        let path = self.metadata_path();
        let remove_err = |source| ResetError::Remove {
            path: path.clone(),
            source,
        };

        match std::fs::symlink_metadata(&path) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no repository metadata to remove");
                Ok(Metadata::Absent)
            }
            Err(err) => Err(remove_err(err)),
            Ok(_) if self.dry_run => {
                info!(path = %path.display(), "dry run: repository metadata kept");
                Ok(Metadata::Kept)
            }
            Ok(meta) => {
                if meta.is_dir() {
                    std::fs::remove_dir_all(&path).map_err(remove_err)?;
                } else {
                    // worktrees and submodules keep a `.git` file
                    std::fs::remove_file(&path).map_err(remove_err)?;
                }
                info!(path = %path.display(), "repository metadata removed");
                Ok(Metadata::Removed)
            }
        }
    }

    fn git(&self, command: &'static str, args: &[&str]) -> Result<Output, ResetError> {
        let program = &self.vcs.git_program;
        let output = Command::new(program)
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|source| ResetError::Spawn {
                program: program.clone(),
                command,
                source,
            })?;

        if !output.status.success() {
            return Err(ResetError::Command {
                program: program.clone(),
                command,
                dir: self.root.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

/// Whether `program` can be executed.
pub fn git_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn vcs(program: &str) -> VcsConfig {
        VcsConfig {
            git_program: program.to_string(),
            ..VcsConfig::default()
        }
    }

    #[test]
    fn test_https_remote() {
        assert_eq!(
            https_remote("github.com/acme/tool", "github.com").as_deref(),
            Some("https://github.com/acme/tool")
        );
        assert_eq!(https_remote("example.org/acme/tool", "github.com"), None);
        assert_eq!(https_remote("github.com/x", ""), None);
    }

    #[test]
    fn test_missing_binary_is_reported_not_fatal() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        fs::create_dir_all(tmp.path().join(".git/objects"))?;

        let outcome = RepoReset::new(tmp.path(), vcs("remod-no-such-git-binary"), false)
            .run("github.com/acme/tool");

        assert_eq!(outcome.metadata, Some(Metadata::Removed));
        assert!(!tmp.path().join(".git").exists());
        assert!(!outcome.initialized);
        assert!(matches!(outcome.errors.as_slice(), [ResetError::Spawn { .. }]));
        assert!(!outcome.is_ok());
        // init never ran, so no remote was added
        assert!(outcome.remote.is_none());
        assert!(outcome.remote_error.is_none());
        Ok(())
    }

    #[test]
    fn test_dry_run_keeps_metadata() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        fs::create_dir_all(tmp.path().join(".git"))?;

        let outcome = RepoReset::new(tmp.path(), vcs("git"), true).run("github.com/acme/tool");

        assert_eq!(outcome.metadata, Some(Metadata::Kept));
        assert!(tmp.path().join(".git").is_dir());
        assert_eq!(outcome.remote.as_deref(), Some("https://github.com/acme/tool"));
        assert!(outcome.is_ok());
        Ok(())
    }

    #[test]
    fn test_reinitialises_with_remote() -> anyhow::Result<()> {
        if !git_available("git") {
            return Ok(());
        }
        let tmp = TempDir::new()?;
        fs::create_dir_all(tmp.path().join(".git/stale"))?;

        let outcome = RepoReset::new(tmp.path(), vcs("git"), false).run("github.com/acme/tool");

        assert!(outcome.is_ok(), "{:?}", outcome.errors);
        assert!(outcome.initialized);
        assert!(!tmp.path().join(".git/stale").exists());
        assert!(tmp.path().join(".git/HEAD").is_file());
        assert!(outcome.remote_error.is_none(), "{:?}", outcome.remote_error);
        assert_eq!(outcome.remote.as_deref(), Some("https://github.com/acme/tool"));
        Ok(())
    }

    #[test]
    fn test_absent_metadata_is_fine() -> anyhow::Result<()> {
        if !git_available("git") {
            return Ok(());
        }
        let tmp = TempDir::new()?;

        let outcome = RepoReset::new(tmp.path(), vcs("git"), false).run("example.org/tool");

        assert_eq!(outcome.metadata, Some(Metadata::Absent));
        assert!(outcome.initialized);
        assert!(outcome.remote.is_none());
        Ok(())
    }
}
