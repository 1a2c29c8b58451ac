//! Module manifest lookup and rewrite.
//!
//! The manifest is looked up only in the root directory itself. Entries are
//! examined in name order; the first file ending in the manifest extension
//! wins and any others are ignored. Its declaration line is
//! `<keyword> <identifier> ...`, and the second whitespace-separated token is
//! the module identifier.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::infra::config::RewriteConfig;
use crate::infra::io::split_lines;

/// Manifest failures. All of them abort the run before any source file is touched.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no file ending in `{extension}` found in {dir}")]
    NotFound { dir: PathBuf, extension: String },
    #[error("no `{keyword}` declaration in {path}")]
    MissingDeclaration { path: PathBuf, keyword: String },
    #[error("`{keyword}` declaration on line {line} of {path} has no identifier")]
    MalformedDeclaration {
        path: PathBuf,
        keyword: String,
        line: usize,
    },
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

/// A parsed manifest, holding its text and the declaration it was read from.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    content: String,
    /// Zero-based index of the declaration line
    decl_line: usize,
    /// Byte offset of the identifier token within the declaration line
    token_start: usize,
    /// The identifier token, exactly as split from the declaration line
    module: String,
}

impl Manifest {
    /// Parse manifest text, locating the declaration line.
    pub fn parse(path: PathBuf, content: String, keyword: &str) -> Result<Self, ManifestError> {
        let found = split_lines(&content)
            .into_iter()
            .enumerate()
            .find(|(_, line)| line.split_whitespace().next() == Some(keyword))
            .map(|(idx, line)| (idx, identifier_token(line, keyword)));

        match found {
            None => Err(ManifestError::MissingDeclaration {
                path,
                keyword: keyword.to_string(),
            }),
            Some((idx, None)) => Err(ManifestError::MalformedDeclaration {
                path,
                keyword: keyword.to_string(),
                line: idx + 1,
            }),
            Some((decl_line, Some((token_start, module)))) => Ok(Self {
                path,
                content,
                decl_line,
                token_start,
                module,
            }),
        }
    }

    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path, keyword: &str) -> Result<Self, ManifestError> {
        let bytes = fs::read(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8(bytes).map_err(|_| ManifestError::NotUtf8 {
            path: path.to_path_buf(),
        })?;
        Self::parse(path.to_path_buf(), content, keyword)
    }

    /// The current module identifier.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Manifest text with the identifier token on the declaration line
    /// replaced by `new_module`. Every other line, terminator included, is
    /// carried over byte for byte; only the final newline follows
    /// `keep_final_newline`.
    pub fn rewritten(&self, new_module: &str, keep_final_newline: bool) -> String {
        let mut out = String::with_capacity(self.content.len() + new_module.len());

        // Same segmentation as `split_lines`, so `decl_line` indexes it
        for (idx, line) in self.content.split_inclusive('\n').enumerate() {
            if idx == self.decl_line {
                let end = self.token_start + self.module.len();
                out.push_str(&line[..self.token_start]);
                out.push_str(new_module);
                out.push_str(&line[end..]);
            } else {
                out.push_str(line);
            }
        }

        if !keep_final_newline && out.ends_with('\n') {
            out.pop();
            if out.ends_with('\r') {
                out.pop();
            }
        }

        out
    }

    /// Write the rewritten manifest back. Always writes, even when the
    /// identifier is unchanged.
    pub fn write(&self, new_module: &str, keep_final_newline: bool) -> Result<(), ManifestError> {
        fs::write(&self.path, self.rewritten(new_module, keep_final_newline)).map_err(|source| {
            ManifestError::Write {
                path: self.path.clone(),
                source,
            }
        })
    }
}

/// Offset and text of the token following `keyword` on a declaration line.
fn identifier_token(line: &str, keyword: &str) -> Option<(usize, String)> {
    let after_keyword = (line.len() - line.trim_start().len()) + keyword.len();
    let rest = &line[after_keyword..];
    let token = rest.split_whitespace().next()?;
    let start = after_keyword + (rest.len() - rest.trim_start().len());
    Some((start, token.to_string()))
}

/// Find the first manifest file directly inside `dir`.
pub fn find_manifest(dir: &Path, conventions: &RewriteConfig) -> Result<PathBuf, ManifestError> {
    let read_dir = |source| ManifestError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir)? {
        let entry = entry.map_err(read_dir)?;
        let is_file = entry.file_type().map(|ft| !ft.is_dir()).unwrap_or(false);
        let name = entry.file_name();
        if is_file && conventions.is_manifest(&name.to_string_lossy()) {
            candidates.push(entry.path());
        }
    }
    candidates.sort();

    let mut candidates = candidates.into_iter();
    let first = candidates.next().ok_or_else(|| ManifestError::NotFound {
        dir: dir.to_path_buf(),
        extension: conventions.manifest_extension.clone(),
    })?;

    for ignored in candidates {
        debug!(path = %ignored.display(), "ignoring additional manifest");
    }

    Ok(first)
}

/// Locate the manifest in `dir`, extract the old identifier and install
/// `new_module` in one pass. With `dry_run` the file is left as is.
#[instrument(skip(dir, conventions), fields(dir = %dir.display()))]
pub fn locate_and_rewrite(
    dir: &Path,
    new_module: &str,
    conventions: &RewriteConfig,
    dry_run: bool,
) -> Result<Manifest, ManifestError> {
    let path = find_manifest(dir, conventions)?;
    info!(path = %path.display(), "found manifest");

    let manifest = Manifest::load(&path, &conventions.manifest_keyword)?;
    info!(old = manifest.module(), new = new_module, "module identifier");

    if dry_run {
        debug!(path = %path.display(), "dry run: manifest left untouched");
    } else {
        manifest.write(new_module, conventions.keep_final_newline)?;
        info!(path = %path.display(), "manifest rewritten");
    }

    Ok(manifest)
}
