use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Config files probed in the working directory, first hit wins
const CONFIG_PATHS: [&str; 4] = ["remod.toml", "remod.yaml", "remod.json", ".remod.toml"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Naming conventions for manifest and source files
    pub rewrite: RewriteConfig,

    /// Directory traversal settings
    pub walk: WalkConfig,

    /// Version-control reset settings
    pub vcs: VcsConfig,
}

/// Conventions the walker and classifier work with. Defaults describe a Go
/// module (`go.mod`, `*.go`, `import "..."`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig
{
    /// Directory names starting with this character are never entered
    pub hidden_marker: char,

    /// Suffix selecting files to rewrite
    pub source_extension: String,

    /// Suffix selecting the manifest in the root directory
    pub manifest_extension: String,

    /// First token of the manifest declaration line
    pub manifest_keyword: String,

    /// Leading keyword of an import declaration in source files
    pub import_keyword: String,

    /// Re-append a final newline when the original file ended with one
    pub keep_final_newline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig
{
    /// Extra glob patterns (relative to the root) for directories and
    /// source files to skip
    pub ignore_patterns: Vec<String>,

    /// Rewrite symlinked source files through the link
    pub follow_symlinks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsConfig
{
    /// Run the repository reset alongside the rewrite
    pub enabled: bool,

    /// Metadata directory removed before re-initialising
    pub metadata_dir: String,

    /// Host marker that triggers remote configuration
    pub hosted_domain: String,

    /// Name of the remote added for hosted identifiers
    pub remote_name: String,

    /// Version-control executable
    pub git_program: String,
}

impl Default for RewriteConfig
{
    fn default() -> Self
    {
        Self {
            hidden_marker: '.',
            source_extension: ".go".to_string(),
            manifest_extension: ".mod".to_string(),
            manifest_keyword: "module".to_string(),
            import_keyword: "import".to_string(),
            keep_final_newline: true,
        }
    }
}

impl Default for WalkConfig
{
    fn default() -> Self
    {
        Self {
            ignore_patterns: Vec::new(),
            follow_symlinks: true,
        }
    }
}

impl Default for VcsConfig
{
    fn default() -> Self
    {
        Self {
            enabled: true,
            metadata_dir: ".git".to_string(),
            hosted_domain: "github.com".to_string(),
            remote_name: "origin".to_string(),
            git_program: "git".to_string(),
        }
    }
}

impl RewriteConfig
{
    pub fn is_hidden(
        &self,
        name: &str,
    ) -> bool
    {
        name.starts_with(self.hidden_marker)
    }

    pub fn is_source(
        &self,
        name: &str,
    ) -> bool
    {
        name.ends_with(&self.source_extension)
    }

    pub fn is_manifest(
        &self,
        name: &str,
    ) -> bool
    {
        name.ends_with(&self.manifest_extension)
    }
}

/// Load configuration: an explicit file if given, otherwise the first of
/// [`CONFIG_PATHS`] found in the working directory, then `REMOD_*`
/// environment variables (`REMOD_VCS__ENABLED=false`).
pub fn load_config(explicit: Option<&Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    match explicit
    {
        Some(path) =>
        {
            if !path.exists()
            {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            builder = builder.add_source(config::File::from(path));
        }
        None =>
        {
            for path in &CONFIG_PATHS
            {
                if Path::new(path).exists()
                {
                    builder = builder.add_source(config::File::with_name(path));
                    break;
                }
            }
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("REMOD")
            .prefix_separator("_")
            .separator("__"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    if parsed
        .rewrite
        .source_extension
        .is_empty()
        || parsed
            .rewrite
            .manifest_extension
            .is_empty()
    {
        anyhow::bail!("Source and manifest extensions must not be empty");
    }

    Ok(parsed)
}

/// Render the default configuration as TOML (used by `--print-config`).
pub fn default_toml() -> Result<String>
{
    toml::to_string_pretty(&Config::default()).context("Failed to serialize default config")
}
