use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // --quiet
    pub no_color: bool, // --no-color
    pub dry_run: bool,  // --dry-run
}

#[derive(Debug, Parser)]
#[command(name = "remod")]
#[command(
    about = "Rewrite a module's import path across a source tree and reinitialize its git history"
)]
#[command(version, long_about = None)]
pub struct Cli {
    /// Root directory of the module (must contain the manifest, e.g. go.mod)
    #[arg(required_unless_present = "print_config")]
    pub directory: Option<PathBuf>,

    /// New module identifier (e.g. github.com/acme/tool)
    #[arg(required_unless_present = "print_config")]
    pub new_module: Option<String>,

    /// Leave version-control metadata alone
    #[arg(long)]
    pub keep_git: bool,

    /// Read configuration from this file instead of ./remod.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Suppress the summary and informational logs
    #[arg(long)]
    pub quiet: bool,

    /// Show what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    pub fn context(&self) -> AppContext {
        AppContext {
            quiet: self.quiet,
            no_color: self.no_color,
            dry_run: self.dry_run,
        }
    }

    /// Log filter directive implied by the verbosity flags.
    pub fn log_directive(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "remod=warn",
            (false, 0) => "remod=info",
            (false, 1) => "remod=debug",
            (false, _) => "remod=trace",
        }
    }
}
