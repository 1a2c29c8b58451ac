//! Run orchestration: manifest first, then the tree walk and the repository
//! reset side by side.

use std::path::PathBuf;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tracing::{info, instrument, warn};

use crate::cli::{AppContext, Cli};
use crate::core::classify::{LineClassifier, ModulePair};
use crate::core::git::RepoReset;
use crate::core::manifest::locate_and_rewrite;
use crate::core::report::RunReport;
use crate::core::rewrite::FileRewriter;
use crate::infra::config::{Config, load_config};
use crate::infra::walk::{TreeWalker, compile_ignores};

/// One rename invocation.
#[derive(Debug, Clone)]
pub struct RenameRequest {
    pub root: PathBuf,
    pub new_module: String,
    /// Skip the repository reset
    pub keep_git: bool,
    pub dry_run: bool,
}

/// Rewrite the manifest under `req.root`, then walk the tree and reset the
/// repository concurrently. Configuration problems, manifest I/O and a
/// failure to list the root are errors; everything else is in the report.
#[instrument(skip(req, config), fields(root = %req.root.display(), new = %req.new_module))]
pub fn rename(
    req: &RenameRequest,
    config: &Config,
) -> Result<RunReport> {
    if req.new_module.trim().is_empty() {
        anyhow::bail!("New module identifier must not be empty");
    }
    if !req.root.is_dir() {
        anyhow::bail!("Not a directory: {}", req.root.display());
    }
    // Reject bad globs before the manifest is touched
    compile_ignores(&config.walk.ignore_patterns).context("Invalid walk.ignore_patterns")?;

    let manifest = locate_and_rewrite(&req.root, &req.new_module, &config.rewrite, req.dry_run)
        .context("Failed to update module manifest")?;

    let pair = ModulePair::new(manifest.module(), req.new_module.as_str());
    if pair.old == pair.new {
        warn!(module = %pair.old, "old and new identifiers are identical");
    }

    let classifier = LineClassifier::new(pair.clone(), config.rewrite.import_keyword.as_str());
    let rewriter = FileRewriter::new(classifier, config.rewrite.keep_final_newline, req.dry_run);
    let walker = TreeWalker::new(
        rewriter,
        config.rewrite.clone(),
        &config.walk.ignore_patterns,
    )?
    .with_follow_symlinks(config.walk.follow_symlinks);

    let reset = (config.vcs.enabled && !req.keep_git)
        .then(|| RepoReset::new(&req.root, config.vcs.clone(), req.dry_run));

    let (reset_outcome, walk_result) = rayon::join(
        || reset.as_ref().map(|r| r.run(&req.new_module)),
        || walker.walk(&req.root),
    );

    let walk = walk_result.context("Failed to walk source tree")?;
    info!(
        scanned = walk.files_scanned,
        changed = walk.changed.len(),
        failures = walk.failures.len(),
        "walk finished"
    );

    Ok(RunReport {
        manifest: manifest.path.clone(),
        old_module: pair.old,
        new_module: pair.new,
        walk,
        reset: reset_outcome,
        dry_run: req.dry_run,
    })
}

/// CLI entry: load config, rename, print the summary. Fails when any file
/// could not be rewritten.
pub fn run(
    cli: Cli,
    ctx: &AppContext,
) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let (Some(root), Some(new_module)) = (cli.directory, cli.new_module) else {
        anyhow::bail!("directory path and module name are not specified");
    };

    let req = RenameRequest {
        root,
        new_module,
        keep_git: cli.keep_git,
        dry_run: ctx.dry_run,
    };

    let report = rename(&req, &config)?;

    if !ctx.quiet {
        print_summary(&report, ctx);
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} path(s) could not be rewritten",
            report.walk.failures.len()
        );
    }

    Ok(())
}

fn paint(
    text: &str,
    ctx: &AppContext,
    color: fn(&str) -> String,
) -> String {
    if ctx.no_color {
        text.to_string()
    } else {
        color(text)
    }
}

fn green(s: &str) -> String {
    s.green().to_string()
}

fn yellow(s: &str) -> String {
    s.yellow().to_string()
}

fn red(s: &str) -> String {
    s.red().to_string()
}

fn print_summary(
    report: &RunReport,
    ctx: &AppContext,
) {
    if report.dry_run {
        println!("{}", paint("DRY RUN: nothing was written", ctx, yellow));
    }

    println!(
        "{} {} -> {} ({})",
        paint("module", ctx, green),
        report.old_module,
        report.new_module,
        report.manifest.display()
    );

    let walk = &report.walk;
    println!(
        "  {} files scanned, {} changed, {} lines rewritten, {} directories",
        walk.files_scanned,
        walk.changed.len(),
        walk.lines_rewritten,
        walk.dirs_visited
    );
    for path in &walk.changed {
        println!("  {} {}", paint("~", ctx, green), path.display());
    }
    for path in &walk.skipped_dirs {
        println!("  {} {}", paint("skipped", ctx, yellow), path.display());
    }
    for failure in &walk.failures {
        println!(
            "  {} {}: {:#}",
            paint("failed", ctx, red),
            failure.path.display(),
            failure.error
        );
    }

    match &report.reset {
        None => println!("  git: {}", paint("left untouched", ctx, yellow)),
        Some(reset) => {
            for err in &reset.errors {
                println!("  {} {}", paint("git:", ctx, red), err);
            }
            if reset.initialized {
                println!("  git: {}", paint("reinitialized", ctx, green));
            }
            if let Some(url) = &reset.remote {
                println!("  git remote: {url}");
            }
            if let Some(err) = &reset.remote_error {
                println!("  {} {}", paint("git remote:", ctx, yellow), err);
            }
        }
    }
}
