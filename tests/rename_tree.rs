//! End-to-end tests of `remod::rename` on fixture modules (no git involved).

use std::fs;
use std::path::Path;

use anyhow::Result;
use assert_fs::prelude::*;
use remod::{Config, RenameRequest, rename};

mod util;
use util::{GO_MOD, MAIN_GO, NEW, OLD, STORE_GO, UTIL_GO, make_module};

fn no_git() -> Config
{
    let mut config = Config::default();
    config.vcs.enabled = false;
    config
}

fn request(
    root: &Path,
    new_module: &str,
) -> RenameRequest
{
    RenameRequest {
        root: root.to_path_buf(),
        new_module: new_module.to_string(),
        keep_git: false,
        dry_run: false,
    }
}

fn read(
    root: &Path,
    rel: &str,
) -> String
{
    fs::read_to_string(root.join(rel)).expect("read fixture file")
}

#[test]
fn test_manifest_and_sources_rewritten() -> Result<()>
{
    let tmp = make_module();
    let root = tmp.path();

    let report = rename(&request(root, NEW), &no_git())?;

    assert!(report.is_success());
    assert_eq!(report.old_module, OLD);
    assert_eq!(report.manifest, root.join("go.mod"));

    // Manifest: declaration swapped, every other line byte-identical
    assert_eq!(read(root, "go.mod"), GO_MOD.replacen(OLD, NEW, 1));

    assert_eq!(read(root, "cmd/svc/main.go"), MAIN_GO.replace(OLD, NEW));
    assert_eq!(read(root, "internal/store/store.go"), STORE_GO.replace(OLD, NEW));
    Ok(())
}

#[test]
fn test_untouched_files_are_not_written() -> Result<()>
{
    let tmp = make_module();
    let root = tmp.path();

    let report = rename(&request(root, NEW), &no_git())?;

    // main.go and store.go change; util.go has no occurrence
    assert_eq!(report.walk.files_scanned, 3);
    assert_eq!(report.walk.files_written, 2);
    assert_eq!(report.walk.lines_rewritten, 2);
    assert!(
        !report
            .walk
            .changed
            .contains(&root.join("internal/util/util.go"))
    );
    assert_eq!(read(root, "internal/util/util.go"), UTIL_GO);
    Ok(())
}

#[test]
fn test_hidden_directories_and_other_files_untouched() -> Result<()>
{
    let tmp = make_module();
    let root = tmp.path();

    rename(&request(root, NEW), &no_git())?;

    assert_eq!(read(root, ".cache/gen/gen.go"), MAIN_GO);
    assert_eq!(read(root, ".git/hooks/hook.go"), MAIN_GO);
    assert_eq!(read(root, "README.md"), "go get github.com/old-org/svc\n");
    Ok(())
}

#[test]
fn test_second_run_with_same_pair_changes_nothing() -> Result<()>
{
    let tmp = make_module();
    let root = tmp.path();

    rename(&request(root, NEW), &no_git())?;
    let after_first = read(root, "cmd/svc/main.go");

    // Manifest now declares NEW, so the second run maps NEW -> NEW
    let report = rename(&request(root, NEW), &no_git())?;

    assert_eq!(report.old_module, NEW);
    assert_eq!(report.walk.files_written, 0);
    assert!(
        report
            .walk
            .changed
            .is_empty()
    );
    assert_eq!(read(root, "cmd/svc/main.go"), after_first);
    Ok(())
}

#[test]
fn test_missing_manifest_aborts_before_sources() -> Result<()>
{
    let tmp = assert_fs::TempDir::new()?;
    tmp.child("main.go")
        .write_str(MAIN_GO)?;
    tmp.child("sub/go.mod")
        .write_str(GO_MOD)?;

    let err = rename(&request(tmp.path(), NEW), &no_git()).unwrap_err();

    assert!(format!("{err:#}").contains("no file ending in `.mod`"));
    assert_eq!(read(tmp.path(), "main.go"), MAIN_GO);
    assert_eq!(read(tmp.path(), "sub/go.mod"), GO_MOD);
    Ok(())
}

#[test]
fn test_malformed_manifest_aborts() -> Result<()>
{
    let tmp = assert_fs::TempDir::new()?;
    tmp.child("go.mod")
        .write_str("module\n\ngo 1.22\n")?;
    tmp.child("main.go")
        .write_str(MAIN_GO)?;

    let err = rename(&request(tmp.path(), NEW), &no_git()).unwrap_err();

    assert!(format!("{err:#}").contains("has no identifier"));
    assert_eq!(read(tmp.path(), "main.go"), MAIN_GO);
    Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> Result<()>
{
    let tmp = make_module();
    let root = tmp.path();

    let mut req = request(root, NEW);
    req.dry_run = true;
    let report = rename(&req, &no_git())?;

    assert!(report.dry_run);
    assert_eq!(report.walk.changed.len(), 2);
    assert_eq!(report.walk.files_written, 0);
    assert_eq!(read(root, "go.mod"), GO_MOD);
    assert_eq!(read(root, "cmd/svc/main.go"), MAIN_GO);
    Ok(())
}

#[test]
fn test_unreadable_file_is_reported_and_walk_continues() -> Result<()>
{
    let tmp = make_module();
    let root = tmp.path();

    let mut bad = b"package bad\n\nimport \"github.com/old-org/svc/x\"\n".to_vec();
    bad.push(0xfe);
    fs::create_dir_all(root.join("bad"))?;
    fs::write(root.join("bad/bad.go"), &bad)?;

    let report = rename(&request(root, NEW), &no_git())?;

    assert!(!report.is_success());
    assert_eq!(report.walk.failures.len(), 1);
    assert_eq!(report.walk.failures[0].path, root.join("bad/bad.go"));
    // the rest of the tree is still rewritten
    assert_eq!(read(root, "cmd/svc/main.go"), MAIN_GO.replace(OLD, NEW));
    assert_eq!(fs::read(root.join("bad/bad.go"))?, bad);
    Ok(())
}

#[test]
fn test_custom_conventions_from_config() -> Result<()>
{
    let tmp = assert_fs::TempDir::new()?;
    tmp.child("pkg.manifest")
        .write_str("package acme/old\n")?;
    tmp.child("src/a.src")
        .write_str("use \"acme/old/a\"\n")?;
    tmp.child("src/a.go")
        .write_str("import \"acme/old/a\"\n")?;
    tmp.child("_skip/b.src")
        .write_str("use \"acme/old/b\"\n")?;

    let mut config = no_git();
    config.rewrite.manifest_extension = ".manifest".to_string();
    config.rewrite.manifest_keyword = "package".to_string();
    config.rewrite.source_extension = ".src".to_string();
    config.rewrite.import_keyword = "use".to_string();
    config.rewrite.hidden_marker = '_';

    let report = rename(&request(tmp.path(), "acme/new"), &config)?;

    assert_eq!(report.old_module, "acme/old");
    assert_eq!(read(tmp.path(), "pkg.manifest"), "package acme/new\n");
    assert_eq!(read(tmp.path(), "src/a.src"), "use \"acme/new/a\"\n");
    assert_eq!(read(tmp.path(), "src/a.go"), "import \"acme/old/a\"\n");
    assert_eq!(read(tmp.path(), "_skip/b.src"), "use \"acme/old/b\"\n");
    Ok(())
}

#[test]
fn test_wide_tree_is_fully_rewritten() -> Result<()>
{
    let tmp = assert_fs::TempDir::new()?;
    tmp.child("go.mod")
        .write_str("module old/wide\n")?;

    // Enough directories to spread over the rayon pool
    for i in 0..12
    {
        for j in 0..4
        {
            tmp.child(format!("p{i}/q{j}/f.go"))
                .write_str("package q\n\nimport \"old/wide/base\"\n\nvar _ = old/wide.X\n")?;
        }
    }

    let report = rename(&request(tmp.path(), "new/wide"), &no_git())?;

    assert_eq!(report.walk.files_written, 48);
    assert_eq!(report.walk.lines_rewritten, 96);
    assert_eq!(report.walk.dirs_visited, 1 + 12 + 48);
    assert_eq!(
        read(tmp.path(), "p7/q3/f.go"),
        "package q\n\nimport \"new/wide/base\"\n\nvar _ = new/wide.X\n"
    );
    Ok(())
}
