//! Shared test utilities for integration tests
//!
//! Builds small Go module fixtures on disk.

#![allow(dead_code)]

use assert_fs::prelude::*;

pub const OLD: &str = "github.com/old-org/svc";
pub const NEW: &str = "github.com/new-org/svc";

pub const GO_MOD: &str =
    "module github.com/old-org/svc\n\ngo 1.22\n\nrequire github.com/pkg/errors v0.9.1\n";

pub const MAIN_GO: &str = "package main\n\nimport (\n\t\"fmt\"\n\n\t\"github.com/old-org/svc/internal/store\"\n)\n\nfunc main() {\n\tfmt.Println(store.Name)\n}\n";

pub const STORE_GO: &str = "package store\n\n// Name is referenced as github.com/old-org/svc/internal/store.Name\nconst Name = \"store\"\n";

pub const UTIL_GO: &str = "package util\n\nfunc Add(a, b int) int { return a + b }\n";

/// A small module: manifest, nested packages, hidden dirs and non-Go files.
pub fn make_module() -> assert_fs::TempDir
{
    // Initialize the temporary project root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("go.mod")
        .write_str(GO_MOD)
        .expect("write go.mod");
    tmp.child("cmd/svc/main.go")
        .write_str(MAIN_GO)
        .expect("write main.go");
    tmp.child("internal/store/store.go")
        .write_str(STORE_GO)
        .expect("write store.go");
    tmp.child("internal/util/util.go")
        .write_str(UTIL_GO)
        .expect("write util.go");

    // Hidden directories must never be entered
    tmp.child(".cache/gen/gen.go")
        .write_str(MAIN_GO)
        .expect("write cached gen.go");
    tmp.child(".git/hooks/hook.go")
        .write_str(MAIN_GO)
        .expect("write hook.go");

    // Non-source files keep the old path
    tmp.child("README.md")
        .write_str("go get github.com/old-org/svc\n")
        .expect("write README.md");

    // Return the prepared directory to the caller
    tmp
}
