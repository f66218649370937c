//! Shared test utilities for integration tests
//!
//! Builds a throwaway CPython-like source tree and a preconfigured
//! command for the `dialang` binary.

use assert_cmd::Command;
use assert_fs::prelude::*;

/// Grammar excerpt copied into every fixture tree
pub const GRAMMAR: &str = include_str!("fixtures/python.gram");

/// Create `<tmp>/cpython/Grammar/python.gram` from the fixture grammar
pub fn make_source_tree() -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("cpython/Grammar/python.gram")
        .write_str(GRAMMAR)
        .expect("write grammar");

    tmp
}

/// `dialang` running inside `tmp`, isolated from the caller's environment
pub fn dialang(tmp: &assert_fs::TempDir) -> Command
{
    let mut cmd = Command::cargo_bin("dialang").expect("dialang binary");
    cmd.current_dir(tmp.path())
        .env_remove("RUST_LOG")
        .env_remove("DIALANG_SOURCE_ROOT")
        .env_remove("DIALANG_GRAMMAR_PATH")
        .env_remove("DIALANG_CHANGELOG");
    cmd
}

/// Read the fixture tree's grammar file back
pub fn grammar_text(tmp: &assert_fs::TempDir) -> String
{
    std::fs::read_to_string(tmp.path().join("cpython/Grammar/python.gram")).expect("read grammar")
}
