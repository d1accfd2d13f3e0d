#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Whether a `node` binary is on `PATH`. Tests that need the real sandbox
/// skip themselves without it.
pub fn node_available() -> bool {
    Command::new("node")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

pub fn run_rustdoc_js(args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_rustdoc-js"));
    command.env_remove("RUSTDOC_JS_NODE");
    command.env("RUSTDOC_JS_LOG", "off");
    command.args(args);
    command.output().expect("failed to run rustdoc-js binary")
}

/// Copies the fixture doc bundle into `target`, creating it if needed.
pub fn copy_doc_bundle(target: &Path, version: &str) {
    fs::create_dir_all(target).expect("doc folder should be created");
    for name in ["main", "aliases", "search-index"] {
        let source = fixture_path(&format!("doc/{name}.js"));
        fs::copy(&source, target.join(format!("{name}{version}.js")))
            .expect("fixture copy should succeed");
    }
}

pub fn write_file(folder: &Path, name: &str, content: &str) -> PathBuf {
    let path = folder.join(name);
    fs::write(&path, content).expect("test file write should succeed");
    path
}

pub fn stdout_text(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout should be utf-8")
}

pub fn stderr_text(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).expect("stderr should be utf-8")
}
