//! Validation-only scenarios against the bundled fixture modules
//!
//! These run `init` + `validate` through the real tool and touch no external
//! state. They skip with a notice when the tool is not installed, so the
//! suite stays green on machines without it.

use std::path::{Path, PathBuf};

use groundwork::{Harness, ModuleReference, VALIDATION_SUCCESS_MARKER, tool_available};

fn module_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("modules")
        .join(name)
}

fn validate_module(name: &str) {
    if !tool_available() {
        eprintln!("skipping: provisioning tool not found on PATH");
        return;
    }
    let harness = Harness::new();
    let report = harness
        .validate(&ModuleReference::new(module_dir(name)))
        .unwrap();
    assert!(
        report.raw().contains(VALIDATION_SUCCESS_MARKER),
        "unexpected validation report for {name}: {}",
        report.raw()
    );
}

#[test]
fn network_module_validates() {
    validate_module("network");
}

#[test]
fn cluster_module_validates() {
    validate_module("cluster");
}

#[test]
fn security_module_validates() {
    validate_module("security");
}
