//! Full apply/verify/destroy scenarios against the bundled fixture modules
//!
//! These exercise the complete lifecycle through the real tool: init and
//! apply with the canonical transient-error matchers, output assertions, and
//! explicit teardown. The fixture modules are provider-free, so applying
//! them touches nothing outside the module directory, but the scenarios are
//! still opt-in via `GROUNDWORK_APPLY=1` and skip with a notice when either
//! the flag or the tool is absent.

use std::path::{Path, PathBuf};

use groundwork::{Harness, ModuleReference, RunOptions, apply_enabled, tool_available};

fn module_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("modules")
        .join(name)
}

/// Gate shared by every apply scenario. Returns false (and prints why) when
/// the scenario should be skipped.
fn apply_scenarios_enabled() -> bool {
    if !apply_enabled() {
        eprintln!("skipping: set GROUNDWORK_APPLY=1 to run apply scenarios");
        return false;
    }
    if !tool_available() {
        eprintln!("skipping: provisioning tool not found on PATH");
        return false;
    }
    true
}

#[test]
fn network_module_provisions_and_exposes_subnets() {
    if !apply_scenarios_enabled() {
        return;
    }

    let harness = Harness::new();
    let opts = RunOptions::new(ModuleReference::new(module_dir("network")))
        .var("vpc_cidr", "10.0.0.0/16")
        .var("vpc_name", "test-vpc")
        .var("region", "us-east-1")
        .var("azs", vec!["us-east-1a", "us-east-1b"])
        .var("private_subnets", vec!["10.0.1.0/24", "10.0.2.0/24"])
        .var("public_subnets", vec!["10.0.101.0/24", "10.0.102.0/24"])
        .with_default_retryable_errors();

    let deployment = harness.apply(&opts).unwrap();

    let vpc_id = deployment.output("vpc_id").unwrap();
    assert!(!vpc_id.is_empty());

    let private = deployment.output_list("private_subnet_ids").unwrap();
    assert_eq!(private.len(), 2);
    let public = deployment.output_list("public_subnet_ids").unwrap();
    assert_eq!(public.len(), 2);

    deployment.destroy().unwrap();
}

#[test]
fn cluster_module_provisions_cluster_and_service() {
    if !apply_scenarios_enabled() {
        return;
    }

    let harness = Harness::new();
    let opts = RunOptions::new(ModuleReference::new(module_dir("cluster")))
        .var("name_prefix", "test")
        .var("environment", "dev")
        .var("vpc_id", "dummy-vpc-id")
        .var("subnet_ids", vec!["subnet-1", "subnet-2"])
        .var("container_image", "nginx:latest")
        .var("container_port", 80i64)
        .var("desired_count", 1i64)
        .var("region", "us-east-1")
        .with_default_retryable_errors();

    let deployment = harness.apply(&opts).unwrap();

    let cluster_arn = deployment.output("cluster_arn").unwrap();
    assert!(cluster_arn.contains("test-dev-cluster"), "got: {cluster_arn}");
    let service_arn = deployment.output("service_arn").unwrap();
    assert!(service_arn.contains("test-dev-service"), "got: {service_arn}");

    deployment.destroy().unwrap();
}

#[test]
fn security_module_provisions_a_group() {
    if !apply_scenarios_enabled() {
        return;
    }

    let harness = Harness::new();
    let opts = RunOptions::new(ModuleReference::new(module_dir("security")))
        .var("vpc_id", "dummy-vpc-id")
        .var("name_prefix", "test")
        .var("environment", "dev")
        .var("allowed_cidr_blocks", vec!["10.0.0.0/8"])
        .with_default_retryable_errors();

    let deployment = harness.apply(&opts).unwrap();

    let group_id = deployment.output("security_group_id").unwrap();
    assert!(group_id.starts_with("sg-"), "got: {group_id}");

    deployment.destroy().unwrap();
}
