// crates/surveyor-config/tests/config_validation.rs
// ============================================================================
// Module: Config Validation Tests
// Description: Fail-closed validation and file loading tests.
// ============================================================================
//! ## Overview
//! Exercises the documented rejection rules: empty parameter names, empty
//! resource type allow-lists for config-rule kinds, out-of-range page
//! limits, notification without a sender, and oversized or non-UTF-8
//! config files.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use surveyor_config::ConfigError;
use surveyor_config::InspectorKind;
use surveyor_config::SurveyorConfig;
use tempfile::TempDir;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Parses a TOML string into a config without validating it.
fn parse(toml_str: &str) -> SurveyorConfig {
    toml::from_str(toml_str).expect("parse")
}

/// Asserts that validation fails with a message containing `needle`.
fn assert_invalid(config: &SurveyorConfig, needle: &str) {
    let error = config.validate().expect_err("expected invalid config");
    let message = error.to_string();
    assert!(message.contains(needle), "error {message} did not contain {needle}");
}

/// A valid endpoint inspector config used as the mutation baseline.
fn endpoint_config() -> SurveyorConfig {
    parse(
        r#"
[inspector]
kind = "endpoint"
parameter_name = "ApiId"
supported_resource_types = ["AWS::ApiGateway::RestApi"]
"#,
    )
}

// ============================================================================
// SECTION: Validation Tests
// ============================================================================

#[test]
fn empty_parameter_name_is_rejected() {
    let mut config = endpoint_config();
    config.inspector.parameter_name = "  ".to_string();
    assert_invalid(&config, "inspector.parameter_name must be non-empty");
}

#[test]
fn config_rule_kinds_require_an_allow_list() {
    let mut config = endpoint_config();
    config.inspector.supported_resource_types.clear();
    assert_invalid(&config, "supported_resource_types must list at least one type");

    let cluster = parse(
        r#"
[inspector]
kind = "cluster"
parameter_name = "ClusterName"
"#,
    );
    assert_invalid(&cluster, "supported_resource_types must list at least one type");
}

#[test]
fn agent_only_kinds_accept_an_empty_allow_list() {
    let account = parse(
        r#"
[inspector]
kind = "account"
parameter_name = "Region"
"#,
    );
    account.validate().expect("valid");
    assert_eq!(account.inspector.kind, InspectorKind::Account);

    let definition = parse(
        r#"
[inspector]
kind = "definition"
parameter_name = "ApiId"
"#,
    );
    definition.validate().expect("valid");
}

#[test]
fn blank_allow_list_entries_are_rejected() {
    let mut config = endpoint_config();
    config.inspector.supported_resource_types.push(" ".to_string());
    assert_invalid(&config, "supported_resource_types entries must be non-empty");
}

#[test]
fn page_limit_bounds_are_enforced() {
    let mut config = endpoint_config();
    config.enrichment.page_limit = 0;
    assert_invalid(&config, "enrichment.page_limit must be between 1 and 500");

    config.enrichment.page_limit = 501;
    assert_invalid(&config, "enrichment.page_limit must be between 1 and 500");

    config.enrichment.page_limit = 500;
    config.validate().expect("valid");
}

#[test]
fn notify_requires_a_sender_when_enabled() {
    let mut config = endpoint_config();
    config.notify.enabled = true;
    assert_invalid(&config, "notify.sender must be set when notify.enabled is true");

    config.notify.sender = Some("  ".to_string());
    assert_invalid(&config, "notify.sender must be set when notify.enabled is true");

    config.notify.sender = Some("inspector@example.com".to_string());
    config.validate().expect("valid");
}

#[test]
fn aws_overrides_are_checked_when_present() {
    let mut config = endpoint_config();
    config.aws.region = Some(" ".to_string());
    assert_invalid(&config, "aws.region must be non-empty when set");

    config.aws.region = Some("eu-west-1".to_string());
    config.aws.endpoint_url = Some("localhost:4566".to_string());
    assert_invalid(&config, "aws.endpoint_url must be an http or https URL");

    config.aws.endpoint_url = Some("http://localhost:4566".to_string());
    config.validate().expect("valid");
}

// ============================================================================
// SECTION: Loading Tests
// ============================================================================

#[test]
fn load_reads_and_validates_a_file() {
    let temp = TempDir::new().expect("tempdir");
    let config_path = temp.path().join("surveyor.toml");
    let content = r#"
[aws]
region = "us-east-1"

[inspector]
kind = "cluster"
parameter_name = "ClusterName"
supported_resource_types = ["AWS::EKS::Cluster"]

[notify]
enabled = true
sender = "inspector@example.com"

[audit]
sink = "noop"
"#;
    std::fs::write(&config_path, content.as_bytes()).expect("write");

    let config = SurveyorConfig::load(Some(&config_path)).expect("load");

    assert_eq!(config.inspector.kind, InspectorKind::Cluster);
    assert_eq!(config.aws.region.as_deref(), Some("us-east-1"));
    assert!(config.notify.enabled);
}

#[test]
fn load_rejects_invalid_content_with_a_validation_error() {
    let temp = TempDir::new().expect("tempdir");
    let config_path = temp.path().join("surveyor.toml");
    let content = r#"
[inspector]
kind = "endpoint"
parameter_name = ""
supported_resource_types = ["AWS::ApiGateway::RestApi"]
"#;
    std::fs::write(&config_path, content.as_bytes()).expect("write");

    let error = SurveyorConfig::load(Some(&config_path)).expect_err("invalid");
    assert!(matches!(error, ConfigError::Invalid(_)));
}

#[test]
fn load_rejects_files_that_are_not_utf8() {
    let temp = TempDir::new().expect("tempdir");
    let config_path = temp.path().join("surveyor.toml");
    std::fs::write(&config_path, [0x80, 0xFF, 0x00]).expect("write");

    let error = SurveyorConfig::load(Some(&config_path)).expect_err("invalid");
    assert!(error.to_string().contains("utf-8"));
}

#[test]
fn load_rejects_oversized_files() {
    let temp = TempDir::new().expect("tempdir");
    let config_path = temp.path().join("surveyor.toml");
    let padding = format!("# {}\n", "x".repeat(2 * 1024 * 1024));
    std::fs::write(&config_path, padding.as_bytes()).expect("write");

    let error = SurveyorConfig::load(Some(&config_path)).expect_err("invalid");
    assert!(error.to_string().contains("size limit"));
}

#[test]
fn load_reports_missing_files_as_io_errors() {
    let temp = TempDir::new().expect("tempdir");
    let config_path = temp.path().join("absent.toml");

    let error = SurveyorConfig::load(Some(&config_path)).expect_err("missing");
    assert!(matches!(error, ConfigError::Io(_)));
}

#[test]
fn load_reports_malformed_toml_as_parse_errors() {
    let temp = TempDir::new().expect("tempdir");
    let config_path = temp.path().join("surveyor.toml");
    std::fs::write(&config_path, b"[inspector\nkind =").expect("write");

    let error = SurveyorConfig::load(Some(&config_path)).expect_err("malformed");
    assert!(matches!(error, ConfigError::Parse(_)));
}
