// crates/surveyor-core/tests/extraction.rs
// ============================================================================
// Module: Target Extraction Tests
// Description: Tests for the declarative extractor across envelope variants.
// ============================================================================
//! ## Overview
//! Exercises key extraction from tool calls, Config rule invocations, and
//! resource-change envelopes, including skip and failure paths.

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

use serde_json::json;
use surveyor_core::ConfigKeySource;
use surveyor_core::ExtractError;
use surveyor_core::Extraction;
use surveyor_core::ExtractorSpec;
use surveyor_core::InvocationEnvelope;
use surveyor_core::TargetOrigin;
use surveyor_core::extract_target;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Builds a spec matching the REST API aggregator's wiring.
fn api_spec() -> ExtractorSpec {
    ExtractorSpec {
        parameter_name: "apiid".to_string(),
        region_parameter: Some("region".to_string()),
        supported_resource_types: vec!["AWS::ApiGateway::RestApi".to_string()],
        key_source: ConfigKeySource::ResourceId,
        request_parameter_names: vec!["restApiId".to_string(), "resourceArn".to_string()],
    }
}

/// Classifies a raw payload, panicking on unrecognized shapes.
fn envelope(payload: serde_json::Value) -> InvocationEnvelope {
    InvocationEnvelope::from_value(payload).expect("classify")
}

/// Builds a Config rule payload around one configuration item.
fn config_payload(item: serde_json::Value) -> serde_json::Value {
    let invoking = json!({
        "configurationItem": item,
        "messageType": "ConfigurationItemChangeNotification"
    });
    json!({"invokingEvent": invoking.to_string(), "resultToken": "tok"})
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn tool_call_yields_direct_target_with_region() {
    let event = envelope(json!({
        "parameters": [
            {"name": "apiid", "value": "abc123"},
            {"name": "region", "value": "eu-west-1"}
        ]
    }));
    let extraction = extract_target(&event, &api_spec()).expect("extract");
    match extraction {
        Extraction::Target(target) => {
            assert_eq!(target.key.as_str(), "abc123");
            assert_eq!(target.region.as_deref(), Some("eu-west-1"));
            assert_eq!(target.origin, TargetOrigin::Direct);
        }
        Extraction::NotApplicable(skip) => panic!("unexpected skip: {}", skip.reason),
    }
}

#[test]
fn tool_call_without_required_parameter_fails() {
    let event = envelope(json!({
        "parameters": [{"name": "other", "value": "x"}]
    }));
    let error = extract_target(&event, &api_spec()).expect_err("missing parameter");
    match error {
        ExtractError::MissingParameter(name) => assert_eq!(name, "apiid"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn tool_call_with_empty_value_counts_as_missing() {
    let event = envelope(json!({
        "parameters": [{"name": "apiid", "value": ""}]
    }));
    assert!(matches!(
        extract_target(&event, &api_spec()),
        Err(ExtractError::MissingParameter(_))
    ));
}

#[test]
fn supported_config_item_yields_scoped_target() {
    let event = envelope(config_payload(json!({
        "resourceType": "AWS::ApiGateway::RestApi",
        "resourceId": "abc123",
        "ARN": "arn:aws:apigateway:us-east-1::/restapis/abc123",
        "configurationItemCaptureTime": "2026-01-05T10:00:00.000Z",
        "tags": {"owner_email": "team@example.com"}
    })));
    let extraction = extract_target(&event, &api_spec()).expect("extract");
    match extraction {
        Extraction::Target(target) => {
            assert_eq!(target.key.as_str(), "abc123");
            let scope = target.config_scope().expect("config scope");
            assert_eq!(scope.resource_type, "AWS::ApiGateway::RestApi");
            assert_eq!(
                scope.capture_time.as_deref(),
                Some("2026-01-05T10:00:00.000Z")
            );
        }
        Extraction::NotApplicable(skip) => panic!("unexpected skip: {}", skip.reason),
    }
}

#[test]
fn unsupported_resource_type_is_skipped_with_scope() {
    let event = envelope(config_payload(json!({
        "resourceType": "AWS::EC2::Instance",
        "resourceId": "i-0abc",
        "ARN": "arn:aws:ec2:us-east-1:123456789012:instance/i-0abc"
    })));
    match extract_target(&event, &api_spec()).expect("extract") {
        Extraction::NotApplicable(skip) => {
            assert!(skip.reason.contains("AWS::EC2::Instance"));
            let scope = skip.scope.expect("scope preserved for evaluation");
            assert_eq!(scope.resource_id, "i-0abc");
        }
        Extraction::Target(target) => panic!("unexpected target: {}", target.key),
    }
}

#[test]
fn config_event_without_item_is_skipped_without_scope() {
    let invoking = json!({"messageType": "OversizedConfigurationItemChangeNotification"});
    let event = envelope(json!({
        "invokingEvent": invoking.to_string(),
        "resultToken": "tok"
    }));
    match extract_target(&event, &api_spec()).expect("extract") {
        Extraction::NotApplicable(skip) => assert!(skip.scope.is_none()),
        Extraction::Target(target) => panic!("unexpected target: {}", target.key),
    }
}

#[test]
fn malformed_invoking_event_is_an_envelope_error() {
    let event = envelope(json!({"invokingEvent": "{broken", "resultToken": "tok"}));
    assert!(matches!(
        extract_target(&event, &api_spec()),
        Err(ExtractError::Envelope(_))
    ));
}

#[test]
fn arn_tail_key_source_takes_final_segment() {
    let mut spec = api_spec();
    spec.supported_resource_types = vec!["AWS::EKS::Cluster".to_string()];
    spec.key_source = ConfigKeySource::ArnTail;
    let event = envelope(config_payload(json!({
        "resourceType": "AWS::EKS::Cluster",
        "resourceId": "irrelevant-id",
        "ARN": "arn:aws:eks:us-east-1:123456789012:cluster/prod-cluster"
    })));
    match extract_target(&event, &spec).expect("extract") {
        Extraction::Target(target) => assert_eq!(target.key.as_str(), "prod-cluster"),
        Extraction::NotApplicable(skip) => panic!("unexpected skip: {}", skip.reason),
    }
}

#[test]
fn resource_change_tries_parameter_names_in_order() {
    let event = envelope(json!({
        "detail": {
            "requestParameters": {
                "resourceArn": "arn:aws:apigateway:us-east-1::/restapis/second",
                "restApiId": "first"
            }
        }
    }));
    match extract_target(&event, &api_spec()).expect("extract") {
        Extraction::Target(target) => {
            assert_eq!(target.key.as_str(), "first");
            assert_eq!(target.origin, TargetOrigin::ResourceChange);
        }
        Extraction::NotApplicable(skip) => panic!("unexpected skip: {}", skip.reason),
    }
}

#[test]
fn resource_change_accepts_numeric_parameter_values() {
    let mut spec = api_spec();
    spec.request_parameter_names = vec!["deploymentId".to_string()];
    let event = envelope(json!({
        "detail": {"requestParameters": {"deploymentId": 42}}
    }));
    match extract_target(&event, &spec).expect("extract") {
        Extraction::Target(target) => assert_eq!(target.key.as_str(), "42"),
        Extraction::NotApplicable(skip) => panic!("unexpected skip: {}", skip.reason),
    }
}

#[test]
fn resource_change_without_any_named_parameter_fails() {
    let event = envelope(json!({
        "detail": {"requestParameters": {"unrelated": "value"}}
    }));
    let error = extract_target(&event, &api_spec()).expect_err("missing parameters");
    match error {
        ExtractError::MissingParameter(missing) => {
            assert_eq!(missing, "restApiId, resourceArn");
        }
        other => panic!("unexpected error: {other}"),
    }
}
