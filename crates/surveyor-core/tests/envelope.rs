// crates/surveyor-core/tests/envelope.rs
// ============================================================================
// Module: Envelope Classification Tests
// Description: Tests for the tagged union over inbound event shapes.
// ============================================================================
//! ## Overview
//! Ensures each supported envelope shape classifies deterministically and
//! unrecognized payloads are rejected.

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
use surveyor_core::InvocationEnvelope;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn tool_call_payload_classifies_as_agent_variant() {
    let payload = json!({
        "parameters": [{"name": "apiid", "value": "abc123"}],
        "actionGroup": "inspection",
        "function": "describe_api",
        "sessionAttributes": {"caller": "console"},
        "promptSessionAttributes": {}
    });
    let envelope = InvocationEnvelope::from_value(payload).expect("classify");
    match envelope {
        InvocationEnvelope::AgentToolCall(event) => {
            assert_eq!(event.parameter("apiid"), Some("abc123"));
            assert_eq!(event.action_group.as_deref(), Some("inspection"));
            assert_eq!(event.function.as_deref(), Some("describe_api"));
        }
        other => panic!("unexpected variant: {}", other.variant_label()),
    }
}

#[test]
fn bare_parameter_list_classifies_as_agent_variant() {
    let payload = json!({"parameters": [{"name": "cluster_name", "value": "prod"}]});
    let envelope = InvocationEnvelope::from_value(payload).expect("classify");
    assert_eq!(envelope.variant_label(), "agent_tool_call");
}

#[test]
fn config_rule_payload_classifies_and_parses_nested_event() {
    let invoking = json!({
        "configurationItem": {
            "resourceType": "AWS::EKS::Cluster",
            "resourceId": "my-cluster",
            "ARN": "arn:aws:eks:us-east-1:123456789012:cluster/my-cluster",
            "configurationItemCaptureTime": "2026-01-05T10:00:00.000Z",
            "tags": {"owner_email": "team@example.com"}
        },
        "messageType": "ConfigurationItemChangeNotification"
    });
    let payload = json!({
        "invokingEvent": invoking.to_string(),
        "resultToken": "token-1"
    });
    let envelope = InvocationEnvelope::from_value(payload).expect("classify");
    match envelope {
        InvocationEnvelope::ConfigRule(event) => {
            assert_eq!(event.result_token.as_deref(), Some("token-1"));
            let parsed = event.parse_invoking_event().expect("nested parse");
            let item = parsed.configuration_item.expect("configuration item");
            assert_eq!(item.resource_type.as_deref(), Some("AWS::EKS::Cluster"));
            assert_eq!(item.resource_id.as_deref(), Some("my-cluster"));
            assert_eq!(
                item.tags.get("owner_email").and_then(|v| v.as_str()),
                Some("team@example.com")
            );
        }
        other => panic!("unexpected variant: {}", other.variant_label()),
    }
}

#[test]
fn malformed_invoking_event_fails_on_nested_parse_only() {
    let payload = json!({"invokingEvent": "{not json", "resultToken": "t"});
    let envelope = InvocationEnvelope::from_value(payload).expect("classify");
    match envelope {
        InvocationEnvelope::ConfigRule(event) => {
            assert!(event.parse_invoking_event().is_err());
        }
        other => panic!("unexpected variant: {}", other.variant_label()),
    }
}

#[test]
fn resource_change_payload_classifies_as_detail_variant() {
    let payload = json!({
        "detail": {"requestParameters": {"restApiId": "abc123"}}
    });
    let envelope = InvocationEnvelope::from_value(payload).expect("classify");
    assert_eq!(envelope.variant_label(), "resource_change");
}

#[test]
fn unrecognized_payload_is_rejected() {
    assert!(InvocationEnvelope::from_value(json!({"unrelated": true})).is_err());
    assert!(InvocationEnvelope::from_value(json!("just a string")).is_err());
    assert!(InvocationEnvelope::from_value(json!({"detail": {"other": 1}})).is_err());
}

#[test]
fn parameter_lookup_is_case_sensitive_and_ordered() {
    let payload = json!({
        "parameters": [
            {"name": "ApiId", "value": "wrong-case"},
            {"name": "apiid", "value": "first"},
            {"name": "apiid", "value": "second"}
        ]
    });
    let envelope = InvocationEnvelope::from_value(payload).expect("classify");
    match envelope {
        InvocationEnvelope::AgentToolCall(event) => {
            assert_eq!(event.parameter("apiid"), Some("first"));
            assert_eq!(event.parameter("APIID"), None);
            assert_eq!(event.parameter("ApiId"), Some("wrong-case"));
        }
        other => panic!("unexpected variant: {}", other.variant_label()),
    }
}
