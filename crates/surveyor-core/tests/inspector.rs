// crates/surveyor-core/tests/inspector.rs
// ============================================================================
// Module: Inspector Pipeline Tests
// Description: End-to-end tests over extraction, collection, and formatting.
// ============================================================================
//! ## Overview
//! Drives whole invocations through [`Inspector::handle_value`] and checks
//! that every caller receives a well-formed envelope, including on skip and
//! error paths.

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

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use serde_json::json;
use surveyor_core::AggregationPlan;
use surveyor_core::AggregationTarget;
use surveyor_core::AuditSink;
use surveyor_core::ConfigKeySource;
use surveyor_core::ExtractorSpec;
use surveyor_core::FetchError;
use surveyor_core::FieldFailureEvent;
use surveyor_core::FieldFetcher;
use surveyor_core::Inspector;
use surveyor_core::InspectorConfig;
use surveyor_core::InvocationOutcomeEvent;
use surveyor_core::NoopAuditSink;
use surveyor_core::ReportCompletenessPolicy;
use surveyor_core::ResponseOptions;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Fetcher that always returns a fixed value.
struct StaticFetcher(Value);

#[async_trait]
impl FieldFetcher for StaticFetcher {
    async fn fetch(&self, _target: &AggregationTarget) -> Result<Value, FetchError> {
        Ok(self.0.clone())
    }
}

/// Fetcher that always fails with a service error.
struct ErroringFetcher(&'static str);

#[async_trait]
impl FieldFetcher for ErroringFetcher {
    async fn fetch(&self, _target: &AggregationTarget) -> Result<Value, FetchError> {
        Err(FetchError::Service(self.0.to_string()))
    }
}

/// Audit sink that records invocation-outcome labels.
#[derive(Default)]
struct OutcomeSink {
    outcomes: Mutex<Vec<(String, String)>>,
}

impl AuditSink for OutcomeSink {
    fn record_field_failure(&self, _event: &FieldFailureEvent) {}

    fn record_invocation(&self, event: &InvocationOutcomeEvent) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push((event.variant.to_string(), event.outcome.to_string()));
        }
    }
}

/// Builds the REST API extractor spec used across these tests.
fn api_spec() -> ExtractorSpec {
    ExtractorSpec {
        parameter_name: "apiid".to_string(),
        region_parameter: None,
        supported_resource_types: vec!["AWS::ApiGateway::RestApi".to_string()],
        key_source: ConfigKeySource::ResourceId,
        request_parameter_names: vec!["restApiId".to_string()],
    }
}

/// Builds an inspector over the given plan with a completeness policy.
fn inspector(plan: AggregationPlan, audit: Box<dyn AuditSink>) -> Inspector {
    let config = InspectorConfig {
        extractor: api_spec(),
        options: ResponseOptions::default(),
    };
    Inspector::new(config, plan, Box::new(ReportCompletenessPolicy), audit)
}

/// Two-step plan where every fetch succeeds.
fn healthy_plan() -> AggregationPlan {
    AggregationPlan::new()
        .with_step("api", Box::new(StaticFetcher(json!({"id": "abc123", "name": "orders"}))))
        .expect("step")
        .with_step("stagesCount", Box::new(StaticFetcher(json!(2))))
        .expect("step")
}

/// Extracts the agent text body from a rendered envelope.
fn agent_body(value: &Value) -> Value {
    let body = value["response"]["functionResponse"]["responseBody"]["TEXT"]["body"]
        .as_str()
        .expect("body string");
    serde_json::from_str(body).expect("body parses")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn tool_call_invocation_returns_a_full_agent_report() {
    let inspector = inspector(healthy_plan(), Box::new(NoopAuditSink));
    let response = inspector
        .handle_value(json!({"parameters": [{"name": "apiid", "value": "abc123"}]}))
        .await;

    let value = serde_json::to_value(&response).expect("render");
    assert_eq!(value["messageVersion"], json!("1.0"));
    let body = agent_body(&value);
    assert_eq!(body["api"]["id"], json!("abc123"));
    assert_eq!(body["stagesCount"], json!(2));
}

#[tokio::test]
async fn tool_call_missing_parameter_yields_an_agent_error_body() {
    let inspector = inspector(healthy_plan(), Box::new(NoopAuditSink));
    let response = inspector.handle_value(json!({"parameters": []})).await;

    let value = serde_json::to_value(&response).expect("render");
    let body = agent_body(&value);
    assert_eq!(body["error"], json!("missing required parameter: apiid"));
}

#[tokio::test]
async fn config_invocation_for_unsupported_type_is_not_applicable() {
    let invoking = json!({
        "configurationItem": {
            "resourceType": "AWS::EC2::Instance",
            "resourceId": "i-0abc",
            "configurationItemCaptureTime": "2026-01-05T10:00:00.000Z"
        },
        "messageType": "ConfigurationItemChangeNotification"
    });
    let inspector = inspector(healthy_plan(), Box::new(NoopAuditSink));
    let response = inspector
        .handle_value(json!({
            "invokingEvent": invoking.to_string(),
            "resultToken": "tok"
        }))
        .await;

    let value = serde_json::to_value(&response).expect("render");
    let evaluation = &value["Evaluations"][0];
    assert_eq!(evaluation["ComplianceType"], json!("NOT_APPLICABLE"));
    assert_eq!(evaluation["ComplianceResourceType"], json!("AWS::EC2::Instance"));
    assert_eq!(evaluation["ComplianceResourceId"], json!("i-0abc"));
    let annotation = evaluation["Annotation"].as_str().expect("annotation");
    assert!(annotation.contains("AWS::EC2::Instance"));
}

#[tokio::test]
async fn config_invocation_judges_completeness() {
    let invoking = json!({
        "configurationItem": {
            "resourceType": "AWS::ApiGateway::RestApi",
            "resourceId": "abc123"
        },
        "messageType": "ConfigurationItemChangeNotification"
    });
    let payload = json!({"invokingEvent": invoking.to_string(), "resultToken": "tok"});

    let healthy = inspector(healthy_plan(), Box::new(NoopAuditSink));
    let value = serde_json::to_value(&healthy.handle_value(payload.clone()).await).expect("render");
    assert_eq!(value["Evaluations"][0]["ComplianceType"], json!("COMPLIANT"));

    let degraded_plan = AggregationPlan::new()
        .with_step("api", Box::new(ErroringFetcher("throttled")))
        .expect("step");
    let degraded = inspector(degraded_plan, Box::new(NoopAuditSink));
    let value = serde_json::to_value(&degraded.handle_value(payload).await).expect("render");
    assert_eq!(value["Evaluations"][0]["ComplianceType"], json!("NON_COMPLIANT"));
    let annotation = value["Evaluations"][0]["Annotation"].as_str().expect("annotation");
    assert!(annotation.contains("api"));
}

#[tokio::test]
async fn resource_change_invocation_returns_the_raw_report() {
    let inspector = inspector(healthy_plan(), Box::new(NoopAuditSink));
    let response = inspector
        .handle_value(json!({"detail": {"requestParameters": {"restApiId": "abc123"}}}))
        .await;

    let value = serde_json::to_value(&response).expect("render");
    assert_eq!(value["api"]["id"], json!("abc123"));
    assert_eq!(value["stagesCount"], json!(2));
}

#[tokio::test]
async fn unrecognized_payload_returns_an_error_object() {
    let inspector = inspector(healthy_plan(), Box::new(NoopAuditSink));
    let response = inspector.handle_value(json!({"unrelated": true})).await;

    let value = serde_json::to_value(&response).expect("render");
    assert!(value["error"].as_str().expect("error string").contains("unrecognized"));
}

#[tokio::test]
async fn outcomes_are_audited_per_invocation() {
    let sink = std::sync::Arc::new(OutcomeSink::default());

    struct SharedSink(std::sync::Arc<OutcomeSink>);
    impl AuditSink for SharedSink {
        fn record_field_failure(&self, event: &FieldFailureEvent) {
            self.0.record_field_failure(event);
        }
        fn record_invocation(&self, event: &InvocationOutcomeEvent) {
            self.0.record_invocation(event);
        }
    }

    let inspector = inspector(healthy_plan(), Box::new(SharedSink(sink.clone())));
    inspector
        .handle_value(json!({"parameters": [{"name": "apiid", "value": "abc123"}]}))
        .await;
    inspector.handle_value(json!({"unrelated": true})).await;

    let outcomes = sink.outcomes.lock().expect("lock");
    assert_eq!(
        *outcomes,
        vec![
            ("agent_tool_call".to_string(), "completed".to_string()),
            ("unrecognized".to_string(), "error".to_string()),
        ]
    );
}
