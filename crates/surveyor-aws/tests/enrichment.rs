// crates/surveyor-aws/tests/enrichment.rs
// ============================================================================
// Module: Enrichment Tests
// Description: Tests for access log record enrichment.
// ============================================================================
//! ## Overview
//! Verifies directory construction from usage plan listings, identity name
//! annotation with `-` placeholders, request time reformatting, and that
//! undecodable records come back unchanged as `ProcessingFailed`.

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

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use proptest::prelude::*;
use serde_json::Value;
use serde_json::json;
use surveyor_aws::ApiStageRef;
use surveyor_aws::CatalogError;
use surveyor_aws::FirehoseRecord;
use surveyor_aws::FirehoseTransformEvent;
use surveyor_aws::RecordDisposition;
use surveyor_aws::UsagePlanCatalog;
use surveyor_aws::UsagePlanDirectory;
use surveyor_aws::UsagePlanKeySummary;
use surveyor_aws::UsagePlanSummary;
use surveyor_aws::transform_records;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Usage plan catalog serving two plans over one API.
struct FixtureCatalog;

#[async_trait]
impl UsagePlanCatalog for FixtureCatalog {
    async fn usage_plans(&self) -> Result<Vec<UsagePlanSummary>, CatalogError> {
        Ok(vec![
            UsagePlanSummary {
                id: "plan-basic".to_string(),
                name: "Basic".to_string(),
                api_stages: vec![ApiStageRef {
                    api_id: "abc123".to_string(),
                    stage: "prod".to_string(),
                }],
            },
            UsagePlanSummary {
                id: "plan-premium".to_string(),
                name: "Premium".to_string(),
                api_stages: vec![ApiStageRef {
                    api_id: "abc123".to_string(),
                    stage: "beta".to_string(),
                }],
            },
        ])
    }

    async fn usage_plan_keys(
        &self,
        plan_id: &str,
    ) -> Result<Vec<UsagePlanKeySummary>, CatalogError> {
        match plan_id {
            "plan-basic" => Ok(vec![UsagePlanKeySummary {
                id: "key-1".to_string(),
                name: "partner-one".to_string(),
            }]),
            "plan-premium" => Ok(vec![UsagePlanKeySummary {
                id: "key-2".to_string(),
                name: "partner-two".to_string(),
            }]),
            other => Err(CatalogError::MissingData(format!("unknown plan {other}"))),
        }
    }
}

/// Builds the directory from the fixture catalog.
async fn directory() -> UsagePlanDirectory {
    UsagePlanDirectory::build(&FixtureCatalog).await.expect("directory")
}

/// Encodes a JSON payload the way the delivery stream does.
fn encode(payload: &Value) -> String {
    STANDARD.encode(payload.to_string().as_bytes())
}

/// Decodes an enriched record payload back into JSON.
fn decode(data: &str) -> Value {
    let bytes = STANDARD.decode(data.as_bytes()).expect("base64");
    let text = String::from_utf8(bytes).expect("utf8");
    assert!(text.ends_with('\n'), "enriched payloads are newline terminated");
    serde_json::from_str(text.trim_end_matches('\n')).expect("json")
}

/// Wraps one encoded payload in a single-record batch.
fn batch(data: String) -> FirehoseTransformEvent {
    FirehoseTransformEvent {
        records: vec![FirehoseRecord {
            record_id: "rec-1".to_string(),
            data,
        }],
    }
}

// ============================================================================
// SECTION: Directory Tests
// ============================================================================

#[tokio::test]
async fn directory_indexes_plans_by_stage_and_key() {
    let directory = directory().await;

    assert!(!directory.is_empty());
    assert_eq!(directory.plan_name("abc123", "prod", "key-1"), Some("Basic"));
    assert_eq!(directory.plan_name("abc123", "beta", "key-2"), Some("Premium"));
    assert_eq!(directory.plan_name("abc123", "prod", "key-2"), None);
    assert_eq!(directory.key_name("key-1"), Some("partner-one"));
    assert_eq!(directory.key_name("key-9"), None);
}

#[tokio::test]
async fn directory_build_propagates_listing_failures() {
    struct BrokenCatalog;

    #[async_trait]
    impl UsagePlanCatalog for BrokenCatalog {
        async fn usage_plans(&self) -> Result<Vec<UsagePlanSummary>, CatalogError> {
            Err(CatalogError::Service("GetUsagePlans: throttled".to_string()))
        }

        async fn usage_plan_keys(
            &self,
            _plan_id: &str,
        ) -> Result<Vec<UsagePlanKeySummary>, CatalogError> {
            Ok(Vec::new())
        }
    }

    let result = UsagePlanDirectory::build(&BrokenCatalog).await;
    assert!(result.is_err());
}

// ============================================================================
// SECTION: Transformation Tests
// ============================================================================

#[tokio::test]
async fn known_identity_gains_both_names() {
    let directory = directory().await;
    let payload = json!({
        "apiId": "abc123",
        "stage": "prod",
        "identityApiKeyId": "key-1",
        "status": "200",
    });

    let response = transform_records(batch(encode(&payload)), &directory);

    assert_eq!(response.records.len(), 1);
    let record = &response.records[0];
    assert_eq!(record.record_id, "rec-1");
    assert_eq!(record.result, RecordDisposition::Ok);
    let enriched = decode(&record.data);
    assert_eq!(enriched.get("identity.apiKeyName"), Some(&json!("partner-one")));
    assert_eq!(enriched.get("identity.usagePlanName"), Some(&json!("Basic")));
    assert_eq!(enriched.get("status"), Some(&json!("200")));
}

#[tokio::test]
async fn unknown_identity_gets_placeholders() {
    let directory = directory().await;
    let payload = json!({
        "apiId": "abc123",
        "stage": "prod",
        "identityApiKeyId": "key-unknown",
    });

    let response = transform_records(batch(encode(&payload)), &directory);

    let enriched = decode(&response.records[0].data);
    assert_eq!(enriched.get("identity.apiKeyName"), Some(&json!("-")));
    assert_eq!(enriched.get("identity.usagePlanName"), Some(&json!("-")));
}

#[tokio::test]
async fn anonymous_request_gets_placeholders() {
    let directory = directory().await;
    let payload = json!({"apiId": "abc123", "stage": "prod"});

    let response = transform_records(batch(encode(&payload)), &directory);

    let enriched = decode(&response.records[0].data);
    assert_eq!(enriched.get("identity.apiKeyName"), Some(&json!("-")));
    assert_eq!(enriched.get("identity.usagePlanName"), Some(&json!("-")));
}

#[tokio::test]
async fn request_time_is_rewritten_to_iso() {
    let directory = directory().await;
    let payload = json!({
        "requestTime": "08/Mar/2024:12:34:56 +0000",
    });

    let response = transform_records(batch(encode(&payload)), &directory);

    let enriched = decode(&response.records[0].data);
    assert_eq!(enriched.get("requestTime"), Some(&json!("2024-03-08T12:34:56")));
}

#[tokio::test]
async fn request_time_keeps_the_local_wall_clock() {
    let directory = directory().await;
    let payload = json!({
        "requestTime": "25/Dec/2023:23:59:59 -0800",
    });

    let response = transform_records(batch(encode(&payload)), &directory);

    let enriched = decode(&response.records[0].data);
    assert_eq!(enriched.get("requestTime"), Some(&json!("2023-12-25T23:59:59")));
}

#[tokio::test]
async fn unparseable_request_time_is_left_alone() {
    let directory = directory().await;
    let payload = json!({"requestTime": "last tuesday"});

    let response = transform_records(batch(encode(&payload)), &directory);

    let record = &response.records[0];
    assert_eq!(record.result, RecordDisposition::Ok);
    let enriched = decode(&record.data);
    assert_eq!(enriched.get("requestTime"), Some(&json!("last tuesday")));
}

#[tokio::test]
async fn undecodable_record_fails_with_original_data() {
    let directory = directory().await;

    let response = transform_records(batch("not base64!".to_string()), &directory);

    let record = &response.records[0];
    assert_eq!(record.result, RecordDisposition::ProcessingFailed);
    assert_eq!(record.data, "not base64!");
}

#[tokio::test]
async fn non_object_payload_fails_with_original_data() {
    let directory = directory().await;
    let encoded = STANDARD.encode(b"[1, 2, 3]");

    let response = transform_records(batch(encoded.clone()), &directory);

    let record = &response.records[0];
    assert_eq!(record.result, RecordDisposition::ProcessingFailed);
    assert_eq!(record.data, encoded);
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn enrichment_preserves_every_original_field(
        entries in prop::collection::btree_map("[a-zA-Z][a-zA-Z0-9_.]{0,16}", "\\PC{0,64}", 0..8),
        key_id in "[a-zA-Z0-9-]{1,20}",
    ) {
        let directory = UsagePlanDirectory::default();
        let mut payload = serde_json::Map::new();
        for (key, value) in &entries {
            payload.insert(key.clone(), json!(value));
        }
        payload.insert("identityApiKeyId".to_string(), json!(key_id));
        let encoded = STANDARD.encode(Value::Object(payload).to_string().as_bytes());

        let response = transform_records(batch(encoded), &directory);

        prop_assert_eq!(response.records[0].result, RecordDisposition::Ok);
        let enriched = decode(&response.records[0].data);
        prop_assert_eq!(enriched.get("identity.apiKeyName"), Some(&json!("-")));
        prop_assert_eq!(enriched.get("identity.usagePlanName"), Some(&json!("-")));
        for (key, value) in &entries {
            if key != "requestTime" && key != "identityApiKeyId" {
                prop_assert_eq!(enriched.get(key), Some(&json!(value)));
            }
        }
    }
}

#[tokio::test]
async fn batch_order_is_preserved_across_mixed_outcomes() {
    let directory = directory().await;
    let event = FirehoseTransformEvent {
        records: vec![
            FirehoseRecord {
                record_id: "rec-1".to_string(),
                data: encode(&json!({"apiId": "abc123"})),
            },
            FirehoseRecord {
                record_id: "rec-2".to_string(),
                data: "garbage".to_string(),
            },
            FirehoseRecord {
                record_id: "rec-3".to_string(),
                data: encode(&json!({"stage": "prod"})),
            },
        ],
    };

    let response = transform_records(event, &directory);

    let ids: Vec<&str> = response.records.iter().map(|record| record.record_id.as_str()).collect();
    assert_eq!(ids, vec!["rec-1", "rec-2", "rec-3"]);
    assert_eq!(response.records[0].result, RecordDisposition::Ok);
    assert_eq!(response.records[1].result, RecordDisposition::ProcessingFailed);
    assert_eq!(response.records[2].result, RecordDisposition::Ok);
}
