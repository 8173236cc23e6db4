// crates/surveyor-aws/src/enrich.rs
// ============================================================================
// Module: Access Log Enrichment
// Description: Usage plan directory and Firehose record transformation.
// Purpose: Annotate gateway access logs with key and plan names.
// Dependencies: async-trait, aws-sdk-apigateway, base64, serde, serde_json,
//               thiserror, time
// ============================================================================

//! ## Overview
//! Gateway access logs identify callers by API key id. The enrichment path
//! resolves those ids to human-readable names through a
//! [`UsagePlanDirectory`] built once at startup: `apiId:stage:apiKeyId`
//! maps to a usage plan name and `apiKeyId` maps to a key name.
//!
//! [`transform_records`] processes a Firehose transformation batch. Each
//! record's payload is base64 JSON; enrichment adds the flat
//! `identity.apiKeyName` and `identity.usagePlanName` keys (placeholder
//! `-` when unknown) and rewrites `requestTime` from the CLF timestamp
//! form to ISO. A record that cannot be decoded is returned unchanged with
//! a `ProcessingFailed` disposition; a missing or unparseable
//! `requestTime` leaves the timestamp as delivered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::clients::AwsClients;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Placeholder written when a lookup cannot resolve a name.
const UNKNOWN_PLACEHOLDER: &str = "-";

/// Input format of gateway access log request times.
const CLF_FORMAT: &str =
    "[day]/[month repr:short]/[year]:[hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]";

/// Output format written back to enriched records.
const ISO_FORMAT: &str = "[year]-[month]-[day]T[hour]:[minute]:[second]";

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// One record in a Firehose transformation batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseRecord {
    /// Record id echoed back in the response.
    pub record_id: String,
    /// Base64-encoded record payload.
    pub data: String,
}

/// A Firehose transformation batch.
#[derive(Debug, Clone, Deserialize)]
pub struct FirehoseTransformEvent {
    /// Records in delivery order.
    pub records: Vec<FirehoseRecord>,
}

/// Outcome attached to each transformed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordDisposition {
    /// The record was enriched and re-encoded.
    Ok,
    /// The record could not be decoded and is returned unchanged.
    ProcessingFailed,
}

/// One record in the transformation response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedRecord {
    /// Record id copied from the inbound record.
    pub record_id: String,
    /// Whether enrichment succeeded.
    pub result: RecordDisposition,
    /// Base64-encoded payload, enriched or original.
    pub data: String,
}

/// The transformation response returned to Firehose.
#[derive(Debug, Clone, Serialize)]
pub struct FirehoseTransformResponse {
    /// Transformed records in delivery order.
    pub records: Vec<TransformedRecord>,
}

// ============================================================================
// SECTION: Usage Plan Directory
// ============================================================================

/// One usage plan with the API stages it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct UsagePlanSummary {
    /// Plan id.
    pub id: String,
    /// Plan name.
    pub name: String,
    /// API stages the plan covers.
    pub api_stages: Vec<ApiStageRef>,
}

/// One API stage reference inside a usage plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiStageRef {
    /// REST API id.
    pub api_id: String,
    /// Stage name.
    pub stage: String,
}

/// One API key assigned to a usage plan.
#[derive(Debug, Clone, PartialEq)]
pub struct UsagePlanKeySummary {
    /// Key id.
    pub id: String,
    /// Key name.
    pub name: String,
}

/// Read-only usage plan lookups.
#[async_trait]
pub trait UsagePlanCatalog: Send + Sync {
    /// Lists every usage plan with its API stages.
    async fn usage_plans(&self) -> Result<Vec<UsagePlanSummary>, CatalogError>;

    /// Lists every key assigned to one usage plan.
    async fn usage_plan_keys(
        &self,
        plan_id: &str,
    ) -> Result<Vec<UsagePlanKeySummary>, CatalogError>;
}

/// Startup-built lookup tables from key ids to names.
///
/// The directory is read-only after construction and is built once per
/// process; enrichment never refreshes it mid-batch.
#[derive(Debug, Clone, Default)]
pub struct UsagePlanDirectory {
    /// `apiId:stage:apiKeyId` to usage plan name.
    plan_by_stage_key: BTreeMap<String, String>,
    /// API key id to key name.
    key_names: BTreeMap<String, String>,
}

impl UsagePlanDirectory {
    /// Builds the directory by walking every plan and its keys.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if a listing call fails; a partially built
    /// directory is never returned.
    pub async fn build(catalog: &dyn UsagePlanCatalog) -> Result<Self, CatalogError> {
        let mut plan_by_stage_key = BTreeMap::new();
        let mut key_names = BTreeMap::new();
        for plan in catalog.usage_plans().await? {
            for key in catalog.usage_plan_keys(&plan.id).await? {
                key_names.insert(key.id.clone(), key.name.clone());
                for api_stage in &plan.api_stages {
                    plan_by_stage_key.insert(
                        stage_key(&api_stage.api_id, &api_stage.stage, &key.id),
                        plan.name.clone(),
                    );
                }
            }
        }
        Ok(Self {
            plan_by_stage_key,
            key_names,
        })
    }

    /// Looks up the usage plan name for one API stage and key.
    #[must_use]
    pub fn plan_name(&self, api_id: &str, stage: &str, key_id: &str) -> Option<&str> {
        self.plan_by_stage_key
            .get(&stage_key(api_id, stage, key_id))
            .map(String::as_str)
    }

    /// Looks up the name of one API key.
    #[must_use]
    pub fn key_name(&self, key_id: &str) -> Option<&str> {
        self.key_names.get(key_id).map(String::as_str)
    }

    /// Returns `true` when the directory holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plan_by_stage_key.is_empty() && self.key_names.is_empty()
    }
}

/// Builds the composite stage lookup key.
fn stage_key(api_id: &str, stage: &str, key_id: &str) -> String {
    format!("{api_id}:{stage}:{key_id}")
}

// ============================================================================
// SECTION: Record Transformation
// ============================================================================

/// Reasons a record payload cannot be enriched.
#[derive(Debug, Error)]
enum EnrichError {
    /// The payload could not be decoded into a JSON object.
    #[error("record decode failed: {0}")]
    Decode(String),
}

/// Transforms a Firehose batch, enriching each record independently.
#[must_use]
pub fn transform_records(
    event: FirehoseTransformEvent,
    directory: &UsagePlanDirectory,
) -> FirehoseTransformResponse {
    let records = event
        .records
        .into_iter()
        .map(|record| transform_record(record, directory))
        .collect();
    FirehoseTransformResponse {
        records,
    }
}

/// Transforms one record, preserving the original data on decode failure.
fn transform_record(record: FirehoseRecord, directory: &UsagePlanDirectory) -> TransformedRecord {
    match enrich_payload(&record.data, directory) {
        Ok(data) => TransformedRecord {
            record_id: record.record_id,
            result: RecordDisposition::Ok,
            data,
        },
        Err(_) => TransformedRecord {
            record_id: record.record_id,
            result: RecordDisposition::ProcessingFailed,
            data: record.data,
        },
    }
}

/// Decodes, annotates, and re-encodes one record payload.
fn enrich_payload(encoded: &str, directory: &UsagePlanDirectory) -> Result<String, EnrichError> {
    let decoded = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|err| EnrichError::Decode(err.to_string()))?;
    let text = String::from_utf8(decoded)
        .map_err(|_| EnrichError::Decode("record payload is not valid UTF-8".to_string()))?;
    let mut payload: serde_json::Map<String, Value> =
        serde_json::from_str(&text).map_err(|err| EnrichError::Decode(err.to_string()))?;
    annotate_identity(&mut payload, directory);
    reformat_request_time(&mut payload);
    let mut body = serde_json::to_string(&payload)
        .map_err(|err| EnrichError::Decode(err.to_string()))?;
    body.push('\n');
    Ok(STANDARD.encode(body.as_bytes()))
}

/// Adds the flat identity name keys, with `-` for unknown lookups.
fn annotate_identity(payload: &mut serde_json::Map<String, Value>, directory: &UsagePlanDirectory) {
    let key_id = payload
        .get("identityApiKeyId")
        .and_then(Value::as_str)
        .map(str::to_string);
    let api_id = payload
        .get("apiId")
        .and_then(Value::as_str)
        .map(str::to_string);
    let stage = payload
        .get("stage")
        .and_then(Value::as_str)
        .map(str::to_string);
    let key_name = key_id
        .as_deref()
        .and_then(|id| directory.key_name(id))
        .unwrap_or(UNKNOWN_PLACEHOLDER)
        .to_string();
    let plan_name = match (key_id.as_deref(), api_id.as_deref(), stage.as_deref()) {
        (Some(key_id), Some(api_id), Some(stage)) => directory
            .plan_name(api_id, stage, key_id)
            .unwrap_or(UNKNOWN_PLACEHOLDER)
            .to_string(),
        _ => UNKNOWN_PLACEHOLDER.to_string(),
    };
    payload.insert("identity.apiKeyName".to_string(), Value::String(key_name));
    payload.insert(
        "identity.usagePlanName".to_string(),
        Value::String(plan_name),
    );
}

/// Rewrites `requestTime` from CLF to ISO, leaving it untouched when the
/// key is absent or does not parse.
fn reformat_request_time(payload: &mut serde_json::Map<String, Value>) {
    let Some(current) = payload
        .get("requestTime")
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        return;
    };
    let Some(formatted) = reformat_clf_timestamp(&current) else {
        return;
    };
    payload.insert("requestTime".to_string(), Value::String(formatted));
}

/// Converts one CLF timestamp to the ISO form, preserving the wall clock.
fn reformat_clf_timestamp(value: &str) -> Option<String> {
    let input = time::format_description::parse(CLF_FORMAT).ok()?;
    let output = time::format_description::parse(ISO_FORMAT).ok()?;
    let parsed = time::OffsetDateTime::parse(value, &input).ok()?;
    parsed.format(&output).ok()
}

// ============================================================================
// SECTION: SDK Catalog
// ============================================================================

/// Usage plan catalog backed by the live API Gateway API.
///
/// Listing calls paginate with position tokens until the service stops
/// returning one.
#[derive(Debug, Clone)]
pub struct SdkUsagePlanCatalog {
    /// Shared service clients.
    clients: AwsClients,
    /// Page size for listing calls.
    page_limit: i32,
}

impl SdkUsagePlanCatalog {
    /// Creates a catalog over the given client bundle and page size.
    #[must_use]
    pub fn new(clients: AwsClients, page_limit: i32) -> Self {
        Self {
            clients,
            page_limit,
        }
    }
}

#[async_trait]
impl UsagePlanCatalog for SdkUsagePlanCatalog {
    async fn usage_plans(&self) -> Result<Vec<UsagePlanSummary>, CatalogError> {
        let mut plans = Vec::new();
        let mut position: Option<String> = None;
        loop {
            let mut request = self
                .clients
                .apigateway
                .get_usage_plans()
                .limit(self.page_limit);
            if let Some(token) = &position {
                request = request.position(token);
            }
            let output = request
                .send()
                .await
                .map_err(|err| CatalogError::Service(format!("GetUsagePlans: {err}")))?;
            for plan in output.items() {
                let Some(id) = plan.id() else { continue };
                let Some(name) = plan.name() else { continue };
                let api_stages = plan
                    .api_stages()
                    .iter()
                    .filter_map(|api_stage| {
                        Some(ApiStageRef {
                            api_id: api_stage.api_id()?.to_string(),
                            stage: api_stage.stage()?.to_string(),
                        })
                    })
                    .collect();
                plans.push(UsagePlanSummary {
                    id: id.to_string(),
                    name: name.to_string(),
                    api_stages,
                });
            }
            position = output.position().map(str::to_string);
            if position.is_none() {
                break;
            }
        }
        Ok(plans)
    }

    async fn usage_plan_keys(
        &self,
        plan_id: &str,
    ) -> Result<Vec<UsagePlanKeySummary>, CatalogError> {
        let mut keys = Vec::new();
        let mut position: Option<String> = None;
        loop {
            let mut request = self
                .clients
                .apigateway
                .get_usage_plan_keys()
                .usage_plan_id(plan_id)
                .limit(self.page_limit);
            if let Some(token) = &position {
                request = request.position(token);
            }
            let output = request
                .send()
                .await
                .map_err(|err| CatalogError::Service(format!("GetUsagePlanKeys: {err}")))?;
            for key in output.items() {
                let Some(id) = key.id() else { continue };
                let Some(name) = key.name() else { continue };
                keys.push(UsagePlanKeySummary {
                    id: id.to_string(),
                    name: name.to_string(),
                });
            }
            position = output.position().map(str::to_string);
            if position.is_none() {
                break;
            }
        }
        Ok(keys)
    }
}
