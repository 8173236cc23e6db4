// crates/surveyor-core/src/runtime/extract.rs
// ============================================================================
// Module: Surveyor Parameter Extraction
// Description: Pure extraction of the aggregation target from an envelope.
// Purpose: Produce a target, a skip, or a terminal missing-parameter error.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Extraction is a pure function over the envelope: no lookups, no side
//! effects. Each envelope variant has exactly one extraction path. A Config
//! resource type outside the allow-list is a skip (`NotApplicable`), not an
//! error; a missing identifying key is terminal for the invocation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::envelope::AgentToolCallEvent;
use crate::core::envelope::ConfigRuleEvent;
use crate::core::envelope::InvocationEnvelope;
use crate::core::envelope::ResourceChangeEvent;
use crate::core::identifiers::TargetKey;
use crate::core::target::AggregationTarget;
use crate::core::target::ConfigResourceScope;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Terminal extraction failures.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The required identifying key was absent from the envelope.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),
    /// The envelope content could not be decoded.
    #[error("malformed envelope: {0}")]
    Envelope(String),
}

// ============================================================================
// SECTION: Extractor Specification
// ============================================================================

/// Where the identifying key of a Config configuration item comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKeySource {
    /// Use the `resourceId` field of the configuration item.
    #[default]
    ResourceId,
    /// Use the final `/`-separated segment of the resource ARN.
    ArnTail,
}

/// Declarative description of how each envelope variant names its target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorSpec {
    /// Exact, case-sensitive tool-call parameter holding the key.
    pub parameter_name: String,
    /// Optional tool-call parameter holding a region override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_parameter: Option<String>,
    /// Config resource types this aggregator supports; anything else skips.
    #[serde(default)]
    pub supported_resource_types: Vec<String>,
    /// Key source for Config configuration items.
    #[serde(default)]
    pub key_source: ConfigKeySource,
    /// Resource-change request-parameter names, tried in order.
    #[serde(default)]
    pub request_parameter_names: Vec<String>,
}

// ============================================================================
// SECTION: Extraction Outcome
// ============================================================================

/// Reason an invocation was skipped rather than aggregated.
#[derive(Debug, Clone)]
pub struct SkipReason {
    /// Human-readable skip reason, used as the evaluation annotation.
    pub reason: String,
    /// Resource scope of the skipped configuration item, when known.
    pub scope: Option<ConfigResourceScope>,
}

impl SkipReason {
    /// Creates a skip reason.
    #[must_use]
    pub fn new(reason: impl Into<String>, scope: Option<ConfigResourceScope>) -> Self {
        Self {
            reason: reason.into(),
            scope,
        }
    }
}

/// Outcome of parameter extraction.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// A target was extracted; aggregation proceeds.
    Target(AggregationTarget),
    /// The invocation does not apply to this aggregator; respond with a skip.
    NotApplicable(SkipReason),
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Extracts the aggregation target from an invocation envelope.
///
/// # Errors
///
/// Returns [`ExtractError::MissingParameter`] when the identifying key is
/// absent or empty, and [`ExtractError::Envelope`] when nested envelope
/// content cannot be decoded.
pub fn extract_target(
    envelope: &InvocationEnvelope,
    spec: &ExtractorSpec,
) -> Result<Extraction, ExtractError> {
    match envelope {
        InvocationEnvelope::AgentToolCall(event) => extract_from_tool_call(event, spec),
        InvocationEnvelope::ConfigRule(event) => extract_from_config_rule(event, spec),
        InvocationEnvelope::ResourceChange(event) => extract_from_resource_change(event, spec),
    }
}

/// Extracts the target from a direct or agent tool-call event.
fn extract_from_tool_call(
    event: &AgentToolCallEvent,
    spec: &ExtractorSpec,
) -> Result<Extraction, ExtractError> {
    let key = event
        .parameter(&spec.parameter_name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ExtractError::MissingParameter(spec.parameter_name.clone()))?;
    let region = spec
        .region_parameter
        .as_deref()
        .and_then(|name| event.parameter(name))
        .filter(|value| !value.is_empty())
        .map(str::to_owned);
    Ok(Extraction::Target(AggregationTarget::direct(
        TargetKey::new(key),
        region,
    )))
}

/// Extracts the target from a Config-rule event.
fn extract_from_config_rule(
    event: &ConfigRuleEvent,
    spec: &ExtractorSpec,
) -> Result<Extraction, ExtractError> {
    let invoking = event
        .parse_invoking_event()
        .map_err(|err| ExtractError::Envelope(err.to_string()))?;
    let Some(item) = invoking.configuration_item else {
        return Ok(Extraction::NotApplicable(SkipReason::new(
            "event carries no configuration item",
            None,
        )));
    };
    let scope = ConfigResourceScope {
        resource_type: item.resource_type.clone().unwrap_or_default(),
        resource_id: item.resource_id.clone().unwrap_or_default(),
        arn: item.arn.clone(),
        capture_time: item.configuration_item_capture_time.clone(),
        tags: item.tags.clone(),
    };
    let supported = spec
        .supported_resource_types
        .iter()
        .any(|resource_type| resource_type == &scope.resource_type);
    if !supported {
        let reason = format!(
            "Resource type {} is not supported by this rule",
            scope.resource_type
        );
        return Ok(Extraction::NotApplicable(SkipReason::new(reason, Some(scope))));
    }
    let key = match spec.key_source {
        ConfigKeySource::ResourceId => item
            .resource_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ExtractError::MissingParameter("resourceId".to_string()))?,
        ConfigKeySource::ArnTail => item
            .arn
            .as_deref()
            .and_then(|arn| arn.rsplit('/').next())
            .filter(|tail| !tail.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| ExtractError::MissingParameter("ARN".to_string()))?,
    };
    Ok(Extraction::Target(AggregationTarget::config_rule(
        TargetKey::new(key),
        scope,
    )))
}

/// Extracts the target from a resource-change event.
fn extract_from_resource_change(
    event: &ResourceChangeEvent,
    spec: &ExtractorSpec,
) -> Result<Extraction, ExtractError> {
    for name in &spec.request_parameter_names {
        if let Some(key) = stringify_parameter(event.detail.request_parameters.get(name)) {
            return Ok(Extraction::Target(AggregationTarget::resource_change(
                TargetKey::new(key),
            )));
        }
    }
    let missing = if spec.request_parameter_names.is_empty() {
        "requestParameters".to_string()
    } else {
        spec.request_parameter_names.join(", ")
    };
    Err(ExtractError::MissingParameter(missing))
}

/// Reads a request parameter as a non-empty string key.
fn stringify_parameter(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}
