// crates/surveyor-core/src/core/respond.rs
// ============================================================================
// Module: Surveyor Response Formatting
// Description: Outbound envelope shapes and the pure formatting step.
// Purpose: Serialize an aggregation report into the caller's expected wrapper.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Response formatting is a pure step with no side effects: given the
//! assembled report and the echo data of the originating envelope, it builds
//! one of three outbound shapes. Direct callers receive the raw report, AWS
//! Config receives an `Evaluations` record, and agent callers receive the
//! fixed tool-response envelope with the report serialized into a string
//! body under `responseBody.TEXT.body`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::core::envelope::AgentToolCallEvent;
use crate::core::report::AggregationReport;
use crate::core::target::ConfigResourceScope;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message version expected by the agent tool-response consumer.
const AGENT_MESSAGE_VERSION: &str = "1.0";

/// Maximum length AWS Config accepts for an evaluation annotation.
pub const MAX_ANNOTATION_LEN: usize = 256;

/// Resource type recorded when an evaluation has no configuration item.
const UNKNOWN_RESOURCE_TYPE: &str = "Unknown";

/// Resource id recorded when an evaluation has no configuration item.
const UNKNOWN_RESOURCE_ID: &str = "unknown";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building an outbound envelope.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Serializing the report into the body failed.
    #[error("response serialization failed: {0}")]
    Serialization(String),
}

// ============================================================================
// SECTION: Formatting Options
// ============================================================================

/// Flags controlling body post-processing.
#[derive(Debug, Clone, Default)]
pub struct ResponseOptions {
    /// Collapse runs of repeated spaces in the serialized agent body.
    ///
    /// The original consumer post-processed serialized bodies this way. The
    /// step can corrupt string values that legitimately contain repeated
    /// spaces, so it is off by default and exists only for byte-level
    /// compatibility with that consumer.
    pub legacy_collapse_spaces: bool,
}

// ============================================================================
// SECTION: Compliance Types
// ============================================================================

/// Compliance verdict delivered to AWS Config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceType {
    /// The resource satisfies the rule.
    Compliant,
    /// The resource violates the rule.
    NonCompliant,
    /// The rule does not apply to the resource.
    NotApplicable,
}

impl ComplianceType {
    /// Returns the wire form of the compliance verdict.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compliant => "COMPLIANT",
            Self::NonCompliant => "NON_COMPLIANT",
            Self::NotApplicable => "NOT_APPLICABLE",
        }
    }
}

/// Verdict and annotation produced by a compliance policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceJudgment {
    /// Compliance verdict for the evaluated resource.
    pub compliance: ComplianceType,
    /// Short human-readable justification.
    pub annotation: String,
}

impl ComplianceJudgment {
    /// Creates a judgment from a verdict and annotation.
    #[must_use]
    pub fn new(compliance: ComplianceType, annotation: impl Into<String>) -> Self {
        Self {
            compliance,
            annotation: annotation.into(),
        }
    }
}

// ============================================================================
// SECTION: Outbound Shapes
// ============================================================================

/// One AWS Config evaluation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Evaluation {
    /// Resource type the evaluation applies to.
    pub compliance_resource_type: String,
    /// Resource id the evaluation applies to.
    pub compliance_resource_id: String,
    /// Compliance verdict.
    pub compliance_type: ComplianceType,
    /// Justification, truncated to [`MAX_ANNOTATION_LEN`] characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    /// Capture time of the evaluated configuration item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering_timestamp: Option<String>,
}

/// Evaluation batch returned for a Config-rule invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvaluationSet {
    /// Evaluations in delivery order; one per evaluated resource.
    pub evaluations: Vec<Evaluation>,
}

/// Fixed tool-response envelope returned to agent callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentToolResponse {
    /// Always `"1.0"`.
    pub message_version: String,
    /// Function response section.
    pub response: AgentFunctionResponse,
    /// Session attributes echoed from the inbound event.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub session_attributes: Map<String, Value>,
    /// Prompt session attributes echoed from the inbound event.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub prompt_session_attributes: Map<String, Value>,
}

/// Response section naming the invoked action group and function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentFunctionResponse {
    /// Action group echoed from the inbound event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_group: Option<String>,
    /// Function name echoed from the inbound event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Wrapper holding the response body.
    pub function_response: AgentFunctionResult,
}

/// Wrapper holding the typed response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentFunctionResult {
    /// Response body by content type.
    pub response_body: AgentResponseBody,
}

/// Response body keyed by content type; only `TEXT` is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponseBody {
    /// Text body holding the serialized report.
    #[serde(rename = "TEXT")]
    pub text: AgentTextBody,
}

/// String-encoded JSON body of an agent tool response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTextBody {
    /// Serialized report or error object.
    pub body: String,
}

/// Outbound envelope matching the invoking caller's expected shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    /// Evaluation batch for a Config-rule caller.
    ConfigEvaluation(EvaluationSet),
    /// Tool-response envelope for an agent caller.
    AgentTool(AgentToolResponse),
    /// Raw JSON body for direct and resource-change callers.
    Raw(Value),
}

// ============================================================================
// SECTION: Formatting
// ============================================================================

/// Formats a report for a direct or resource-change caller.
///
/// # Errors
///
/// Returns [`FormatError::Serialization`] when the report cannot be encoded.
pub fn format_raw_response(report: &AggregationReport) -> Result<ResponseEnvelope, FormatError> {
    let value =
        serde_json::to_value(report).map_err(|err| FormatError::Serialization(err.to_string()))?;
    Ok(ResponseEnvelope::Raw(value))
}

/// Formats a report for an agent tool-call caller.
///
/// The report is serialized to a string body in field declaration order and
/// placed under `responseBody.TEXT.body`; action group, function, and the
/// session attribute maps are echoed from the inbound event.
///
/// # Errors
///
/// Returns [`FormatError::Serialization`] when the report cannot be encoded.
pub fn format_agent_response(
    report: &AggregationReport,
    event: &AgentToolCallEvent,
    options: &ResponseOptions,
) -> Result<ResponseEnvelope, FormatError> {
    let mut body =
        serde_json::to_string(report).map_err(|err| FormatError::Serialization(err.to_string()))?;
    if options.legacy_collapse_spaces {
        body = collapse_repeated_spaces(&body);
    }
    Ok(ResponseEnvelope::AgentTool(agent_envelope(event, body)))
}

/// Formats an error body for an agent tool-call caller.
#[must_use]
pub fn format_agent_error(event: &AgentToolCallEvent, message: &str) -> ResponseEnvelope {
    let body = json!({ "error": message }).to_string();
    ResponseEnvelope::AgentTool(agent_envelope(event, body))
}

/// Formats a compliance judgment for a Config-rule caller.
///
/// When no configuration item scope is available the evaluation records
/// placeholder resource identity so the caller still receives a well-formed
/// envelope.
#[must_use]
pub fn format_config_response(
    scope: Option<&ConfigResourceScope>,
    judgment: &ComplianceJudgment,
) -> ResponseEnvelope {
    let evaluation = Evaluation {
        compliance_resource_type: scope
            .map_or_else(|| UNKNOWN_RESOURCE_TYPE.to_string(), |s| s.resource_type.clone()),
        compliance_resource_id: scope
            .map_or_else(|| UNKNOWN_RESOURCE_ID.to_string(), |s| s.resource_id.clone()),
        compliance_type: judgment.compliance,
        annotation: Some(truncate_annotation(&judgment.annotation)),
        ordering_timestamp: scope.and_then(|s| s.capture_time.clone()),
    };
    ResponseEnvelope::ConfigEvaluation(EvaluationSet {
        evaluations: vec![evaluation],
    })
}

/// Builds the fixed agent envelope around a prepared body string.
fn agent_envelope(event: &AgentToolCallEvent, body: String) -> AgentToolResponse {
    AgentToolResponse {
        message_version: AGENT_MESSAGE_VERSION.to_string(),
        response: AgentFunctionResponse {
            action_group: event.action_group.clone(),
            function: event.function.clone(),
            function_response: AgentFunctionResult {
                response_body: AgentResponseBody {
                    text: AgentTextBody {
                        body,
                    },
                },
            },
        },
        session_attributes: event.session_attributes.clone(),
        prompt_session_attributes: event.prompt_session_attributes.clone(),
    }
}

/// Truncates an annotation to the maximum length AWS Config accepts.
fn truncate_annotation(annotation: &str) -> String {
    annotation.chars().take(MAX_ANNOTATION_LEN).collect()
}

/// Collapses every run of two or more spaces into a single space.
///
/// Only the space character is collapsed; tabs and newlines pass through.
/// This mirrors the legacy body post-processing and is intentionally not
/// applied unless [`ResponseOptions::legacy_collapse_spaces`] is set.
#[must_use]
pub fn collapse_repeated_spaces(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut previous_was_space = false;
    for ch in input.chars() {
        if ch == ' ' {
            if !previous_was_space {
                output.push(ch);
            }
            previous_was_space = true;
        } else {
            output.push(ch);
            previous_was_space = false;
        }
    }
    output
}

// ============================================================================
// SECTION: Tests
// ============================================================================
