// crates/surveyor-core/src/core/envelope.rs
// ============================================================================
// Module: Surveyor Invocation Envelopes
// Description: Tagged union over the supported inbound event shapes.
// Purpose: Classify heterogeneous invocation payloads with one dispatch step.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Inbound events arrive in one of three caller-specific wrappers: an AWS
//! Config custom-rule event, an EventBridge detail event, or a direct/agent
//! tool-call event. Each variant is parsed by its own dedicated shape and
//! classification happens in a single step; there is no exception-driven
//! fallback between shapes. A payload matching none of the variants is
//! rejected with [`EnvelopeError::Unrecognized`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while classifying or unpacking an invocation envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The payload matched none of the supported envelope variants.
    #[error("unrecognized invocation envelope: {0}")]
    Unrecognized(String),
    /// The Config-rule `invokingEvent` string was not valid JSON.
    #[error("malformed invokingEvent payload: {0}")]
    InvokingEvent(String),
}

// ============================================================================
// SECTION: Envelope Union
// ============================================================================

/// Inbound invocation envelope, one variant per supported caller shape.
///
/// Variants are tried in declaration order. Each variant requires a field
/// the others never carry (`invokingEvent`, `detail`, `parameters`), so
/// classification is deterministic for well-formed payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvocationEnvelope {
    /// AWS Config custom-rule evaluation event.
    ConfigRule(ConfigRuleEvent),
    /// EventBridge-style resource-change event.
    ResourceChange(ResourceChangeEvent),
    /// Direct invocation or agent tool-call event.
    AgentToolCall(AgentToolCallEvent),
}

impl InvocationEnvelope {
    /// Classifies a raw JSON payload into an envelope variant.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Unrecognized`] when the payload matches no
    /// supported variant.
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        serde_json::from_value(value).map_err(|err| EnvelopeError::Unrecognized(err.to_string()))
    }

    /// Returns a stable label for the envelope variant, used in audit events.
    #[must_use]
    pub const fn variant_label(&self) -> &'static str {
        match self {
            Self::ConfigRule(_) => "config_rule",
            Self::ResourceChange(_) => "resource_change",
            Self::AgentToolCall(_) => "agent_tool_call",
        }
    }
}

// ============================================================================
// SECTION: Config-Rule Variant
// ============================================================================

/// AWS Config custom-rule event carrying a JSON-encoded `invokingEvent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRuleEvent {
    /// JSON string holding the invoking event with the configuration item.
    pub invoking_event: String,
    /// Token echoed back when delivering evaluations to AWS Config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_token: Option<String>,
}

impl ConfigRuleEvent {
    /// Parses the nested `invokingEvent` JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::InvokingEvent`] when the nested payload is
    /// not valid JSON for the expected shape.
    pub fn parse_invoking_event(&self) -> Result<InvokingEvent, EnvelopeError> {
        serde_json::from_str(&self.invoking_event)
            .map_err(|err| EnvelopeError::InvokingEvent(err.to_string()))
    }
}

/// Decoded `invokingEvent` payload of a Config-rule event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokingEvent {
    /// Configuration item describing the resource under evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_item: Option<ConfigurationItem>,
    /// Message type reported by AWS Config, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
}

/// Resource description embedded in a Config invoking event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationItem {
    /// AWS resource type, for example `AWS::EKS::Cluster`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Resource identifier assigned by the owning service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Full resource ARN.
    #[serde(rename = "ARN", skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Capture timestamp used as the evaluation ordering timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_item_capture_time: Option<String>,
    /// Resource tags captured with the configuration item.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub tags: Map<String, Value>,
}

// ============================================================================
// SECTION: Resource-Change Variant
// ============================================================================

/// EventBridge-style event carrying request parameters under `detail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceChangeEvent {
    /// Event detail with the originating API request parameters.
    pub detail: ResourceChangeDetail,
}

/// Detail section of a resource-change event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceChangeDetail {
    /// Request parameters of the API call that produced the event.
    pub request_parameters: Map<String, Value>,
}

// ============================================================================
// SECTION: Agent Tool-Call Variant
// ============================================================================

/// Direct invocation or agent tool-call event with named parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentToolCallEvent {
    /// Ordered list of named parameters supplied by the caller.
    pub parameters: Vec<ToolParameter>,
    /// Agent action group echoed into the tool response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_group: Option<String>,
    /// Tool function name echoed into the tool response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Session attributes echoed into the tool response.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub session_attributes: Map<String, Value>,
    /// Prompt session attributes echoed into the tool response.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub prompt_session_attributes: Map<String, Value>,
}

impl AgentToolCallEvent {
    /// Returns the value of the first parameter with the given name.
    ///
    /// Matching is exact and case-sensitive; there is no fuzzy matching.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| parameter.value.as_str())
    }
}

/// One named parameter of a tool-call event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name as sent by the caller.
    pub name: String,
    /// Parameter value; always a string on the wire.
    pub value: String,
    /// Declared parameter type, when the caller supplies one.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<String>,
}
