// crates/surveyor-core/src/core/target.rs
// ============================================================================
// Module: Surveyor Aggregation Target
// Description: The resource identity produced by parameter extraction.
// Purpose: Carry the per-invocation key, region, and origin of an inspection.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`AggregationTarget`] names the one resource a single invocation
//! inspects. Targets live for exactly one invocation and are never persisted.
//! The origin records which envelope variant produced the target so the
//! response formatter can select the matching outbound shape.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::TargetKey;

// ============================================================================
// SECTION: Target Types
// ============================================================================

/// The resource under inspection for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationTarget {
    /// Identifying key: a resource id, ARN, or bare name.
    pub key: TargetKey,
    /// Region override supplied by the caller, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Envelope variant that produced this target.
    pub origin: TargetOrigin,
}

impl AggregationTarget {
    /// Creates a target for a direct or agent tool-call invocation.
    #[must_use]
    pub fn direct(key: TargetKey, region: Option<String>) -> Self {
        Self {
            key,
            region,
            origin: TargetOrigin::Direct,
        }
    }

    /// Creates a target for a Config-rule invocation.
    #[must_use]
    pub fn config_rule(key: TargetKey, scope: ConfigResourceScope) -> Self {
        Self {
            key,
            region: None,
            origin: TargetOrigin::ConfigRule(scope),
        }
    }

    /// Creates a target for a resource-change invocation.
    #[must_use]
    pub fn resource_change(key: TargetKey) -> Self {
        Self {
            key,
            region: None,
            origin: TargetOrigin::ResourceChange,
        }
    }

    /// Returns the Config resource scope when the target came from a
    /// Config-rule event.
    #[must_use]
    pub const fn config_scope(&self) -> Option<&ConfigResourceScope> {
        match &self.origin {
            TargetOrigin::ConfigRule(scope) => Some(scope),
            TargetOrigin::Direct | TargetOrigin::ResourceChange => None,
        }
    }
}

/// Envelope variant that produced an aggregation target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TargetOrigin {
    /// Direct invocation or agent tool-call.
    Direct,
    /// AWS Config custom-rule evaluation, with the evaluated resource scope.
    ConfigRule(ConfigResourceScope),
    /// EventBridge-style resource-change event.
    ResourceChange,
}

/// Identity of the resource named by a Config-rule configuration item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigResourceScope {
    /// AWS resource type, for example `AWS::ApiGateway::RestApi`.
    pub resource_type: String,
    /// Resource identifier assigned by the owning service.
    pub resource_id: String,
    /// Full resource ARN, when the configuration item carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Capture timestamp echoed as the evaluation ordering timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_time: Option<String>,
    /// Resource tags captured with the configuration item.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub tags: Map<String, Value>,
}
