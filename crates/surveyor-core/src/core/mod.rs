// crates/surveyor-core/src/core/mod.rs
// ============================================================================
// Module: Surveyor Core Types
// Description: Canonical envelope, target, and report structures.
// Purpose: Provide stable, serializable types for aggregation inputs and outputs.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Surveyor core types define the inbound invocation envelopes, the extracted
//! aggregation target, the per-field result and report structures, and the
//! outbound response envelopes. These types are the canonical source of truth
//! for every caller-facing wire shape.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod envelope;
pub mod identifiers;
pub mod report;
pub mod respond;
pub mod target;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use envelope::AgentToolCallEvent;
pub use envelope::ConfigRuleEvent;
pub use envelope::ConfigurationItem;
pub use envelope::EnvelopeError;
pub use envelope::InvocationEnvelope;
pub use envelope::InvokingEvent;
pub use envelope::ResourceChangeDetail;
pub use envelope::ResourceChangeEvent;
pub use envelope::ToolParameter;
pub use identifiers::FieldName;
pub use identifiers::TargetKey;
pub use report::AggregationReport;
pub use report::FieldFailure;
pub use report::FieldResult;
pub use report::ReportError;
pub use respond::AgentFunctionResponse;
pub use respond::AgentFunctionResult;
pub use respond::AgentResponseBody;
pub use respond::AgentTextBody;
pub use respond::AgentToolResponse;
pub use respond::ComplianceJudgment;
pub use respond::ComplianceType;
pub use respond::Evaluation;
pub use respond::EvaluationSet;
pub use respond::FormatError;
pub use respond::MAX_ANNOTATION_LEN;
pub use respond::ResponseEnvelope;
pub use respond::ResponseOptions;
pub use respond::collapse_repeated_spaces;
pub use respond::format_agent_error;
pub use respond::format_agent_response;
pub use respond::format_config_response;
pub use respond::format_raw_response;
pub use target::AggregationTarget;
pub use target::ConfigResourceScope;
pub use target::TargetOrigin;
