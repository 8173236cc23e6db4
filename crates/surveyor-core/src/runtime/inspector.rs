// crates/surveyor-core/src/runtime/inspector.rs
// ============================================================================
// Module: Surveyor Inspector
// Description: End-to-end orchestration of one aggregation invocation.
// Purpose: Classify, extract, collect, and format with envelope guarantees.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The [`Inspector`] composes the pipeline linearly: envelope → extracted
//! target → plan collection → formatted response. It is infallible by
//! contract: every invocation receives a well-formed envelope in the
//! caller's expected shape, with extraction and formatting failures mapped
//! to error-shaped responses instead of propagating.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::core::envelope::InvocationEnvelope;
use crate::core::report::AggregationReport;
use crate::core::respond::ComplianceJudgment;
use crate::core::respond::ComplianceType;
use crate::core::respond::ResponseEnvelope;
use crate::core::respond::ResponseOptions;
use crate::core::respond::format_agent_error;
use crate::core::respond::format_agent_response;
use crate::core::respond::format_config_response;
use crate::core::respond::format_raw_response;
use crate::core::target::AggregationTarget;
use crate::interfaces::CompliancePolicy;
use crate::interfaces::audit::AuditSink;
use crate::interfaces::audit::InvocationOutcomeEvent;
use crate::runtime::extract::Extraction;
use crate::runtime::extract::ExtractorSpec;
use crate::runtime::extract::SkipReason;
use crate::runtime::extract::extract_target;
use crate::runtime::plan::AggregationPlan;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Static configuration of an inspector.
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    /// How each envelope variant names its target.
    pub extractor: ExtractorSpec,
    /// Response body post-processing flags.
    pub options: ResponseOptions,
}

// ============================================================================
// SECTION: Inspector
// ============================================================================

/// One configured aggregation pipeline.
pub struct Inspector {
    /// Extractor specification and formatting options.
    config: InspectorConfig,
    /// Declarative field plan executed per invocation.
    plan: AggregationPlan,
    /// Policy deriving the Config-rule verdict from the report.
    policy: Box<dyn CompliancePolicy>,
    /// Sink receiving field-failure and invocation-outcome events.
    audit: Box<dyn AuditSink>,
}

impl Inspector {
    /// Creates an inspector from its configuration and collaborators.
    #[must_use]
    pub fn new(
        config: InspectorConfig,
        plan: AggregationPlan,
        policy: Box<dyn CompliancePolicy>,
        audit: Box<dyn AuditSink>,
    ) -> Self {
        Self {
            config,
            plan,
            policy,
            audit,
        }
    }

    /// Handles a raw JSON payload.
    ///
    /// Classification failure produces a raw error envelope; everything else
    /// follows [`Inspector::handle`].
    pub async fn handle_value(&self, payload: Value) -> ResponseEnvelope {
        match InvocationEnvelope::from_value(payload) {
            Ok(envelope) => self.handle(envelope).await,
            Err(error) => {
                self.audit.record_invocation(&InvocationOutcomeEvent::new(
                    "unrecognized",
                    None,
                    "error",
                    0,
                ));
                ResponseEnvelope::Raw(json!({ "error": error.to_string() }))
            }
        }
    }

    /// Handles a classified invocation envelope.
    ///
    /// Never fails: extraction errors, skips, and formatter failures all map
    /// to well-formed envelopes in the caller's expected shape.
    pub async fn handle(&self, envelope: InvocationEnvelope) -> ResponseEnvelope {
        let variant = envelope.variant_label();
        match extract_target(&envelope, &self.config.extractor) {
            Ok(Extraction::Target(target)) => self.aggregate(&envelope, variant, &target).await,
            Ok(Extraction::NotApplicable(skip)) => {
                self.audit.record_invocation(&InvocationOutcomeEvent::new(
                    variant, None, "skipped", 0,
                ));
                Self::skip_response(&envelope, &skip)
            }
            Err(error) => {
                self.audit
                    .record_invocation(&InvocationOutcomeEvent::new(variant, None, "error", 0));
                Self::error_response(&envelope, &error.to_string())
            }
        }
    }

    /// Collects the plan for a target and formats the success response.
    async fn aggregate(
        &self,
        envelope: &InvocationEnvelope,
        variant: &'static str,
        target: &AggregationTarget,
    ) -> ResponseEnvelope {
        let report = self.plan.collect(target, self.audit.as_ref()).await;
        self.audit.record_invocation(&InvocationOutcomeEvent::new(
            variant,
            Some(target.key.to_string()),
            "completed",
            report.failed_fields().len(),
        ));
        self.format(envelope, target, &report)
    }

    /// Formats the report into the envelope shape of the originating caller.
    fn format(
        &self,
        envelope: &InvocationEnvelope,
        target: &AggregationTarget,
        report: &AggregationReport,
    ) -> ResponseEnvelope {
        match envelope {
            InvocationEnvelope::AgentToolCall(event) => {
                match format_agent_response(report, event, &self.config.options) {
                    Ok(response) => response,
                    Err(error) => format_agent_error(
                        event,
                        &format!("response formatting failed: {error}"),
                    ),
                }
            }
            InvocationEnvelope::ConfigRule(_) => {
                let judgment = self.policy.judge(report);
                format_config_response(target.config_scope(), &judgment)
            }
            InvocationEnvelope::ResourceChange(_) => match format_raw_response(report) {
                Ok(response) => response,
                Err(error) => ResponseEnvelope::Raw(json!({
                    "error": format!("response formatting failed: {error}"),
                })),
            },
        }
    }

    /// Builds the skip response for a not-applicable invocation.
    fn skip_response(envelope: &InvocationEnvelope, skip: &SkipReason) -> ResponseEnvelope {
        match envelope {
            InvocationEnvelope::ConfigRule(_) => {
                let judgment =
                    ComplianceJudgment::new(ComplianceType::NotApplicable, skip.reason.clone());
                format_config_response(skip.scope.as_ref(), &judgment)
            }
            InvocationEnvelope::AgentToolCall(event) => format_agent_error(event, &skip.reason),
            InvocationEnvelope::ResourceChange(_) => {
                ResponseEnvelope::Raw(json!({ "skipped": skip.reason }))
            }
        }
    }

    /// Builds the error-shaped response for a terminal failure.
    fn error_response(envelope: &InvocationEnvelope, message: &str) -> ResponseEnvelope {
        match envelope {
            InvocationEnvelope::AgentToolCall(event) => format_agent_error(event, message),
            InvocationEnvelope::ConfigRule(_) => {
                let judgment = ComplianceJudgment::new(
                    ComplianceType::NotApplicable,
                    format!("Error: {message}"),
                );
                format_config_response(None, &judgment)
            }
            InvocationEnvelope::ResourceChange(_) => {
                ResponseEnvelope::Raw(json!({ "error": message }))
            }
        }
    }
}
