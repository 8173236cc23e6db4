// crates/surveyor-core/src/interfaces/audit.rs
// ============================================================================
// Module: Surveyor Audit Logging
// Description: Structured audit events for aggregation runs.
// Purpose: Emit field-failure and invocation-outcome records without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks for aggregation
//! logging. It is intentionally lightweight so deployments can route events
//! to their preferred logging pipeline without redesign. Events serialize as
//! single JSON lines.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::identifiers::FieldName;
use crate::core::target::AggregationTarget;
use crate::interfaces::FetchError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit payload recorded when one sub-fetch fails.
#[derive(Debug, Clone, Serialize)]
pub struct FieldFailureEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Field whose sub-fetch failed.
    pub field: String,
    /// Key of the target under inspection.
    pub target_key: String,
    /// Failure reason recorded in the report placeholder.
    pub error: String,
}

impl FieldFailureEvent {
    /// Creates a new field-failure event with a consistent timestamp.
    #[must_use]
    pub fn new(field: &FieldName, target: &AggregationTarget, error: &FetchError) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "field_fetch_failed",
            timestamp_ms,
            field: field.to_string(),
            target_key: target.key.to_string(),
            error: error.to_string(),
        }
    }
}

/// Audit payload recorded once per handled invocation.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationOutcomeEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Envelope variant label.
    pub variant: &'static str,
    /// Key of the inspected target, when extraction produced one.
    pub target_key: Option<String>,
    /// Outcome label: `completed`, `skipped`, or `error`.
    pub outcome: &'static str,
    /// Number of fields that recorded failure placeholders.
    pub failed_fields: usize,
}

impl InvocationOutcomeEvent {
    /// Creates a new invocation-outcome event with a consistent timestamp.
    #[must_use]
    pub fn new(
        variant: &'static str,
        target_key: Option<String>,
        outcome: &'static str,
        failed_fields: usize,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "invocation_handled",
            timestamp_ms,
            variant,
            target_key,
            outcome,
            failed_fields,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for aggregation events.
pub trait AuditSink: Send + Sync {
    /// Record a field-failure event.
    fn record_field_failure(&self, event: &FieldFailureEvent);

    /// Record an invocation-outcome event.
    fn record_invocation(&self, _event: &InvocationOutcomeEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record_field_failure(&self, event: &FieldFailureEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_invocation(&self, event: &InvocationOutcomeEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record_field_failure(&self, _event: &FieldFailureEvent) {}

    fn record_invocation(&self, _event: &InvocationOutcomeEvent) {}
}
