// crates/surveyor-core/src/lib.rs
// ============================================================================
// Module: Surveyor Core Library
// Description: Public API surface for the Surveyor aggregation core.
// Purpose: Expose envelope types, the fan-out driver, and response formatting.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Surveyor core implements the multi-source configuration aggregator: it
//! classifies an inbound invocation envelope, extracts the aggregation target,
//! runs a declarative plan of independent sub-fetchers with per-field error
//! isolation, and formats the merged report into the caller's expected
//! envelope shape. It is service-agnostic and integrates through explicit
//! interfaces rather than embedding any AWS SDK surface.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AuditSink;
pub use interfaces::CompliancePolicy;
pub use interfaces::FetchError;
pub use interfaces::FieldFailureEvent;
pub use interfaces::FieldFetcher;
pub use interfaces::InvocationOutcomeEvent;
pub use interfaces::NoopAuditSink;
pub use interfaces::NoopNotificationSink;
pub use interfaces::NotificationSink;
pub use interfaces::NotifyError;
pub use interfaces::OwnerNotice;
pub use interfaces::ReportCompletenessPolicy;
pub use interfaces::StderrAuditSink;
pub use runtime::AggregationPlan;
pub use runtime::ConfigKeySource;
pub use runtime::ExtractError;
pub use runtime::Extraction;
pub use runtime::ExtractorSpec;
pub use runtime::Inspector;
pub use runtime::InspectorConfig;
pub use runtime::PlanError;
pub use runtime::SkipReason;
pub use runtime::extract_target;
