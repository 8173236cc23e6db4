// crates/surveyor-core/src/interfaces/mod.rs
// ============================================================================
// Module: Surveyor Core Interfaces
// Description: Trait seams between the aggregation core and its backends.
// Purpose: Define sub-fetcher, policy, notification, and audit contracts.
// Dependencies: async-trait, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The aggregation core talks to everything stateful through the traits in
//! this module: sub-fetchers retrieve field data, compliance policies derive
//! the Config verdict, notification sinks deliver send-and-forget messages,
//! and audit sinks record structured events. Backends implement these traits
//! without the core depending on any service SDK.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::report::AggregationReport;
use crate::core::respond::ComplianceJudgment;
use crate::core::respond::ComplianceType;
use crate::core::target::AggregationTarget;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FieldFailureEvent;
pub use audit::InvocationOutcomeEvent;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;

// ============================================================================
// SECTION: Sub-Fetcher Seam
// ============================================================================

/// Errors surfaced by a sub-fetcher.
///
/// These never propagate to the caller; the fan-out driver converts them
/// into report placeholders and continues.
#[derive(Debug, Error)]
pub enum FetchError {
    /// An underlying service call failed.
    #[error("service call failed: {0}")]
    Service(String),
    /// Data a dependent lookup required was absent.
    #[error("required data missing: {0}")]
    MissingData(String),
}

/// One named unit of aggregation work.
///
/// A sub-fetcher issues one or more read-only calls for its field and
/// reshapes the result into a JSON payload. Implementations must not retry;
/// retry and backoff belong to the underlying client configuration.
#[async_trait]
pub trait FieldFetcher: Send + Sync {
    /// Fetches the field payload for the given target.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the underlying call fails; the driver
    /// records a placeholder and continues with the next field.
    async fn fetch(&self, target: &AggregationTarget) -> Result<Value, FetchError>;
}

// ============================================================================
// SECTION: Compliance Policy Seam
// ============================================================================

/// Derives the Config-rule verdict from an assembled report.
///
/// The judgment is caller-specific by design; deployments substitute their
/// own policy where the shipped default is too coarse.
pub trait CompliancePolicy: Send + Sync {
    /// Judges the report and produces a verdict with an annotation.
    fn judge(&self, report: &AggregationReport) -> ComplianceJudgment;
}

/// Default policy: compliant exactly when every field collected cleanly.
///
/// This is a completeness check, not a configuration review. It exists so
/// the Config variant always produces a well-formed evaluation; deployments
/// with real compliance rules replace it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportCompletenessPolicy;

impl CompliancePolicy for ReportCompletenessPolicy {
    fn judge(&self, report: &AggregationReport) -> ComplianceJudgment {
        let failed = report.failed_fields();
        if failed.is_empty() {
            return ComplianceJudgment::new(
                ComplianceType::Compliant,
                format!("collected {} configuration fields", report.len()),
            );
        }
        let names: Vec<&str> = failed.iter().map(|name| name.as_str()).collect();
        ComplianceJudgment::new(
            ComplianceType::NonCompliant,
            format!("failed to collect: {}", names.join(", ")),
        )
    }
}

// ============================================================================
// SECTION: Notification Seam
// ============================================================================

/// Errors surfaced by a notification sink.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Delivery to the downstream channel failed.
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),
}

/// Message addressed to a resource owner.
#[derive(Debug, Clone)]
pub struct OwnerNotice {
    /// Recipient address discovered from resource tags.
    pub recipient: String,
    /// Message subject line.
    pub subject: String,
    /// Message body text.
    pub body: String,
}

/// Send-and-forget notification channel with no read-back.
///
/// Delivery failures are audited by the caller and never affect the
/// invocation outcome.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers a notice to its recipient.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery fails.
    async fn notify(&self, notice: &OwnerNotice) -> Result<(), NotifyError>;
}

/// Notification sink that discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotificationSink;

#[async_trait]
impl NotificationSink for NoopNotificationSink {
    async fn notify(&self, _notice: &OwnerNotice) -> Result<(), NotifyError> {
        Ok(())
    }
}
