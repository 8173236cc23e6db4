// crates/surveyor-aws/src/evaluations.rs
// ============================================================================
// Module: Evaluation Delivery
// Description: Publishes compliance evaluations to AWS Config.
// Purpose: Convert formatter output into PutEvaluations calls tied to the
//          invocation's result token.
// Dependencies: aws-sdk-config, surveyor-core, thiserror, time
// ============================================================================

//! ## Overview
//! Config-rule invocations return their verdicts out of band: the Lambda
//! response body is informational and the rule only takes effect once the
//! evaluations are posted back through `PutEvaluations` with the result token
//! from the inbound event. [`EvaluationReporter`] performs that delivery.
//! Failures are reported to the caller for auditing and must never replace
//! the invocation response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;

use aws_sdk_config::primitives::DateTime;
use surveyor_core::Evaluation;
use surveyor_core::EvaluationSet;
use thiserror::Error;
use time::OffsetDateTime;

use crate::clients::AwsClients;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while delivering evaluations to AWS Config.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Evaluation assembly or the publish call failed.
    #[error("evaluation delivery failed: {0}")]
    Publish(String),
}

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// Publishes evaluation batches to AWS Config.
#[derive(Debug, Clone)]
pub struct EvaluationReporter {
    /// Shared AWS service clients.
    clients: AwsClients,
}

impl EvaluationReporter {
    /// Creates a reporter over the shared clients.
    #[must_use]
    pub fn new(clients: AwsClients) -> Self {
        Self {
            clients,
        }
    }

    /// Publishes `set` against the invocation's `result_token`.
    ///
    /// An empty set is a no-op so callers can publish unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when an evaluation cannot be assembled or
    /// the service rejects the publish call.
    pub async fn publish(
        &self,
        set: &EvaluationSet,
        result_token: &str,
    ) -> Result<(), DeliveryError> {
        if set.evaluations.is_empty() {
            return Ok(());
        }
        let mut request = self.clients.config.put_evaluations().result_token(result_token);
        for evaluation in &set.evaluations {
            request = request.evaluations(sdk_evaluation(evaluation)?);
        }
        request
            .send()
            .await
            .map_err(|err| DeliveryError::Publish(format!("PutEvaluations: {err}")))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Conversion
// ============================================================================

/// Converts a formatter evaluation into the SDK request shape.
fn sdk_evaluation(
    evaluation: &Evaluation,
) -> Result<aws_sdk_config::types::Evaluation, DeliveryError> {
    let compliance =
        aws_sdk_config::types::ComplianceType::from(evaluation.compliance_type.as_str());
    let mut builder = aws_sdk_config::types::Evaluation::builder()
        .compliance_resource_type(&evaluation.compliance_resource_type)
        .compliance_resource_id(&evaluation.compliance_resource_id)
        .compliance_type(compliance)
        .ordering_timestamp(ordering_timestamp(evaluation.ordering_timestamp.as_deref()));
    if let Some(annotation) = &evaluation.annotation {
        builder = builder.annotation(annotation);
    }
    builder.build().map_err(|err| DeliveryError::Publish(format!("evaluation assembly: {err}")))
}

/// Converts the recorded capture time into the SDK ordering timestamp.
///
/// Falls back to the current wall clock when the capture time is absent or
/// not valid RFC3339.
fn ordering_timestamp(capture_time: Option<&str>) -> DateTime {
    let Some(raw) = capture_time else {
        return DateTime::from(SystemTime::now());
    };
    let parsed = OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339);
    let Ok(moment) = parsed else {
        return DateTime::from(SystemTime::now());
    };
    let millis = moment.unix_timestamp_nanos() / 1_000_000;
    let Ok(millis) = i64::try_from(millis) else {
        return DateTime::from(SystemTime::now());
    };
    DateTime::from_millis(millis)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "tests assert on known-good values")]

    use surveyor_core::ComplianceType;

    use super::*;

    #[test]
    fn ordering_timestamp_parses_capture_time() {
        let stamp = ordering_timestamp(Some("2024-03-08T12:34:56.500Z"));
        assert_eq!(stamp.secs(), 1_709_901_296);
        assert_eq!(stamp.subsec_nanos(), 500_000_000);
    }

    #[test]
    fn ordering_timestamp_falls_back_on_garbage() {
        let before = DateTime::from(SystemTime::now()).secs();
        let stamp = ordering_timestamp(Some("yesterday-ish"));
        assert!(stamp.secs() >= before);
    }

    #[test]
    fn sdk_evaluation_carries_all_fields() {
        let evaluation = Evaluation {
            compliance_resource_type: "AWS::EKS::Cluster".to_string(),
            compliance_resource_id: "team-cluster".to_string(),
            compliance_type: ComplianceType::NonCompliant,
            annotation: Some("2 of 12 fields failed".to_string()),
            ordering_timestamp: Some("2024-03-08T12:34:56Z".to_string()),
        };
        let built = sdk_evaluation(&evaluation).unwrap();
        assert_eq!(built.compliance_resource_type(), "AWS::EKS::Cluster");
        assert_eq!(built.compliance_resource_id(), "team-cluster");
        assert_eq!(built.compliance_type().as_str(), "NON_COMPLIANT");
        assert_eq!(built.annotation(), Some("2 of 12 fields failed"));
    }
}
