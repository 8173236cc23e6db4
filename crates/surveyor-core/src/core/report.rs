// crates/surveyor-core/src/core/report.rs
// ============================================================================
// Module: Surveyor Aggregation Report
// Description: Per-field results and the assembled aggregation report.
// Purpose: Record every declared field exactly once, as data or a placeholder.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`FieldResult`] is the outcome of one sub-fetcher: real data or an
//! explicit failure placeholder. The [`AggregationReport`] maps field names
//! to results in plan declaration order, is assembled once per invocation,
//! and is immutable after construction. A declared field is never silently
//! omitted; failures serialize as `{"error": message}` placeholders exactly
//! as downstream consumers expect.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::de;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;
use serde::ser::Serializer;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::FieldName;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while assembling an aggregation report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The same field name was declared more than once.
    #[error("duplicate report field: {0}")]
    DuplicateField(String),
}

// ============================================================================
// SECTION: Field Results
// ============================================================================

/// Failure placeholder recorded for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldFailure {
    /// Human-readable reason the sub-fetch failed.
    pub error: String,
}

/// Outcome of one sub-fetcher: fetched data or an explicit failure.
///
/// Failure placeholders and values share one wire namespace: a failed field
/// serializes as `{"error": message}` and a fetched field serializes as its
/// payload. Parsing prefers the failure shape, so an object carrying exactly
/// one string-valued `error` key reads back as [`FieldResult::Failed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldResult {
    /// The sub-fetch failed; the report keeps an error placeholder.
    Failed(FieldFailure),
    /// The sub-fetch succeeded with this payload.
    Value(Value),
}

impl FieldResult {
    /// Wraps a fetched payload.
    #[must_use]
    pub const fn value(value: Value) -> Self {
        Self::Value(value)
    }

    /// Builds a failure placeholder from a reason.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(FieldFailure {
            error: reason.into(),
        })
    }

    /// Returns `true` for a failure placeholder.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the fetched payload, when present.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    /// Returns the failure reason, when present.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(failure) => Some(failure.error.as_str()),
            Self::Value(_) => None,
        }
    }
}

// ============================================================================
// SECTION: Aggregation Report
// ============================================================================

/// Ordered mapping from field name to [`FieldResult`].
///
/// # Invariants
///
/// - Every declared field is present exactly once.
/// - Entry order is the plan declaration order.
/// - The report is immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationReport {
    /// Report entries in declaration order.
    entries: Vec<(FieldName, FieldResult)>,
}

impl AggregationReport {
    /// Builds a report from ordered entries.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::DuplicateField`] when a field name repeats.
    pub fn new(entries: Vec<(FieldName, FieldResult)>) -> Result<Self, ReportError> {
        for (index, (name, _)) in entries.iter().enumerate() {
            if entries[..index].iter().any(|(seen, _)| seen == name) {
                return Err(ReportError::DuplicateField(name.to_string()));
            }
        }
        Ok(Self {
            entries,
        })
    }

    /// Builds a report from plan-produced entries.
    ///
    /// Plan construction already rejects duplicate field names, so a repeat
    /// here is unreachable; if one ever appears the first occurrence wins.
    #[must_use]
    pub(crate) fn from_plan_entries(entries: Vec<(FieldName, FieldResult)>) -> Self {
        let mut unique: Vec<(FieldName, FieldResult)> = Vec::with_capacity(entries.len());
        for (name, result) in entries {
            if !unique.iter().any(|(seen, _)| *seen == name) {
                unique.push((name, result));
            }
        }
        Self {
            entries: unique,
        }
    }

    /// Returns the result recorded for a field name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldResult> {
        self.entries
            .iter()
            .find(|(field, _)| field.as_str() == name)
            .map(|(_, result)| result)
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the report declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &FieldResult)> {
        self.entries.iter().map(|(name, result)| (name, result))
    }

    /// Iterates over field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &FieldName> {
        self.entries.iter().map(|(name, _)| name)
    }

    /// Returns the names of fields that recorded failure placeholders.
    #[must_use]
    pub fn failed_fields(&self) -> Vec<&FieldName> {
        self.entries
            .iter()
            .filter(|(_, result)| result.is_failed())
            .map(|(name, _)| name)
            .collect()
    }

    /// Returns `true` when no field recorded a failure placeholder.
    #[must_use]
    pub fn is_fully_populated(&self) -> bool {
        self.entries.iter().all(|(_, result)| !result.is_failed())
    }
}

impl Serialize for AggregationReport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, result) in &self.entries {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

/// Map visitor that rebuilds a report while preserving entry order.
struct ReportVisitor;

impl<'de> Visitor<'de> for ReportVisitor {
    type Value = AggregationReport;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of field names to field results")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries: Vec<(FieldName, FieldResult)> =
            Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, result)) = access.next_entry::<FieldName, FieldResult>()? {
            entries.push((name, result));
        }
        AggregationReport::new(entries).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for AggregationReport {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(ReportVisitor)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use serde_json::json;

    use super::AggregationReport;
    use super::FieldResult;
    use crate::core::identifiers::FieldName;

    /// Builds a three-entry report used across the tests below.
    fn sample_report() -> AggregationReport {
        AggregationReport::new(vec![
            (FieldName::new("cluster"), FieldResult::value(json!({"name": "demo"}))),
            (FieldName::new("nodeGroups"), FieldResult::value(json!([]))),
            (FieldName::new("tags"), FieldResult::failed("throttled")),
        ])
        .expect("unique fields")
    }

    #[test]
    fn serializes_in_declaration_order() {
        let report = sample_report();
        let text = serde_json::to_string(&report).expect("serialize");
        let cluster = text.find("\"cluster\"").expect("cluster key");
        let node_groups = text.find("\"nodeGroups\"").expect("nodeGroups key");
        let tags = text.find("\"tags\"").expect("tags key");
        assert!(cluster < node_groups && node_groups < tags);
    }

    #[test]
    fn failed_field_serializes_as_error_placeholder() {
        let report = sample_report();
        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["tags"], json!({"error": "throttled"}));
    }

    #[test]
    fn parse_back_recovers_failures_and_values() {
        let report = sample_report();
        let text = serde_json::to_string(&report).expect("serialize");
        let parsed: AggregationReport = serde_json::from_str(&text).expect("parse");
        assert_eq!(parsed, report);
        assert!(parsed.get("tags").expect("tags entry").is_failed());
        assert!(!parsed.get("cluster").expect("cluster entry").is_failed());
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let result = AggregationReport::new(vec![
            (FieldName::new("api"), FieldResult::value(json!(1))),
            (FieldName::new("api"), FieldResult::value(json!(2))),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn error_object_with_extra_keys_stays_a_value() {
        let parsed: FieldResult =
            serde_json::from_value(json!({"error": "x", "detail": 1})).expect("parse");
        assert!(!parsed.is_failed());
    }
}
