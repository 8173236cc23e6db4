// crates/surveyor-core/src/runtime/plan.rs
// ============================================================================
// Module: Surveyor Aggregation Plan
// Description: Declarative field list and the shared fan-out driver.
// Purpose: Run every sub-fetcher with structural per-field error isolation.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! An [`AggregationPlan`] is an ordered list of `(field name, sub-fetcher)`
//! pairs. One shared driver walks the list sequentially: a failing fetch is
//! audited and recorded as a placeholder, never propagated, so the isolation
//! guarantee is structural rather than per-call-site. Each step writes a
//! disjoint report key, which keeps a future concurrent driver a purely
//! additive change.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::FieldName;
use crate::core::report::AggregationReport;
use crate::core::report::FieldResult;
use crate::core::target::AggregationTarget;
use crate::interfaces::FieldFetcher;
use crate::interfaces::audit::AuditSink;
use crate::interfaces::audit::FieldFailureEvent;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while declaring an aggregation plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The same field name was declared twice.
    #[error("duplicate plan field: {0}")]
    DuplicateField(String),
}

// ============================================================================
// SECTION: Plan
// ============================================================================

/// One declared step of an aggregation plan.
struct PlanStep {
    /// Report field this step populates.
    name: FieldName,
    /// Sub-fetcher that produces the field payload.
    fetcher: Box<dyn FieldFetcher>,
}

/// Ordered, duplicate-free list of named sub-fetchers.
#[derive(Default)]
pub struct AggregationPlan {
    /// Declared steps in report order.
    steps: Vec<PlanStep>,
}

impl AggregationPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
        }
    }

    /// Appends a named step to the plan.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::DuplicateField`] when the field name is already
    /// declared.
    pub fn with_step(
        mut self,
        name: impl Into<FieldName>,
        fetcher: Box<dyn FieldFetcher>,
    ) -> Result<Self, PlanError> {
        let name = name.into();
        if self.steps.iter().any(|step| step.name == name) {
            return Err(PlanError::DuplicateField(name.to_string()));
        }
        self.steps.push(PlanStep {
            name,
            fetcher,
        });
        Ok(self)
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` when the plan declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterates over declared field names in report order.
    pub fn field_names(&self) -> impl Iterator<Item = &FieldName> {
        self.steps.iter().map(|step| &step.name)
    }

    /// Runs every sub-fetcher against the target and assembles the report.
    ///
    /// Fetchers run sequentially in declaration order. A failing fetch is
    /// recorded to the audit sink and stored as an `{"error": ...}`
    /// placeholder; the remaining fields still run. The returned report
    /// contains every declared field exactly once.
    pub async fn collect(
        &self,
        target: &AggregationTarget,
        audit: &dyn AuditSink,
    ) -> AggregationReport {
        let mut entries: Vec<(FieldName, FieldResult)> = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let result = match step.fetcher.fetch(target).await {
                Ok(value) => FieldResult::value(value),
                Err(error) => {
                    audit.record_field_failure(&FieldFailureEvent::new(&step.name, target, &error));
                    FieldResult::failed(error.to_string())
                }
            };
            entries.push((step.name.clone(), result));
        }
        AggregationReport::from_plan_entries(entries)
    }
}
