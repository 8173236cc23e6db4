// crates/surveyor-core/src/runtime/mod.rs
// ============================================================================
// Module: Surveyor Runtime
// Description: Extraction, fan-out driving, and invocation orchestration.
// Purpose: Execute aggregation plans against targets and shape the response.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the aggregation pipeline: classify the envelope,
//! extract the target, collect the plan, and format the response. Every host
//! (Lambda, tests, local harnesses) calls into the same [`Inspector`] logic
//! so per-field isolation and envelope guarantees hold everywhere.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod extract;
pub mod inspector;
pub mod plan;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use extract::ConfigKeySource;
pub use extract::ExtractError;
pub use extract::Extraction;
pub use extract::ExtractorSpec;
pub use extract::SkipReason;
pub use extract::extract_target;
pub use inspector::Inspector;
pub use inspector::InspectorConfig;
pub use plan::AggregationPlan;
pub use plan::PlanError;
