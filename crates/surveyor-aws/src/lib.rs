// crates/surveyor-aws/src/lib.rs
// ============================================================================
// Module: Surveyor AWS Catalogs
// Description: AWS service catalogs, aggregation plans, and delivery sinks.
// Purpose: Bind the core aggregation runtime to live AWS APIs for every
//          supported inspection target.
// Dependencies: surveyor-core, aws-sdk crates, serde_json, time
// ============================================================================

//! ## Overview
//! This crate supplies the AWS side of the surveyor runtime: shared service
//! clients, one catalog trait per inspection domain with an SDK-backed
//! implementation, plan builders that enumerate each domain's report fields,
//! the usage-plan enrichment path for delivery-stream records, and the
//! out-of-band sinks that post evaluations to AWS Config and notify resource
//! owners over SES. Catalog traits carry only the calls each domain needs so
//! tests can substitute hand-built fixtures for live services.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod account;
pub mod catalog;
pub mod clients;
pub mod cluster;
pub mod definition;
pub mod detect;
pub mod endpoint;
pub mod enrich;
pub mod evaluations;
pub mod notify;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use account::AccountCatalog;
pub use account::SdkAccountCatalog;
pub use account::account_plan;
pub use catalog::CatalogError;
pub use clients::AwsClients;
pub use clients::ClientSettings;
pub use cluster::ClusterCatalog;
pub use cluster::ClusterInstance;
pub use cluster::KarpenterInstanceSummary;
pub use cluster::SdkClusterCatalog;
pub use cluster::cluster_plan;
pub use definition::DefinitionCatalog;
pub use definition::SdkDefinitionCatalog;
pub use definition::definition_plan;
pub use detect::AutoModeAssessment;
pub use detect::AutoModeSignals;
pub use detect::DetectionConfidence;
pub use detect::KarpenterAssessment;
pub use detect::KarpenterSignals;
pub use detect::assess_auto_mode;
pub use detect::assess_karpenter;
pub use endpoint::RestApiCatalog;
pub use endpoint::SdkRestApiCatalog;
pub use endpoint::endpoint_plan;
pub use enrich::ApiStageRef;
pub use enrich::FirehoseRecord;
pub use enrich::FirehoseTransformEvent;
pub use enrich::FirehoseTransformResponse;
pub use enrich::RecordDisposition;
pub use enrich::SdkUsagePlanCatalog;
pub use enrich::TransformedRecord;
pub use enrich::UsagePlanCatalog;
pub use enrich::UsagePlanDirectory;
pub use enrich::UsagePlanKeySummary;
pub use enrich::UsagePlanSummary;
pub use enrich::transform_records;
pub use evaluations::DeliveryError;
pub use evaluations::EvaluationReporter;
pub use notify::SesNotificationSink;
pub use notify::find_owner_email;
