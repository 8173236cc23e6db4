// crates/surveyor-lambda/src/main.rs
// ============================================================================
// Module: Surveyor Lambda Host
// Description: Lambda entry point wiring configuration, catalogs, and delivery.
// Purpose: Serve every surveyor deployment flavor from one configured binary.
// Dependencies: lambda_runtime, surveyor-aws, surveyor-config, surveyor-core, tokio, tracing
// ============================================================================

//! ## Overview
//! One binary serves every surveyor deployment flavor. Configuration picks
//! the inspector kind at startup: envelope-serving kinds build an
//! [`Inspector`] over the matching SDK catalog, while the enrichment kind
//! builds the usage plan directory once and transforms Firehose batches.
//! Config-rule evaluations are delivered to AWS Config and owner notices are
//! sent after the response is formed; neither side effect can fail the
//! invocation.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use lambda_runtime::LambdaEvent;
use lambda_runtime::run;
use lambda_runtime::service_fn;
use serde_json::Map;
use serde_json::Value;
use surveyor_aws::AwsClients;
use surveyor_aws::ClientSettings;
use surveyor_aws::EvaluationReporter;
use surveyor_aws::FirehoseTransformEvent;
use surveyor_aws::SdkAccountCatalog;
use surveyor_aws::SdkClusterCatalog;
use surveyor_aws::SdkDefinitionCatalog;
use surveyor_aws::SdkRestApiCatalog;
use surveyor_aws::SdkUsagePlanCatalog;
use surveyor_aws::SesNotificationSink;
use surveyor_aws::UsagePlanDirectory;
use surveyor_aws::account_plan;
use surveyor_aws::cluster_plan;
use surveyor_aws::definition_plan;
use surveyor_aws::endpoint_plan;
use surveyor_aws::find_owner_email;
use surveyor_aws::transform_records;
use surveyor_config::AuditSinkKind;
use surveyor_config::InspectorKind;
use surveyor_config::SurveyorConfig;
use surveyor_core::AggregationPlan;
use surveyor_core::AuditSink;
use surveyor_core::EvaluationSet;
use surveyor_core::Inspector;
use surveyor_core::InspectorConfig;
use surveyor_core::InvocationEnvelope;
use surveyor_core::NoopAuditSink;
use surveyor_core::NotificationSink;
use surveyor_core::OwnerNotice;
use surveyor_core::ReportCompletenessPolicy;
use surveyor_core::ResponseEnvelope;
use surveyor_core::StderrAuditSink;
use thiserror::Error;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Host initialization and dispatch failures.
#[derive(Debug, Error)]
enum HostError {
    /// Host wiring could not be assembled.
    #[error("host initialization failed: {0}")]
    Init(String),
    /// The usage plan directory could not be built.
    #[error("usage plan directory build failed: {0}")]
    Directory(String),
    /// The inbound payload did not match the expected batch shape.
    #[error("unsupported payload: {0}")]
    Payload(String),
    /// The response body could not be serialized.
    #[error("response serialization failed: {0}")]
    Serialize(String),
}

// ============================================================================
// SECTION: Delivery Context
// ============================================================================

/// Config-rule delivery material captured before inspection.
///
/// The result token and configuration item tags arrive inside the inbound
/// envelope, which the inspector consumes; capturing them up front lets
/// evaluation delivery and owner notification run after the response is
/// formed.
#[derive(Debug, Default)]
struct DeliveryContext {
    /// Token echoed back through `PutEvaluations`.
    result_token: Option<String>,
    /// Tags of the resource under evaluation.
    tags: Map<String, Value>,
    /// Resource id named by the configuration item.
    resource_id: Option<String>,
}

impl DeliveryContext {
    /// Captures delivery material from a raw payload.
    ///
    /// Payloads that are not Config-rule events produce an empty context.
    fn from_payload(payload: &Value) -> Self {
        let Ok(InvocationEnvelope::ConfigRule(event)) =
            InvocationEnvelope::from_value(payload.clone())
        else {
            return Self::default();
        };
        let invoking = event.parse_invoking_event();
        let mut context = Self {
            result_token: event.result_token,
            ..Self::default()
        };
        if let Ok(invoking) = invoking {
            if let Some(item) = invoking.configuration_item {
                context.tags = item.tags;
                context.resource_id = item.resource_id;
            }
        }
        context
    }
}

/// Builds the owner notice for an evaluation set, when an address exists.
fn owner_notice(
    set: &EvaluationSet,
    context: &DeliveryContext,
    subject_prefix: &str,
) -> Option<OwnerNotice> {
    let recipient = find_owner_email(&context.tags)?;
    let resource = context.resource_id.as_deref().unwrap_or("unknown resource");
    let body = set
        .evaluations
        .iter()
        .map(|evaluation| {
            let annotation =
                evaluation.annotation.as_deref().unwrap_or("no annotation recorded");
            format!("{}: {annotation}", evaluation.compliance_type.as_str())
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some(OwnerNotice {
        recipient,
        subject: format!("{subject_prefix}{resource}"),
        body,
    })
}

// ============================================================================
// SECTION: Host Services
// ============================================================================

/// Host dispatch for one configured surveyor deployment.
enum SurveyorService {
    /// Envelope-serving inspector with Config-evaluation delivery.
    Inspector(InspectorHost),
    /// Firehose access-log enrichment host.
    Enrichment(EnrichmentHost),
}

impl SurveyorService {
    /// Builds the host service for the configured inspector kind.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the plan or directory cannot be built.
    async fn from_config(config: SurveyorConfig) -> Result<Self, HostError> {
        let settings = ClientSettings {
            region: config.aws.region.clone(),
            endpoint_url: config.aws.endpoint_url.clone(),
        };
        let clients = AwsClients::connect(&settings).await;

        if config.inspector.kind == InspectorKind::Enrichment {
            let catalog = SdkUsagePlanCatalog::new(clients, config.enrichment.page_limit);
            let directory = UsagePlanDirectory::build(&catalog)
                .await
                .map_err(|err| HostError::Directory(err.to_string()))?;
            return Ok(Self::Enrichment(EnrichmentHost {
                directory,
            }));
        }

        let plan = aggregation_plan(config.inspector.kind, &clients)?;
        let audit: Box<dyn AuditSink> = match config.audit.sink {
            AuditSinkKind::Stderr => Box::new(StderrAuditSink),
            AuditSinkKind::Noop => Box::new(NoopAuditSink),
        };
        let inspector = Inspector::new(
            InspectorConfig {
                extractor: config.inspector.extractor_spec(),
                options: config.response.response_options(),
            },
            plan,
            Box::new(ReportCompletenessPolicy),
            audit,
        );
        let notifier: Option<Box<dyn NotificationSink>> = match config.notify.sender.clone() {
            Some(sender) if config.notify.enabled => {
                Some(Box::new(SesNotificationSink::new(clients.clone(), sender)))
            }
            _ => None,
        };
        Ok(Self::Inspector(InspectorHost {
            inspector,
            reporter: EvaluationReporter::new(clients),
            notifier,
            subject_prefix: config.notify.subject_prefix,
        }))
    }

    /// Handles one invocation payload, returning the response body.
    async fn handle(&self, payload: Value) -> Result<Value, lambda_runtime::Error> {
        let response = match self {
            Self::Inspector(host) => host.handle(payload).await?,
            Self::Enrichment(host) => host.handle(payload)?,
        };
        Ok(response)
    }
}

/// Envelope host wiring the inspector to delivery and notification.
struct InspectorHost {
    /// Configured aggregation pipeline.
    inspector: Inspector,
    /// Delivers Config evaluations with the inbound result token.
    reporter: EvaluationReporter,
    /// Owner-notification sink, present when notification is enabled.
    notifier: Option<Box<dyn NotificationSink>>,
    /// Subject prefix for owner notices; the resource id is appended.
    subject_prefix: String,
}

impl InspectorHost {
    /// Runs the inspector and performs Config delivery side effects.
    async fn handle(&self, payload: Value) -> Result<Value, HostError> {
        let context = DeliveryContext::from_payload(&payload);
        let response = self.inspector.handle_value(payload).await;
        if let ResponseEnvelope::ConfigEvaluation(set) = &response {
            self.deliver(set, &context).await;
        }
        serde_json::to_value(&response).map_err(|err| HostError::Serialize(err.to_string()))
    }

    /// Delivers the evaluation set and notifies the resource owner.
    ///
    /// Failures are logged and never fail the invocation.
    async fn deliver(&self, set: &EvaluationSet, context: &DeliveryContext) {
        if let Some(token) = &context.result_token {
            if let Err(error) = self.reporter.publish(set, token).await {
                warn!("{error}");
            }
        } else {
            warn!("config evaluation without a result token; delivery skipped");
        }
        self.notify_owner(set, context).await;
    }

    /// Sends the findings summary to the owner address found in tags.
    async fn notify_owner(&self, set: &EvaluationSet, context: &DeliveryContext) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let Some(notice) = owner_notice(set, context, &self.subject_prefix) else {
            return;
        };
        if let Err(error) = notifier.notify(&notice).await {
            warn!("{error}");
        }
    }
}

/// Enrichment host serving Firehose transformation batches.
struct EnrichmentHost {
    /// Usage plan directory resolved once at initialization.
    directory: UsagePlanDirectory,
}

impl EnrichmentHost {
    /// Transforms one Firehose batch against the cached directory.
    fn handle(&self, payload: Value) -> Result<Value, HostError> {
        let event: FirehoseTransformEvent =
            serde_json::from_value(payload).map_err(|err| HostError::Payload(err.to_string()))?;
        let response = transform_records(event, &self.directory);
        serde_json::to_value(&response).map_err(|err| HostError::Serialize(err.to_string()))
    }
}

/// Builds the aggregation plan serving the configured kind.
fn aggregation_plan(
    kind: InspectorKind,
    clients: &AwsClients,
) -> Result<AggregationPlan, HostError> {
    let plan = match kind {
        InspectorKind::Account => account_plan(Arc::new(SdkAccountCatalog::new(clients.clone()))),
        InspectorKind::Endpoint => {
            endpoint_plan(Arc::new(SdkRestApiCatalog::new(clients.clone())))
        }
        InspectorKind::Cluster => cluster_plan(Arc::new(SdkClusterCatalog::new(clients.clone()))),
        InspectorKind::Definition => {
            definition_plan(Arc::new(SdkDefinitionCatalog::new(clients.clone())))
        }
        InspectorKind::Enrichment => {
            return Err(HostError::Init("enrichment kind has no aggregation plan".to_string()));
        }
    };
    plan.map_err(|err| HostError::Init(err.to_string()))
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Lambda entry point wiring configuration to the host service.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), lambda_runtime::Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        // CloudWatch attaches its own ingestion timestamp.
        .without_time()
        .init();

    let config = SurveyorConfig::load(None)?;
    let kind = config.inspector.kind;
    let service = SurveyorService::from_config(config).await?;
    info!("surveyor host ready, serving {} invocations", kind.as_str());

    let service_ref = &service;
    run(service_fn(move |event: LambdaEvent<Value>| async move {
        service_ref.handle(event.payload).await
    }))
    .await
}
