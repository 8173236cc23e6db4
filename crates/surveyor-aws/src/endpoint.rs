// crates/surveyor-aws/src/endpoint.rs
// ============================================================================
// Module: Endpoint Inspector Fields
// Description: REST API aggregation fields and the API Gateway SDK catalog.
// Purpose: Collect the full configuration surface of one REST API.
// Dependencies: async-trait, aws-sdk-apigateway, aws-sdk-wafv2, serde_json,
//               surveyor-core
// ============================================================================

//! ## Overview
//! The endpoint inspector reports on a single REST API named by the
//! aggregation target key. Most fields are one listing call reshaped to
//! JSON; three are composites:
//!
//! - `wafConfiguration` checks each stage's web ACL association. A stage
//!   without an association maps to `null`; a lookup failure maps to an
//!   `error` entry for that stage only.
//! - `integrations` walks every resource method. A failing method lookup
//!   contributes an `error` entry in place of the integration; a VPC link
//!   referenced by an integration is expanded inline.
//! - `tags` reads the API's tag set through its gateway ARN.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_apigateway::types::MethodSetting;
use serde_json::Value;
use serde_json::json;
use surveyor_core::AggregationPlan;
use surveyor_core::AggregationTarget;
use surveyor_core::FetchError;
use surveyor_core::FieldFetcher;
use surveyor_core::PlanError;

use crate::catalog::CatalogError;
use crate::catalog::endpoint_configuration_value;
use crate::catalog::string_map_value;
use crate::clients::AwsClients;

// ============================================================================
// SECTION: Catalog Seam
// ============================================================================

/// Read-only lookups scoped to one REST API.
#[async_trait]
pub trait RestApiCatalog: Send + Sync {
    /// Returns the API's top-level configuration.
    async fn rest_api(&self, api_id: &str) -> Result<Value, CatalogError>;

    /// Lists the API's stages.
    async fn stages(&self, api_id: &str) -> Result<Vec<Value>, CatalogError>;

    /// Lists the API's resources with their method names.
    async fn resources(&self, api_id: &str) -> Result<Vec<Value>, CatalogError>;

    /// Lists the API's authorizers.
    async fn authorizers(&self, api_id: &str) -> Result<Vec<Value>, CatalogError>;

    /// Returns the web ACL associated with one stage, or `None` when the
    /// stage has no association.
    async fn stage_web_acl(
        &self,
        api_id: &str,
        stage_name: &str,
    ) -> Result<Option<Value>, CatalogError>;

    /// Lists the API's model schemas.
    async fn models(&self, api_id: &str) -> Result<Vec<Value>, CatalogError>;

    /// Lists the API's request validators.
    async fn request_validators(&self, api_id: &str) -> Result<Vec<Value>, CatalogError>;

    /// Returns the integration behind one resource method.
    async fn integration(
        &self,
        api_id: &str,
        resource_id: &str,
        http_method: &str,
    ) -> Result<Value, CatalogError>;

    /// Returns one VPC link's details.
    async fn vpc_link(&self, vpc_link_id: &str) -> Result<Value, CatalogError>;

    /// Lists the API's documentation versions.
    async fn documentation_versions(&self, api_id: &str) -> Result<Vec<Value>, CatalogError>;

    /// Lists the API's documentation parts.
    async fn documentation_parts(&self, api_id: &str) -> Result<Vec<Value>, CatalogError>;

    /// Returns the API's tag set.
    async fn api_tags(&self, api_id: &str) -> Result<Value, CatalogError>;

    /// Lists the API's gateway responses.
    async fn gateway_responses(&self, api_id: &str) -> Result<Vec<Value>, CatalogError>;
}

// ============================================================================
// SECTION: Field Set
// ============================================================================

/// One endpoint-scope report field.
#[derive(Debug, Clone, Copy)]
enum EndpointField {
    /// Top-level API configuration.
    Api,
    /// Stage inventory.
    Stages,
    /// Number of stages.
    StagesCount,
    /// Resource inventory with method names.
    Resources,
    /// Number of resources.
    ResourcesCount,
    /// Authorizer inventory.
    Authorizers,
    /// Per-stage web ACL associations.
    Waf,
    /// Model schemas.
    Models,
    /// Request validators.
    RequestValidators,
    /// Per-resource per-method integrations.
    Integrations,
    /// Documentation versions.
    DocumentationVersions,
    /// Documentation parts.
    DocumentationParts,
    /// API tag set.
    Tags,
    /// Gateway response customizations.
    GatewayResponses,
}

impl EndpointField {
    /// Every endpoint field in report order.
    const ALL: [Self; 14] = [
        Self::Api,
        Self::Stages,
        Self::StagesCount,
        Self::Resources,
        Self::ResourcesCount,
        Self::Authorizers,
        Self::Waf,
        Self::Models,
        Self::RequestValidators,
        Self::Integrations,
        Self::DocumentationVersions,
        Self::DocumentationParts,
        Self::Tags,
        Self::GatewayResponses,
    ];

    /// The wire name of this field in the aggregation report.
    const fn name(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Stages => "stages",
            Self::StagesCount => "stagesCount",
            Self::Resources => "resources",
            Self::ResourcesCount => "resourcesCount",
            Self::Authorizers => "authorizers",
            Self::Waf => "wafConfiguration",
            Self::Models => "models",
            Self::RequestValidators => "requestValidators",
            Self::Integrations => "integrations",
            Self::DocumentationVersions => "documentationVersions",
            Self::DocumentationParts => "documentationParts",
            Self::Tags => "tags",
            Self::GatewayResponses => "gatewayResponses",
        }
    }
}

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// Fetches one endpoint field through the catalog.
struct EndpointFieldFetcher {
    /// Shared REST API catalog.
    catalog: Arc<dyn RestApiCatalog>,
    /// The field this fetcher produces.
    field: EndpointField,
}

#[async_trait]
impl FieldFetcher for EndpointFieldFetcher {
    async fn fetch(&self, target: &AggregationTarget) -> Result<Value, FetchError> {
        let catalog = self.catalog.as_ref();
        let api_id = target.key.as_str();
        let value = match self.field {
            EndpointField::Api => catalog.rest_api(api_id).await?,
            EndpointField::Stages => Value::Array(catalog.stages(api_id).await?),
            EndpointField::StagesCount => json!(catalog.stages(api_id).await?.len()),
            EndpointField::Resources => Value::Array(catalog.resources(api_id).await?),
            EndpointField::ResourcesCount => json!(catalog.resources(api_id).await?.len()),
            EndpointField::Authorizers => Value::Array(catalog.authorizers(api_id).await?),
            EndpointField::Waf => waf_configuration(catalog, api_id).await?,
            EndpointField::Models => Value::Array(catalog.models(api_id).await?),
            EndpointField::RequestValidators => {
                Value::Array(catalog.request_validators(api_id).await?)
            }
            EndpointField::Integrations => integrations_map(catalog, api_id).await?,
            EndpointField::DocumentationVersions => {
                Value::Array(catalog.documentation_versions(api_id).await?)
            }
            EndpointField::DocumentationParts => {
                Value::Array(catalog.documentation_parts(api_id).await?)
            }
            EndpointField::Tags => catalog.api_tags(api_id).await?,
            EndpointField::GatewayResponses => {
                Value::Array(catalog.gateway_responses(api_id).await?)
            }
        };
        Ok(value)
    }
}

/// Maps each stage name to its web ACL association.
///
/// A stage without an association maps to `null`; a failing lookup maps to
/// an `error` entry for that stage while the remaining stages still report.
async fn waf_configuration(
    catalog: &dyn RestApiCatalog,
    api_id: &str,
) -> Result<Value, CatalogError> {
    let stages = catalog.stages(api_id).await?;
    let mut by_stage = serde_json::Map::new();
    for stage in &stages {
        let Some(stage_name) = stage.get("stageName").and_then(Value::as_str) else {
            continue;
        };
        let entry = match catalog.stage_web_acl(api_id, stage_name).await {
            Ok(Some(acl)) => acl,
            Ok(None) => Value::Null,
            Err(error) => json!({ "error": error.to_string() }),
        };
        by_stage.insert(stage_name.to_string(), entry);
    }
    Ok(Value::Object(by_stage))
}

/// Maps each resource path to its method integrations.
///
/// A failing method lookup contributes an `error` entry for that method.
/// Resources that declare no methods are omitted from the map.
async fn integrations_map(
    catalog: &dyn RestApiCatalog,
    api_id: &str,
) -> Result<Value, CatalogError> {
    let resources = catalog.resources(api_id).await?;
    let mut by_path = serde_json::Map::new();
    for resource in &resources {
        let Some(resource_id) = resource.get("id").and_then(Value::as_str) else {
            continue;
        };
        let Some(path) = resource.get("path").and_then(Value::as_str) else {
            continue;
        };
        let methods: Vec<&str> = resource
            .get("resourceMethods")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let mut by_method = serde_json::Map::new();
        for method in methods {
            let entry = match catalog.integration(api_id, resource_id, method).await {
                Ok(integration) => expand_vpc_link(catalog, integration).await,
                Err(error) => json!({ "error": error.to_string() }),
            };
            by_method.insert(method.to_string(), entry);
        }
        if !by_method.is_empty() {
            by_path.insert(path.to_string(), Value::Object(by_method));
        }
    }
    Ok(Value::Object(by_path))
}

/// Attaches VPC link details to integrations that reference one.
///
/// A failing link lookup is recorded under `vpcLinkInfo` as an `error`
/// entry; the integration itself is preserved.
async fn expand_vpc_link(catalog: &dyn RestApiCatalog, mut integration: Value) -> Value {
    let connection_type = integration.get("connectionType").and_then(Value::as_str);
    let connection_id = integration.get("connectionId").and_then(Value::as_str);
    let link_id = match (connection_type, connection_id) {
        (Some("VPC_LINK"), Some(id)) => id.to_string(),
        _ => return integration,
    };
    let info = match catalog.vpc_link(&link_id).await {
        Ok(info) => info,
        Err(error) => json!({ "error": error.to_string() }),
    };
    if let Some(object) = integration.as_object_mut() {
        object.insert("vpcLinkInfo".to_string(), info);
    }
    integration
}

// ============================================================================
// SECTION: Plan
// ============================================================================

/// Builds the endpoint inspector's aggregation plan.
///
/// # Errors
///
/// Returns [`PlanError`] if a field name is registered twice.
pub fn endpoint_plan(catalog: Arc<dyn RestApiCatalog>) -> Result<AggregationPlan, PlanError> {
    let mut plan = AggregationPlan::new();
    for field in EndpointField::ALL {
        let fetcher = EndpointFieldFetcher {
            catalog: Arc::clone(&catalog),
            field,
        };
        plan = plan.with_step(field.name(), Box::new(fetcher))?;
    }
    Ok(plan)
}

// ============================================================================
// SECTION: SDK Catalog
// ============================================================================

/// REST API catalog backed by the live API Gateway and WAFv2 APIs.
#[derive(Debug, Clone)]
pub struct SdkRestApiCatalog {
    /// Shared service clients.
    clients: AwsClients,
}

impl SdkRestApiCatalog {
    /// Creates a catalog over the given client bundle.
    #[must_use]
    pub fn new(clients: AwsClients) -> Self {
        Self {
            clients,
        }
    }

    /// Returns the region the clients were bound to.
    ///
    /// Stage and API gateway ARNs embed the region, so ARN-addressed
    /// lookups cannot run without one.
    fn bound_region(&self) -> Result<&str, CatalogError> {
        self.clients.region.as_deref().ok_or_else(|| {
            CatalogError::MissingData("no region configured for gateway ARN lookups".to_string())
        })
    }
}

/// Renders a stage's method settings map deterministically.
fn method_settings_value(settings: Option<&HashMap<String, MethodSetting>>) -> Value {
    let mut object = serde_json::Map::new();
    if let Some(settings) = settings {
        for (key, setting) in settings {
            object.insert(
                key.clone(),
                json!({
                    "metricsEnabled": setting.metrics_enabled(),
                    "loggingLevel": setting.logging_level(),
                    "dataTraceEnabled": setting.data_trace_enabled(),
                    "throttlingBurstLimit": setting.throttling_burst_limit(),
                    "throttlingRateLimit": setting.throttling_rate_limit(),
                    "cachingEnabled": setting.caching_enabled(),
                    "cacheTtlInSeconds": setting.cache_ttl_in_seconds(),
                }),
            );
        }
    }
    Value::Object(object)
}

#[async_trait]
impl RestApiCatalog for SdkRestApiCatalog {
    async fn rest_api(&self, api_id: &str) -> Result<Value, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_rest_api()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetRestApi: {err}")))?;
        Ok(json!({
            "id": output.id(),
            "name": output.name(),
            "description": output.description(),
            "version": output.version(),
            "createdDate": output.created_date().map(|date| date.secs()),
            "apiKeySource": output.api_key_source().map(|source| source.as_str()),
            "endpointConfiguration": output
                .endpoint_configuration()
                .map(endpoint_configuration_value),
            "disableExecuteApiEndpoint": output.disable_execute_api_endpoint(),
        }))
    }

    async fn stages(&self, api_id: &str) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_stages()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetStages: {err}")))?;
        let stages = output
            .item()
            .iter()
            .map(|stage| {
                json!({
                    "stageName": stage.stage_name(),
                    "deploymentId": stage.deployment_id(),
                    "clientCertificateId": stage.client_certificate_id(),
                    "description": stage.description(),
                    "cacheClusterEnabled": stage.cache_cluster_enabled(),
                    "cacheClusterSize": stage.cache_cluster_size().map(|size| size.as_str()),
                    "cacheClusterStatus": stage
                        .cache_cluster_status()
                        .map(|status| status.as_str()),
                    "methodSettings": method_settings_value(stage.method_settings()),
                    "variables": string_map_value(stage.variables()),
                    "documentationVersion": stage.documentation_version(),
                    "accessLogSettings": stage.access_log_settings().map(|settings| json!({
                        "format": settings.format(),
                        "destinationArn": settings.destination_arn(),
                    })),
                    "tracingEnabled": stage.tracing_enabled(),
                    "webAclArn": stage.web_acl_arn(),
                    "tags": string_map_value(stage.tags()),
                    "createdDate": stage.created_date().map(|date| date.secs()),
                    "lastUpdatedDate": stage.last_updated_date().map(|date| date.secs()),
                })
            })
            .collect();
        Ok(stages)
    }

    async fn resources(&self, api_id: &str) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_resources()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetResources: {err}")))?;
        let resources = output
            .items()
            .iter()
            .map(|resource| {
                let mut methods: Vec<&str> = resource
                    .resource_methods()
                    .map(|map| map.keys().map(String::as_str).collect())
                    .unwrap_or_default();
                methods.sort_unstable();
                json!({
                    "id": resource.id(),
                    "parentId": resource.parent_id(),
                    "pathPart": resource.path_part(),
                    "path": resource.path(),
                    "resourceMethods": methods,
                })
            })
            .collect();
        Ok(resources)
    }

    async fn authorizers(&self, api_id: &str) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_authorizers()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetAuthorizers: {err}")))?;
        let authorizers = output
            .items()
            .iter()
            .map(|authorizer| {
                json!({
                    "id": authorizer.id(),
                    "name": authorizer.name(),
                    "type": authorizer.r#type().map(|kind| kind.as_str()),
                    "providerARNs": authorizer.provider_arns(),
                    "authType": authorizer.auth_type(),
                    "authorizerUri": authorizer.authorizer_uri(),
                    "authorizerCredentials": authorizer.authorizer_credentials(),
                    "identitySource": authorizer.identity_source(),
                    "identityValidationExpression": authorizer.identity_validation_expression(),
                    "authorizerResultTtlInSeconds": authorizer.authorizer_result_ttl_in_seconds(),
                })
            })
            .collect();
        Ok(authorizers)
    }

    async fn stage_web_acl(
        &self,
        api_id: &str,
        stage_name: &str,
    ) -> Result<Option<Value>, CatalogError> {
        let region = self.bound_region()?;
        let stage_arn =
            format!("arn:aws:apigateway:{region}::/restapis/{api_id}/stages/{stage_name}");
        match self
            .clients
            .wafv2
            .get_web_acl_for_resource()
            .resource_arn(stage_arn)
            .send()
            .await
        {
            Ok(output) => Ok(output.web_acl().map(|acl| {
                json!({
                    "WebACL": {
                        "Name": acl.name(),
                        "Id": acl.id(),
                        "ARN": acl.arn(),
                        "Description": acl.description(),
                    }
                })
            })),
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_waf_nonexistent_item_exception() {
                    Ok(None)
                } else {
                    Err(CatalogError::Service(format!(
                        "GetWebACLForResource: {service_error}"
                    )))
                }
            }
        }
    }

    async fn models(&self, api_id: &str) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_models()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetModels: {err}")))?;
        let models = output
            .items()
            .iter()
            .map(|model| {
                json!({
                    "id": model.id(),
                    "name": model.name(),
                    "description": model.description(),
                    "schema": model.schema(),
                    "contentType": model.content_type(),
                })
            })
            .collect();
        Ok(models)
    }

    async fn request_validators(&self, api_id: &str) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_request_validators()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetRequestValidators: {err}")))?;
        let validators = output
            .items()
            .iter()
            .map(|validator| {
                json!({
                    "id": validator.id(),
                    "name": validator.name(),
                    "validateRequestBody": validator.validate_request_body(),
                    "validateRequestParameters": validator.validate_request_parameters(),
                })
            })
            .collect();
        Ok(validators)
    }

    async fn integration(
        &self,
        api_id: &str,
        resource_id: &str,
        http_method: &str,
    ) -> Result<Value, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_integration()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method(http_method)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetIntegration: {err}")))?;
        Ok(json!({
            "type": output.r#type().map(|kind| kind.as_str()),
            "httpMethod": output.http_method(),
            "uri": output.uri(),
            "connectionType": output.connection_type().map(|kind| kind.as_str()),
            "connectionId": output.connection_id(),
            "credentials": output.credentials(),
            "requestParameters": string_map_value(output.request_parameters()),
            "requestTemplates": string_map_value(output.request_templates()),
            "passthroughBehavior": output.passthrough_behavior(),
            "contentHandling": output.content_handling().map(|kind| kind.as_str()),
            "timeoutInMillis": output.timeout_in_millis(),
            "cacheNamespace": output.cache_namespace(),
            "cacheKeyParameters": output.cache_key_parameters(),
        }))
    }

    async fn vpc_link(&self, vpc_link_id: &str) -> Result<Value, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_vpc_link()
            .vpc_link_id(vpc_link_id)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetVpcLink: {err}")))?;
        Ok(json!({
            "id": output.id(),
            "name": output.name(),
            "description": output.description(),
            "targetArns": output.target_arns(),
            "status": output.status().map(|status| status.as_str()),
            "statusMessage": output.status_message(),
        }))
    }

    async fn documentation_versions(&self, api_id: &str) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_documentation_versions()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetDocumentationVersions: {err}")))?;
        let versions = output
            .items()
            .iter()
            .map(|version| {
                json!({
                    "version": version.version(),
                    "createdDate": version.created_date().map(|date| date.secs()),
                    "description": version.description(),
                })
            })
            .collect();
        Ok(versions)
    }

    async fn documentation_parts(&self, api_id: &str) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_documentation_parts()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetDocumentationParts: {err}")))?;
        let parts = output
            .items()
            .iter()
            .map(|part| {
                json!({
                    "id": part.id(),
                    "location": part.location().map(|location| json!({
                        "type": location.r#type().as_str(),
                        "path": location.path(),
                        "method": location.method(),
                        "statusCode": location.status_code(),
                        "name": location.name(),
                    })),
                    "properties": part.properties(),
                })
            })
            .collect();
        Ok(parts)
    }

    async fn api_tags(&self, api_id: &str) -> Result<Value, CatalogError> {
        let region = self.bound_region()?;
        let resource_arn = format!("arn:aws:apigateway:{region}::/restapis/{api_id}");
        let output = self
            .clients
            .apigateway
            .get_tags()
            .resource_arn(resource_arn)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetTags: {err}")))?;
        Ok(string_map_value(output.tags()))
    }

    async fn gateway_responses(&self, api_id: &str) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_gateway_responses()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetGatewayResponses: {err}")))?;
        let responses = output
            .items()
            .iter()
            .map(|response| {
                json!({
                    "responseType": response.response_type().map(|kind| kind.as_str()),
                    "statusCode": response.status_code(),
                    "responseParameters": string_map_value(response.response_parameters()),
                    "responseTemplates": string_map_value(response.response_templates()),
                    "defaultResponse": response.default_response(),
                })
            })
            .collect();
        Ok(responses)
    }
}
