// crates/surveyor-aws/src/account.rs
// ============================================================================
// Module: Account Inspector Fields
// Description: Account-scope API Gateway aggregation fields and SDK catalog.
// Purpose: Collect account settings, domains, links, counts, and quotas.
// Dependencies: async-trait, aws-sdk-apigateway, aws-sdk-servicequotas,
//               serde_json, surveyor-core
// ============================================================================

//! ## Overview
//! The account inspector reports on region-wide API Gateway posture rather
//! than a single API. Its plan has no per-target parameters; every step reads
//! account-scope state through an [`AccountCatalog`].
//!
//! Custom domains are the one composite step: each domain's base path
//! mappings are fetched separately, and a mapping failure is recorded inside
//! that domain's entry so the remaining domains still report fully.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
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
// SECTION: Constants
// ============================================================================

/// Page size used when counting resources from a single listing call.
///
/// Counts are sampled from the first page only, so totals above this limit
/// are reported as the limit.
const COUNT_PAGE_LIMIT: i32 = 100;

// ============================================================================
// SECTION: Catalog Seam
// ============================================================================

/// Read-only account-scope API Gateway lookups.
#[async_trait]
pub trait AccountCatalog: Send + Sync {
    /// Returns account-level settings such as the CloudWatch role and
    /// throttle defaults.
    async fn account_settings(&self) -> Result<Value, CatalogError>;

    /// Lists custom domain names with their configuration details.
    async fn domain_names(&self) -> Result<Vec<Value>, CatalogError>;

    /// Lists base path mappings for one custom domain.
    async fn base_path_mappings(&self, domain_name: &str) -> Result<Vec<Value>, CatalogError>;

    /// Lists VPC links with status and target details.
    async fn vpc_links(&self) -> Result<Vec<Value>, CatalogError>;

    /// Counts API keys from the first listing page.
    async fn api_key_count(&self) -> Result<usize, CatalogError>;

    /// Counts usage plans from the first listing page.
    async fn usage_plan_count(&self) -> Result<usize, CatalogError>;

    /// Counts client certificates from the first listing page.
    async fn client_certificate_count(&self) -> Result<usize, CatalogError>;

    /// Lists the Service Quotas entries for API Gateway.
    async fn service_quotas(&self) -> Result<Vec<Value>, CatalogError>;
}

// ============================================================================
// SECTION: Field Set
// ============================================================================

/// One account-scope report field.
#[derive(Debug, Clone, Copy)]
enum AccountField {
    /// Account-level settings.
    Settings,
    /// Custom domains joined with their base path mappings.
    CustomDomains,
    /// Number of custom domains.
    DomainNamesCount,
    /// VPC link inventory.
    VpcLinks,
    /// Number of VPC links.
    VpcLinksCount,
    /// Number of API keys.
    ApiKeysCount,
    /// Number of usage plans.
    UsagePlansCount,
    /// Number of client certificates.
    ClientCertificatesCount,
    /// Service Quotas entries for API Gateway.
    Quotas,
}

impl AccountField {
    /// Every account field in report order.
    const ALL: [Self; 9] = [
        Self::Settings,
        Self::CustomDomains,
        Self::DomainNamesCount,
        Self::VpcLinks,
        Self::VpcLinksCount,
        Self::ApiKeysCount,
        Self::UsagePlansCount,
        Self::ClientCertificatesCount,
        Self::Quotas,
    ];

    /// The wire name of this field in the aggregation report.
    const fn name(self) -> &'static str {
        match self {
            Self::Settings => "accountSettings",
            Self::CustomDomains => "customDomains",
            Self::DomainNamesCount => "domainNamesCount",
            Self::VpcLinks => "vpcLinks",
            Self::VpcLinksCount => "vpcLinksCount",
            Self::ApiKeysCount => "apiKeysCount",
            Self::UsagePlansCount => "usagePlansCount",
            Self::ClientCertificatesCount => "clientCertificatesCount",
            Self::Quotas => "apigwQuotas",
        }
    }
}

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// Fetches one account field through the catalog.
struct AccountFieldFetcher {
    /// Shared account catalog.
    catalog: Arc<dyn AccountCatalog>,
    /// The field this fetcher produces.
    field: AccountField,
}

#[async_trait]
impl FieldFetcher for AccountFieldFetcher {
    async fn fetch(&self, _target: &AggregationTarget) -> Result<Value, FetchError> {
        let catalog = self.catalog.as_ref();
        let value = match self.field {
            AccountField::Settings => catalog.account_settings().await?,
            AccountField::CustomDomains => custom_domains(catalog).await?,
            AccountField::DomainNamesCount => json!(catalog.domain_names().await?.len()),
            AccountField::VpcLinks => Value::Array(catalog.vpc_links().await?),
            AccountField::VpcLinksCount => json!(catalog.vpc_links().await?.len()),
            AccountField::ApiKeysCount => json!(catalog.api_key_count().await?),
            AccountField::UsagePlansCount => json!(catalog.usage_plan_count().await?),
            AccountField::ClientCertificatesCount => {
                json!(catalog.client_certificate_count().await?)
            }
            AccountField::Quotas => Value::Array(catalog.service_quotas().await?),
        };
        Ok(value)
    }
}

/// Joins each custom domain with its base path mappings.
///
/// A mapping lookup failure is recorded inside that domain's entry; the
/// remaining domains are still reported in full.
async fn custom_domains(catalog: &dyn AccountCatalog) -> Result<Value, CatalogError> {
    let domains = catalog.domain_names().await?;
    let mut entries = Vec::with_capacity(domains.len());
    for configuration in domains {
        let Some(name) = configuration
            .get("domainName")
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            entries.push(json!({ "error": "domain entry is missing domainName" }));
            continue;
        };
        match catalog.base_path_mappings(&name).await {
            Ok(mappings) => entries.push(json!({
                "domainName": name,
                "basePathMappings": mappings,
                "configuration": configuration,
            })),
            Err(error) => entries.push(json!({
                "domainName": name,
                "error": error.to_string(),
                "configuration": configuration,
            })),
        }
    }
    Ok(Value::Array(entries))
}

// ============================================================================
// SECTION: Plan
// ============================================================================

/// Builds the account inspector's aggregation plan.
///
/// # Errors
///
/// Returns [`PlanError`] if a field name is registered twice.
pub fn account_plan(catalog: Arc<dyn AccountCatalog>) -> Result<AggregationPlan, PlanError> {
    let mut plan = AggregationPlan::new();
    for field in AccountField::ALL {
        let fetcher = AccountFieldFetcher {
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

/// Account catalog backed by the live API Gateway and Service Quotas APIs.
#[derive(Debug, Clone)]
pub struct SdkAccountCatalog {
    /// Shared service clients.
    clients: AwsClients,
}

impl SdkAccountCatalog {
    /// Creates a catalog over the given client bundle.
    #[must_use]
    pub fn new(clients: AwsClients) -> Self {
        Self {
            clients,
        }
    }
}

#[async_trait]
impl AccountCatalog for SdkAccountCatalog {
    async fn account_settings(&self) -> Result<Value, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_account()
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetAccount: {err}")))?;
        Ok(json!({
            "cloudwatchRoleArn": output.cloudwatch_role_arn(),
            "throttleSettings": output.throttle_settings().map(|settings| json!({
                "burstLimit": settings.burst_limit(),
                "rateLimit": settings.rate_limit(),
            })),
            "features": output.features(),
            "apiKeyVersion": output.api_key_version(),
        }))
    }

    async fn domain_names(&self) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_domain_names()
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetDomainNames: {err}")))?;
        let domains = output
            .items()
            .iter()
            .map(|domain| {
                json!({
                    "domainName": domain.domain_name(),
                    "certificateArn": domain.certificate_arn(),
                    "certificateUploadDate": domain.certificate_upload_date().map(|date| date.secs()),
                    "regionalDomainName": domain.regional_domain_name(),
                    "regionalHostedZoneId": domain.regional_hosted_zone_id(),
                    "regionalCertificateArn": domain.regional_certificate_arn(),
                    "distributionDomainName": domain.distribution_domain_name(),
                    "distributionHostedZoneId": domain.distribution_hosted_zone_id(),
                    "endpointConfiguration": domain
                        .endpoint_configuration()
                        .map(endpoint_configuration_value),
                    "domainNameStatus": domain.domain_name_status().map(|status| status.as_str()),
                    "securityPolicy": domain.security_policy().map(|policy| policy.as_str()),
                    "tags": string_map_value(domain.tags()),
                })
            })
            .collect();
        Ok(domains)
    }

    async fn base_path_mappings(&self, domain_name: &str) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_base_path_mappings()
            .domain_name(domain_name)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetBasePathMappings: {err}")))?;
        let mappings = output
            .items()
            .iter()
            .map(|mapping| {
                json!({
                    "basePath": mapping.base_path(),
                    "restApiId": mapping.rest_api_id(),
                    "stage": mapping.stage(),
                })
            })
            .collect();
        Ok(mappings)
    }

    async fn vpc_links(&self) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_vpc_links()
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetVpcLinks: {err}")))?;
        let links = output
            .items()
            .iter()
            .map(|link| {
                json!({
                    "id": link.id(),
                    "name": link.name(),
                    "description": link.description(),
                    "targetArns": link.target_arns(),
                    "status": link.status().map(|status| status.as_str()),
                    "statusMessage": link.status_message(),
                    "tags": string_map_value(link.tags()),
                })
            })
            .collect();
        Ok(links)
    }

    async fn api_key_count(&self) -> Result<usize, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_api_keys()
            .limit(COUNT_PAGE_LIMIT)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetApiKeys: {err}")))?;
        Ok(output.items().len())
    }

    async fn usage_plan_count(&self) -> Result<usize, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_usage_plans()
            .limit(COUNT_PAGE_LIMIT)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetUsagePlans: {err}")))?;
        Ok(output.items().len())
    }

    async fn client_certificate_count(&self) -> Result<usize, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_client_certificates()
            .limit(COUNT_PAGE_LIMIT)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetClientCertificates: {err}")))?;
        Ok(output.items().len())
    }

    async fn service_quotas(&self) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .servicequotas
            .list_service_quotas()
            .service_code("apigateway")
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("ListServiceQuotas: {err}")))?;
        let quotas = output
            .quotas()
            .iter()
            .map(|quota| {
                json!({
                    "quotaName": quota.quota_name(),
                    "quotaCode": quota.quota_code(),
                    "value": quota.value(),
                    "unit": quota.unit(),
                    "adjustable": quota.adjustable(),
                    "globalQuota": quota.global_quota(),
                })
            })
            .collect();
        Ok(quotas)
    }
}
