// crates/surveyor-aws/src/definition.rs
// ============================================================================
// Module: Definition Export
// Description: OpenAPI definition export for one REST API.
// Purpose: Retrieve the deployed API definition as YAML.
// Dependencies: async-trait, aws-sdk-apigateway, serde_json, surveyor-core
// ============================================================================

//! ## Overview
//! The definition inspector exports the OpenAPI 3.0 definition of the
//! target API's first stage, YAML-formatted with the API Gateway
//! extensions. Its plan carries a single `definition` field whose value is
//! the exported document as a string. An API without stages reports a
//! failure for that field.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use surveyor_core::AggregationPlan;
use surveyor_core::AggregationTarget;
use surveyor_core::FetchError;
use surveyor_core::FieldFetcher;
use surveyor_core::PlanError;

use crate::catalog::CatalogError;
use crate::clients::AwsClients;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Export format requested from the service.
const EXPORT_TYPE: &str = "oas30";

/// Content type requested for the exported document.
const EXPORT_ACCEPTS: &str = "application/yaml";

/// Extension set included in the export.
const EXPORT_EXTENSIONS: &str = "apigateway";

// ============================================================================
// SECTION: Catalog Seam
// ============================================================================

/// Read-only lookups for definition export.
#[async_trait]
pub trait DefinitionCatalog: Send + Sync {
    /// Lists the API's stage names in service order.
    async fn stage_names(&self, api_id: &str) -> Result<Vec<String>, CatalogError>;

    /// Exports the API definition deployed to one stage.
    async fn export_definition(
        &self,
        api_id: &str,
        stage_name: &str,
    ) -> Result<String, CatalogError>;
}

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// Fetches the exported definition of the target API's first stage.
struct DefinitionFetcher {
    /// Shared definition catalog.
    catalog: Arc<dyn DefinitionCatalog>,
}

#[async_trait]
impl FieldFetcher for DefinitionFetcher {
    async fn fetch(&self, target: &AggregationTarget) -> Result<Value, FetchError> {
        let api_id = target.key.as_str();
        let stages = self.catalog.stage_names(api_id).await?;
        let Some(first_stage) = stages.first() else {
            return Err(
                CatalogError::MissingData(format!("no stages found for API {api_id}")).into(),
            );
        };
        let definition = self.catalog.export_definition(api_id, first_stage).await?;
        Ok(Value::String(definition))
    }
}

// ============================================================================
// SECTION: Plan
// ============================================================================

/// Builds the definition inspector's single-field aggregation plan.
///
/// # Errors
///
/// Returns [`PlanError`] if the field name is registered twice, which a
/// single-step plan cannot trigger in practice.
pub fn definition_plan(catalog: Arc<dyn DefinitionCatalog>) -> Result<AggregationPlan, PlanError> {
    let fetcher = DefinitionFetcher {
        catalog,
    };
    AggregationPlan::new().with_step("definition", Box::new(fetcher))
}

// ============================================================================
// SECTION: SDK Catalog
// ============================================================================

/// Definition catalog backed by the live API Gateway API.
#[derive(Debug, Clone)]
pub struct SdkDefinitionCatalog {
    /// Shared service clients.
    clients: AwsClients,
}

impl SdkDefinitionCatalog {
    /// Creates a catalog over the given client bundle.
    #[must_use]
    pub fn new(clients: AwsClients) -> Self {
        Self {
            clients,
        }
    }
}

#[async_trait]
impl DefinitionCatalog for SdkDefinitionCatalog {
    async fn stage_names(&self, api_id: &str) -> Result<Vec<String>, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_stages()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetStages: {err}")))?;
        Ok(output
            .item()
            .iter()
            .filter_map(|stage| stage.stage_name().map(str::to_string))
            .collect())
    }

    async fn export_definition(
        &self,
        api_id: &str,
        stage_name: &str,
    ) -> Result<String, CatalogError> {
        let output = self
            .clients
            .apigateway
            .get_export()
            .rest_api_id(api_id)
            .stage_name(stage_name)
            .export_type(EXPORT_TYPE)
            .accepts(EXPORT_ACCEPTS)
            .parameters("extensions", EXPORT_EXTENSIONS)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetExport: {err}")))?;
        let body = output.body().ok_or_else(|| {
            CatalogError::MissingData("export response had no body".to_string())
        })?;
        String::from_utf8(body.as_ref().to_vec())
            .map_err(|_| CatalogError::Service("export body is not valid UTF-8".to_string()))
    }
}
