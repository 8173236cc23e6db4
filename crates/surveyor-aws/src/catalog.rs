// crates/surveyor-aws/src/catalog.rs
// ============================================================================
// Module: Catalog Support
// Description: Shared error type and reshape helpers for service catalogs.
// Purpose: Give every catalog one failure vocabulary and common JSON reshaping.
// Dependencies: serde_json, surveyor-core, thiserror
// ============================================================================

//! ## Overview
//! Catalog implementations translate SDK outputs into plain JSON values for
//! the aggregation report. Failures are carried as [`CatalogError`] and
//! convert losslessly into the core [`FetchError`] at the fetcher boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use aws_sdk_apigateway::types::EndpointConfiguration;
use serde_json::Value;
use serde_json::json;
use surveyor_core::FetchError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures raised by service catalog implementations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The underlying service call failed.
    #[error("service call failed: {0}")]
    Service(String),
    /// The service responded without data the caller requires.
    #[error("required data missing: {0}")]
    MissingData(String),
}

impl From<CatalogError> for FetchError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::Service(message) => Self::Service(message),
            CatalogError::MissingData(message) => Self::MissingData(message),
        }
    }
}

// ============================================================================
// SECTION: Reshape Helpers
// ============================================================================

/// Renders an optional string-to-string tag map as a deterministic JSON object.
pub(crate) fn string_map_value(map: Option<&HashMap<String, String>>) -> Value {
    let mut object = serde_json::Map::new();
    if let Some(map) = map {
        for (key, value) in map {
            object.insert(key.clone(), Value::String(value.clone()));
        }
    }
    Value::Object(object)
}

/// Renders an API Gateway endpoint configuration.
pub(crate) fn endpoint_configuration_value(config: &EndpointConfiguration) -> Value {
    json!({
        "types": config.types().iter().map(|kind| kind.as_str()).collect::<Vec<_>>(),
        "vpcEndpointIds": config.vpc_endpoint_ids(),
    })
}
