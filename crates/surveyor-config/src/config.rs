// crates/surveyor-config/src/config.rs
// ============================================================================
// Module: Surveyor Configuration
// Description: Configuration loading and validation for surveyor hosts.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: surveyor-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path
//! limits. The `[inspector]` section is mandatory because a host cannot do
//! anything without knowing its domain; every other section carries
//! defaults. Missing or invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use surveyor_core::ConfigKeySource;
use surveyor_core::ExtractorSpec;
use surveyor_core::ResponseOptions;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "surveyor.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "SURVEYOR_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Smallest accepted usage plan listing page size.
pub(crate) const MIN_PAGE_LIMIT: i32 = 1;
/// Largest accepted usage plan listing page size.
pub(crate) const MAX_PAGE_LIMIT: i32 = 500;
/// Default usage plan listing page size.
pub(crate) const DEFAULT_PAGE_LIMIT: i32 = 100;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Surveyor host configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyorConfig {
    /// AWS client overrides.
    #[serde(default)]
    pub aws: AwsSettings,
    /// Inspection domain and extractor wiring. Mandatory.
    pub inspector: InspectorSettings,
    /// Response body post-processing.
    #[serde(default)]
    pub response: ResponseSettings,
    /// Access log enrichment settings.
    #[serde(default)]
    pub enrichment: EnrichmentSettings,
    /// Owner notification settings.
    #[serde(default)]
    pub notify: NotifySettings,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditSettings,
}

impl SurveyorConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is taken from the argument, then the `SURVEYOR_CONFIG`
    /// environment variable, then the default filename in the working
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any section is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aws.validate()?;
        self.inspector.validate()?;
        self.enrichment.validate()?;
        self.notify.validate()?;
        Ok(())
    }
}

/// AWS client overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsSettings {
    /// Region override; ambient resolution applies when unset.
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint override for local stacks.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl AwsSettings {
    /// Validates AWS override settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(region) = &self.region {
            if region.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "aws.region must be non-empty when set".to_string(),
                ));
            }
        }
        if let Some(endpoint) = &self.endpoint_url {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ConfigError::Invalid(
                    "aws.endpoint_url must be an http or https URL".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// The aggregation domain a host deployment serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectorKind {
    /// Account-scope API Gateway inventory.
    Account,
    /// Single REST API deep inspection.
    Endpoint,
    /// Single EKS cluster deep inspection.
    Cluster,
    /// API definition export.
    Definition,
    /// Access log record enrichment.
    Enrichment,
}

impl InspectorKind {
    /// Returns the config-file spelling of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Endpoint => "endpoint",
            Self::Cluster => "cluster",
            Self::Definition => "definition",
            Self::Enrichment => "enrichment",
        }
    }

    /// Returns whether this kind serves envelope invocations.
    ///
    /// The enrichment kind serves delivery stream batches instead and never
    /// parses an invocation envelope.
    #[must_use]
    pub const fn handles_envelopes(self) -> bool {
        !matches!(self, Self::Enrichment)
    }

    /// Returns whether this kind can be invoked as an AWS Config rule.
    #[must_use]
    pub const fn serves_config_rules(self) -> bool {
        matches!(self, Self::Endpoint | Self::Cluster)
    }
}

/// Inspection domain and extractor wiring.
#[derive(Debug, Clone, Deserialize)]
pub struct InspectorSettings {
    /// Which aggregation domain this deployment serves.
    pub kind: InspectorKind,
    /// Exact, case-sensitive tool-call parameter holding the target key.
    #[serde(default)]
    pub parameter_name: String,
    /// Optional tool-call parameter holding a region override.
    #[serde(default)]
    pub region_parameter: Option<String>,
    /// Config resource types this deployment accepts.
    #[serde(default)]
    pub supported_resource_types: Vec<String>,
    /// Key source for Config configuration items.
    #[serde(default)]
    pub key_source: ConfigKeySource,
    /// Resource-change request-parameter names, tried in order.
    #[serde(default)]
    pub request_parameter_names: Vec<String>,
}

impl InspectorSettings {
    /// Validates extractor wiring against the configured kind.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.kind.handles_envelopes() && self.parameter_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "inspector.parameter_name must be non-empty".to_string(),
            ));
        }
        if self.kind.serves_config_rules() && self.supported_resource_types.is_empty() {
            return Err(ConfigError::Invalid(
                "inspector.supported_resource_types must list at least one type".to_string(),
            ));
        }
        for resource_type in &self.supported_resource_types {
            if resource_type.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "inspector.supported_resource_types entries must be non-empty".to_string(),
                ));
            }
        }
        if let Some(region_parameter) = &self.region_parameter {
            if region_parameter.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "inspector.region_parameter must be non-empty when set".to_string(),
                ));
            }
        }
        for parameter in &self.request_parameter_names {
            if parameter.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "inspector.request_parameter_names entries must be non-empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Builds the extractor spec the core runtime consumes.
    #[must_use]
    pub fn extractor_spec(&self) -> ExtractorSpec {
        ExtractorSpec {
            parameter_name: self.parameter_name.clone(),
            region_parameter: self.region_parameter.clone(),
            supported_resource_types: self.supported_resource_types.clone(),
            key_source: self.key_source,
            request_parameter_names: self.request_parameter_names.clone(),
        }
    }
}

/// Response body post-processing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseSettings {
    /// Collapse runs of repeated spaces in serialized agent bodies.
    #[serde(default)]
    pub legacy_collapse_spaces: bool,
}

impl ResponseSettings {
    /// Builds the formatter options the core runtime consumes.
    #[must_use]
    pub const fn response_options(&self) -> ResponseOptions {
        ResponseOptions {
            legacy_collapse_spaces: self.legacy_collapse_spaces,
        }
    }
}

/// Access log enrichment settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentSettings {
    /// Page size for usage plan listing calls.
    #[serde(default = "default_page_limit")]
    pub page_limit: i32,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl EnrichmentSettings {
    /// Validates the listing page size.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT).contains(&self.page_limit) {
            return Err(ConfigError::Invalid(
                "enrichment.page_limit must be between 1 and 500".to_string(),
            ));
        }
        Ok(())
    }
}

/// Owner notification settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifySettings {
    /// Whether owner notifications are delivered.
    #[serde(default)]
    pub enabled: bool,
    /// Verified sender address for outgoing mail.
    #[serde(default)]
    pub sender: Option<String>,
    /// Subject prefix; the target key is appended.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            sender: None,
            subject_prefix: default_subject_prefix(),
        }
    }
}

impl NotifySettings {
    /// Validates notification settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled {
            let sender_present =
                self.sender.as_deref().is_some_and(|sender| !sender.trim().is_empty());
            if !sender_present {
                return Err(ConfigError::Invalid(
                    "notify.sender must be set when notify.enabled is true".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Structured events on standard error.
    #[default]
    Stderr,
    /// Discard every event.
    Noop,
}

/// Audit configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditSettings {
    /// Which audit sink the host installs.
    #[serde(default)]
    pub sink: AuditSinkKind,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Default usage plan listing page size.
const fn default_page_limit() -> i32 {
    DEFAULT_PAGE_LIMIT
}

/// Default notification subject prefix.
fn default_subject_prefix() -> String {
    "Configuration findings for ".to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "tests assert on known-good values")]

    use super::*;

    /// Parses a TOML string into a config without validating it.
    fn parse(toml_str: &str) -> SurveyorConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn minimal_endpoint_config_validates() {
        let config = parse(
            r#"
[inspector]
kind = "endpoint"
parameter_name = "ApiId"
supported_resource_types = ["AWS::ApiGateway::RestApi"]
"#,
        );
        config.validate().unwrap();
        assert_eq!(config.inspector.kind, InspectorKind::Endpoint);
        assert_eq!(config.enrichment.page_limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(config.audit.sink, AuditSinkKind::Stderr);
        assert!(!config.response.legacy_collapse_spaces);
        assert!(!config.notify.enabled);
    }

    #[test]
    fn missing_inspector_section_is_a_parse_error() {
        let result = toml::from_str::<SurveyorConfig>("");
        assert!(result.is_err());
    }

    #[test]
    fn enrichment_kind_needs_no_parameter_name() {
        let config = parse(
            r#"
[inspector]
kind = "enrichment"
"#,
        );
        config.validate().unwrap();
        assert!(!config.inspector.kind.handles_envelopes());
    }

    #[test]
    fn extractor_spec_mirrors_the_settings() {
        let config = parse(
            r#"
[inspector]
kind = "cluster"
parameter_name = "ClusterName"
supported_resource_types = ["AWS::EKS::Cluster"]
key_source = "resource_id"
request_parameter_names = ["clusterName", "name"]
"#,
        );
        let spec = config.inspector.extractor_spec();
        assert_eq!(spec.parameter_name, "ClusterName");
        assert_eq!(spec.supported_resource_types, vec!["AWS::EKS::Cluster"]);
        assert_eq!(spec.key_source, ConfigKeySource::ResourceId);
        assert_eq!(spec.request_parameter_names, vec!["clusterName", "name"]);
    }
}
