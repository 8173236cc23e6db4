// crates/surveyor-aws/src/clients.rs
// ============================================================================
// Module: AWS Client Bundle
// Description: Shared SDK client construction for all catalog implementations.
// Purpose: Build every service client once per process from one resolved config.
// Dependencies: aws-config, aws-sdk-*
// ============================================================================

//! ## Overview
//! All SDK clients are constructed once, at process initialization, from a
//! single resolved [`aws_config::SdkConfig`]. Region and endpoint overrides
//! come from [`ClientSettings`]; everything else (credentials, retry,
//! timeouts) uses ambient SDK resolution. Catalog implementations borrow
//! clients from this bundle and never construct their own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_config::SdkConfig;

// ============================================================================
// SECTION: Client Settings
// ============================================================================

/// Optional overrides applied while resolving the shared SDK configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientSettings {
    /// Region override; ambient resolution applies when `None`.
    pub region: Option<String>,
    /// Endpoint URL override for local stacks and tests.
    pub endpoint_url: Option<String>,
}

// ============================================================================
// SECTION: Client Bundle
// ============================================================================

/// One client per service the catalogs talk to.
#[derive(Debug, Clone)]
pub struct AwsClients {
    /// API Gateway control-plane client.
    pub apigateway: aws_sdk_apigateway::Client,
    /// CloudFormation client, used for stack-name detection signals.
    pub cloudformation: aws_sdk_cloudformation::Client,
    /// AWS Config client, used to deliver rule evaluations.
    pub config: aws_sdk_config::Client,
    /// EC2 client, used for instance and security-group inspection.
    pub ec2: aws_sdk_ec2::Client,
    /// EKS control-plane client.
    pub eks: aws_sdk_eks::Client,
    /// IAM client, used for role and OIDC-provider lookups.
    pub iam: aws_sdk_iam::Client,
    /// SES client, used by the owner-notification sink.
    pub ses: aws_sdk_ses::Client,
    /// Service Quotas client.
    pub servicequotas: aws_sdk_servicequotas::Client,
    /// STS client, used to resolve the caller account id.
    pub sts: aws_sdk_sts::Client,
    /// WAFv2 client, used for per-stage web ACL lookups.
    pub wafv2: aws_sdk_wafv2::Client,
    /// Region the bundle was resolved for, when one was resolved.
    pub region: Option<String>,
}

impl AwsClients {
    /// Resolves the shared SDK configuration and builds every client.
    pub async fn connect(settings: &ClientSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let config = loader.load().await;
        Self::from_config(&config)
    }

    /// Builds every client from an already-resolved SDK configuration.
    #[must_use]
    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            apigateway: aws_sdk_apigateway::Client::new(config),
            cloudformation: aws_sdk_cloudformation::Client::new(config),
            config: aws_sdk_config::Client::new(config),
            ec2: aws_sdk_ec2::Client::new(config),
            eks: aws_sdk_eks::Client::new(config),
            iam: aws_sdk_iam::Client::new(config),
            ses: aws_sdk_ses::Client::new(config),
            servicequotas: aws_sdk_servicequotas::Client::new(config),
            sts: aws_sdk_sts::Client::new(config),
            wafv2: aws_sdk_wafv2::Client::new(config),
            region: config.region().map(|region| region.as_ref().to_string()),
        }
    }
}
