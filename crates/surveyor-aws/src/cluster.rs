// crates/surveyor-aws/src/cluster.rs
// ============================================================================
// Module: Cluster Inspector Fields
// Description: EKS cluster aggregation fields and the EKS SDK catalog.
// Purpose: Collect the configuration surface of one EKS cluster.
// Dependencies: async-trait, aws-sdk-cloudformation, aws-sdk-ec2,
//               aws-sdk-eks, aws-sdk-iam, aws-sdk-sts, serde_json,
//               surveyor-core, urlencoding
// ============================================================================

//! ## Overview
//! The cluster inspector reports on a single EKS cluster named by the
//! aggregation target key. Listing fields walk name lists and describe each
//! entry separately: a failing describe contributes an `error` entry while
//! the remaining entries report in full.
//!
//! Two fields are heuristic. `karpenter` and `autoModeDetection` gather
//! indirect signals (tagged instances, add-on names, role and stack naming)
//! and grade them through the pure detectors in [`crate::detect`]. Signal
//! gathering is best effort: an unavailable signal defaults to absent
//! rather than failing the field.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_cloudformation::types::StackStatus;
use aws_sdk_ec2::types::Filter;
use aws_sdk_ec2::types::InstanceStateName;
use aws_sdk_ec2::types::IpPermission;
use aws_sdk_ec2::types::SecurityGroup;
use aws_sdk_eks::types::Addon;
use aws_sdk_eks::types::Cluster;
use aws_sdk_eks::types::FargateProfile;
use aws_sdk_eks::types::Nodegroup;
use serde_json::Value;
use serde_json::json;
use surveyor_core::AggregationPlan;
use surveyor_core::AggregationTarget;
use surveyor_core::FetchError;
use surveyor_core::FieldFetcher;
use surveyor_core::PlanError;

use crate::catalog::CatalogError;
use crate::catalog::string_map_value;
use crate::clients::AwsClients;
use crate::detect::AutoModeSignals;
use crate::detect::KarpenterSignals;
use crate::detect::assess_auto_mode;
use crate::detect::assess_karpenter;

// ============================================================================
// SECTION: Instance Probes
// ============================================================================

/// One EC2 instance belonging to the cluster, reduced to detection inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterInstance {
    /// The instance's tag set.
    pub tags: HashMap<String, String>,
    /// The instance's private DNS name, when assigned.
    pub private_dns_name: Option<String>,
}

/// Summary of instances tagged with a Karpenter provisioner name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KarpenterInstanceSummary {
    /// Number of those instances in the running state.
    pub running_count: usize,
    /// Distinct instance types observed, sorted.
    pub instance_types: Vec<String>,
}

// ============================================================================
// SECTION: Catalog Seam
// ============================================================================

/// Read-only lookups scoped to one EKS cluster and its surroundings.
#[async_trait]
pub trait ClusterCatalog: Send + Sync {
    /// Returns the cluster's description.
    async fn cluster(&self, cluster_name: &str) -> Result<Value, CatalogError>;

    /// Lists the cluster's managed node group names.
    async fn list_node_groups(&self, cluster_name: &str) -> Result<Vec<String>, CatalogError>;

    /// Returns one node group's description.
    async fn node_group(&self, cluster_name: &str, name: &str) -> Result<Value, CatalogError>;

    /// Lists the cluster's Fargate profile names.
    async fn list_fargate_profiles(&self, cluster_name: &str) -> Result<Vec<String>, CatalogError>;

    /// Returns one Fargate profile's description.
    async fn fargate_profile(&self, cluster_name: &str, name: &str) -> Result<Value, CatalogError>;

    /// Lists the cluster's add-on names.
    async fn list_addons(&self, cluster_name: &str) -> Result<Vec<String>, CatalogError>;

    /// Returns one add-on's description.
    async fn addon(&self, cluster_name: &str, name: &str) -> Result<Value, CatalogError>;

    /// Returns the account id of the calling identity.
    async fn caller_account(&self) -> Result<String, CatalogError>;

    /// Returns the registered OIDC provider's client ids and thumbprints,
    /// or `None` when the provider is not registered in IAM.
    async fn open_id_connect_provider(
        &self,
        provider_arn: &str,
    ) -> Result<Option<Value>, CatalogError>;

    /// Lists one role's attached managed policies.
    async fn attached_role_policies(&self, role_name: &str) -> Result<Vec<Value>, CatalogError>;

    /// Lists one role's inline policy names.
    async fn inline_policy_names(&self, role_name: &str) -> Result<Vec<String>, CatalogError>;

    /// Returns one inline policy's document.
    async fn role_policy_document(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<Value, CatalogError>;

    /// Describes the given security groups.
    async fn security_groups(&self, group_ids: &[String]) -> Result<Vec<Value>, CatalogError>;

    /// Returns whether EBS encryption by default is enabled in the region.
    async fn ebs_encryption_by_default(&self) -> Result<bool, CatalogError>;

    /// Summarizes instances tagged with a Karpenter provisioner name.
    async fn karpenter_tagged_instances(
        &self,
        cluster_name: &str,
    ) -> Result<KarpenterInstanceSummary, CatalogError>;

    /// Lists the cluster's instances reduced to detection inputs.
    async fn cluster_instances(
        &self,
        cluster_name: &str,
    ) -> Result<Vec<ClusterInstance>, CatalogError>;

    /// Lists IAM role names visible to the caller.
    async fn role_names(&self) -> Result<Vec<String>, CatalogError>;

    /// Returns whether a cluster security group name mentions Karpenter.
    async fn karpenter_security_group_match(
        &self,
        cluster_name: &str,
    ) -> Result<bool, CatalogError>;

    /// Returns whether a completed CloudFormation stack is named for EKS
    /// Auto Mode.
    async fn auto_mode_stack_present(&self) -> Result<bool, CatalogError>;
}

// ============================================================================
// SECTION: Field Set
// ============================================================================

/// One cluster-scope report field.
#[derive(Debug, Clone, Copy)]
enum ClusterField {
    /// Cluster description.
    Cluster,
    /// Managed node groups.
    NodeGroups,
    /// Fargate profiles.
    FargateProfiles,
    /// Installed add-ons.
    Addons,
    /// OIDC provider registration.
    OidcProvider,
    /// Roles and policies used by the cluster.
    IamRoles,
    /// Security groups attached to the cluster VPC config.
    SecurityGroups,
    /// Control plane log type status.
    ControlPlaneLogging,
    /// Secrets and EBS encryption posture.
    EncryptionConfig,
    /// Cluster tag set with count.
    Tags,
    /// Karpenter detection.
    Karpenter,
    /// EKS Auto Mode detection.
    AutoMode,
}

impl ClusterField {
    /// Every cluster field in report order.
    const ALL: [Self; 12] = [
        Self::Cluster,
        Self::NodeGroups,
        Self::FargateProfiles,
        Self::Addons,
        Self::OidcProvider,
        Self::IamRoles,
        Self::SecurityGroups,
        Self::ControlPlaneLogging,
        Self::EncryptionConfig,
        Self::Tags,
        Self::Karpenter,
        Self::AutoMode,
    ];

    /// The wire name of this field in the aggregation report.
    const fn name(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::NodeGroups => "nodeGroups",
            Self::FargateProfiles => "fargateProfiles",
            Self::Addons => "addons",
            Self::OidcProvider => "oidcProvider",
            Self::IamRoles => "iamRoles",
            Self::SecurityGroups => "securityGroups",
            Self::ControlPlaneLogging => "controlPlaneLogging",
            Self::EncryptionConfig => "encryptionConfig",
            Self::Tags => "tags",
            Self::Karpenter => "karpenter",
            Self::AutoMode => "autoModeDetection",
        }
    }
}

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// Fetches one cluster field through the catalog.
struct ClusterFieldFetcher {
    /// Shared cluster catalog.
    catalog: Arc<dyn ClusterCatalog>,
    /// The field this fetcher produces.
    field: ClusterField,
}

#[async_trait]
impl FieldFetcher for ClusterFieldFetcher {
    async fn fetch(&self, target: &AggregationTarget) -> Result<Value, FetchError> {
        let catalog = self.catalog.as_ref();
        let cluster_name = target.key.as_str();
        let value = match self.field {
            ClusterField::Cluster => catalog.cluster(cluster_name).await?,
            ClusterField::NodeGroups => {
                Value::Array(node_group_entries(catalog, cluster_name).await?)
            }
            ClusterField::FargateProfiles => {
                Value::Array(fargate_profile_entries(catalog, cluster_name).await?)
            }
            ClusterField::Addons => Value::Array(addon_entries(catalog, cluster_name).await?),
            ClusterField::OidcProvider => oidc_provider_field(catalog, cluster_name).await?,
            ClusterField::IamRoles => iam_roles_field(catalog, cluster_name).await?,
            ClusterField::SecurityGroups => security_groups_field(catalog, cluster_name).await?,
            ClusterField::ControlPlaneLogging => {
                control_plane_logging_field(catalog, cluster_name).await?
            }
            ClusterField::EncryptionConfig => {
                encryption_config_field(catalog, cluster_name).await?
            }
            ClusterField::Tags => tags_field(catalog, cluster_name).await?,
            ClusterField::Karpenter => karpenter_field(catalog, cluster_name).await?,
            ClusterField::AutoMode => auto_mode_field(catalog, cluster_name).await?,
        };
        Ok(value)
    }
}

// ============================================================================
// SECTION: Field Assembly
// ============================================================================

/// Describes every managed node group, isolating per-group failures.
async fn node_group_entries(
    catalog: &dyn ClusterCatalog,
    cluster_name: &str,
) -> Result<Vec<Value>, CatalogError> {
    let names = catalog.list_node_groups(cluster_name).await?;
    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        match catalog.node_group(cluster_name, &name).await {
            Ok(group) => entries.push(group),
            Err(error) => entries.push(json!({
                "nodegroupName": name,
                "error": error.to_string(),
            })),
        }
    }
    Ok(entries)
}

/// Describes every Fargate profile, isolating per-profile failures.
async fn fargate_profile_entries(
    catalog: &dyn ClusterCatalog,
    cluster_name: &str,
) -> Result<Vec<Value>, CatalogError> {
    let names = catalog.list_fargate_profiles(cluster_name).await?;
    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        match catalog.fargate_profile(cluster_name, &name).await {
            Ok(profile) => entries.push(profile),
            Err(error) => entries.push(json!({
                "fargateProfileName": name,
                "error": error.to_string(),
            })),
        }
    }
    Ok(entries)
}

/// Describes every add-on, isolating per-addon failures.
async fn addon_entries(
    catalog: &dyn ClusterCatalog,
    cluster_name: &str,
) -> Result<Vec<Value>, CatalogError> {
    let names = catalog.list_addons(cluster_name).await?;
    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        match catalog.addon(cluster_name, &name).await {
            Ok(addon) => entries.push(addon),
            Err(error) => entries.push(json!({
                "addonName": name,
                "error": error.to_string(),
            })),
        }
    }
    Ok(entries)
}

/// Resolves the cluster's OIDC provider registration.
///
/// A cluster without an OIDC issuer reports `null`. An issuer whose
/// provider is not registered in IAM reports `configured: false`.
async fn oidc_provider_field(
    catalog: &dyn ClusterCatalog,
    cluster_name: &str,
) -> Result<Value, CatalogError> {
    let cluster = catalog.cluster(cluster_name).await?;
    let Some(issuer) = cluster
        .pointer("/identity/oidc/issuer")
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        return Ok(Value::Null);
    };
    let account = catalog.caller_account().await?;
    let provider_id = issuer.strip_prefix("https://").unwrap_or(&issuer);
    let provider_arn = format!("arn:aws:iam::{account}:oidc-provider/{provider_id}");
    match catalog.open_id_connect_provider(&provider_arn).await? {
        Some(details) => Ok(json!({
            "url": issuer,
            "arn": provider_arn,
            "clientIDs": details.get("clientIDs").cloned().unwrap_or_default(),
            "thumbprint": details.get("thumbprint").cloned().unwrap_or_default(),
        })),
        None => Ok(json!({
            "url": issuer,
            "configured": false,
        })),
    }
}

/// Collects the roles the cluster relies on with their policies.
///
/// Keys are `clusterRole`, `nodeGroup_{name}`, and `fargateProfile_{name}`.
/// A role whose policies cannot be listed carries a single `error` entry in
/// its policy list.
async fn iam_roles_field(
    catalog: &dyn ClusterCatalog,
    cluster_name: &str,
) -> Result<Value, CatalogError> {
    let cluster = catalog.cluster(cluster_name).await?;
    let mut roles = serde_json::Map::new();
    if let Some(role_arn) = cluster.get("roleArn").and_then(Value::as_str) {
        roles.insert("clusterRole".to_string(), role_entry(catalog, role_arn).await);
    }
    for group in node_group_entries(catalog, cluster_name).await? {
        let name = group.get("nodegroupName").and_then(Value::as_str);
        let role_arn = group.get("nodeRole").and_then(Value::as_str);
        if let (Some(name), Some(role_arn)) = (name, role_arn) {
            roles.insert(format!("nodeGroup_{name}"), role_entry(catalog, role_arn).await);
        }
    }
    for profile in fargate_profile_entries(catalog, cluster_name).await? {
        let name = profile.get("fargateProfileName").and_then(Value::as_str);
        let role_arn = profile.get("podExecutionRoleArn").and_then(Value::as_str);
        if let (Some(name), Some(role_arn)) = (name, role_arn) {
            roles.insert(
                format!("fargateProfile_{name}"),
                role_entry(catalog, role_arn).await,
            );
        }
    }
    Ok(Value::Object(roles))
}

/// Builds one role's report entry.
async fn role_entry(catalog: &dyn ClusterCatalog, role_arn: &str) -> Value {
    json!({
        "roleArn": role_arn,
        "policies": role_policies(catalog, role_arn).await,
    })
}

/// Lists one role's policies, reducing any failure to an `error` entry.
async fn role_policies(catalog: &dyn ClusterCatalog, role_arn: &str) -> Value {
    match gather_role_policies(catalog, role_arn).await {
        Ok(policies) => Value::Array(policies),
        Err(error) => json!([{ "error": error.to_string() }]),
    }
}

/// Lists one role's managed and inline policies.
async fn gather_role_policies(
    catalog: &dyn ClusterCatalog,
    role_arn: &str,
) -> Result<Vec<Value>, CatalogError> {
    let role_name = role_name_from_arn(role_arn);
    let mut policies = catalog.attached_role_policies(role_name).await?;
    for policy_name in catalog.inline_policy_names(role_name).await? {
        let document = catalog.role_policy_document(role_name, &policy_name).await?;
        policies.push(json!({
            "policyName": policy_name,
            "policyDocument": document,
            "type": "inline",
        }));
    }
    Ok(policies)
}

/// Extracts the role name from a role ARN.
fn role_name_from_arn(role_arn: &str) -> &str {
    if let Some((_, name)) = role_arn.rsplit_once('/') {
        name
    } else if let Some((_, name)) = role_arn.rsplit_once(':') {
        name
    } else {
        role_arn
    }
}

/// Describes the security groups referenced by the cluster VPC config.
async fn security_groups_field(
    catalog: &dyn ClusterCatalog,
    cluster_name: &str,
) -> Result<Value, CatalogError> {
    let cluster = catalog.cluster(cluster_name).await?;
    let Some(vpc_config) = cluster.get("resourcesVpcConfig") else {
        return Ok(json!([]));
    };
    let mut group_ids: Vec<String> = vpc_config
        .get("securityGroupIds")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if let Some(cluster_group) = vpc_config
        .get("clusterSecurityGroupId")
        .and_then(Value::as_str)
    {
        if !group_ids.iter().any(|id| id == cluster_group) {
            group_ids.push(cluster_group.to_string());
        }
    }
    if group_ids.is_empty() {
        return Ok(json!([]));
    }
    Ok(Value::Array(catalog.security_groups(&group_ids).await?))
}

/// Splits the cluster's control plane log types by enablement.
async fn control_plane_logging_field(
    catalog: &dyn ClusterCatalog,
    cluster_name: &str,
) -> Result<Value, CatalogError> {
    let cluster = catalog.cluster(cluster_name).await?;
    let mut enabled = Vec::new();
    let mut disabled = Vec::new();
    if let Some(configs) = cluster
        .pointer("/logging/clusterLogging")
        .and_then(Value::as_array)
    {
        for config in configs {
            let types = config
                .get("types")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if config.get("enabled").and_then(Value::as_bool).unwrap_or(false) {
                enabled.extend(types);
            } else {
                disabled.extend(types);
            }
        }
    }
    Ok(json!({
        "enabled": enabled,
        "disabled": disabled,
    }))
}

/// Reports the cluster's secrets encryption and the region's EBS default.
///
/// The EBS default lookup is best effort and reports `false` when the call
/// is not permitted.
async fn encryption_config_field(
    catalog: &dyn ClusterCatalog,
    cluster_name: &str,
) -> Result<Value, CatalogError> {
    let cluster = catalog.cluster(cluster_name).await?;
    let config = cluster
        .get("encryptionConfig")
        .cloned()
        .unwrap_or_else(|| json!([]));
    let enabled = config.as_array().is_some_and(|entries| !entries.is_empty());
    let default_encryption = catalog.ebs_encryption_by_default().await.unwrap_or_default();
    Ok(json!({
        "secrets_encryption": {
            "enabled": enabled,
            "config": config,
        },
        "ebs_encryption": {
            "default_encryption": default_encryption,
        },
    }))
}

/// Reports the cluster's tag set with its count.
async fn tags_field(
    catalog: &dyn ClusterCatalog,
    cluster_name: &str,
) -> Result<Value, CatalogError> {
    let cluster = catalog.cluster(cluster_name).await?;
    let tags = cluster
        .get("tags")
        .cloned()
        .unwrap_or_else(|| json!({}));
    let tag_count = tags.as_object().map_or(0, serde_json::Map::len);
    Ok(json!({
        "tags": tags,
        "tag_count": tag_count,
    }))
}

/// Gathers Karpenter signals and grades them.
///
/// Every signal is best effort; an unavailable signal counts as absent.
async fn karpenter_field(
    catalog: &dyn ClusterCatalog,
    cluster_name: &str,
) -> Result<Value, CatalogError> {
    let summary = catalog
        .karpenter_tagged_instances(cluster_name)
        .await
        .unwrap_or_default();
    let mut addon_name = None;
    let mut addon_version = None;
    if let Ok(names) = catalog.list_addons(cluster_name).await {
        if let Some(found) = names
            .iter()
            .find(|name| name.to_lowercase().contains("karpenter"))
        {
            addon_name = Some(found.clone());
            if let Ok(addon) = catalog.addon(cluster_name, found).await {
                addon_version = addon
                    .get("addonVersion")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
        }
    }
    let role_name_match = catalog
        .role_names()
        .await
        .map(|names| {
            names
                .iter()
                .any(|name| name.to_lowercase().contains("karpenter"))
        })
        .unwrap_or_default();
    let security_group_match = catalog
        .karpenter_security_group_match(cluster_name)
        .await
        .unwrap_or_default();
    let assessment = assess_karpenter(KarpenterSignals {
        tagged_running_instances: summary.running_count,
        instance_types: summary.instance_types,
        addon_name,
        addon_version,
        role_name_match,
        security_group_match,
    });
    serde_json::to_value(assessment)
        .map_err(|err| CatalogError::Service(format!("assessment encoding failed: {err}")))
}

/// Gathers EKS Auto Mode signals and grades them.
///
/// The cluster description and node group list are required; the instance
/// and stack probes are best effort.
async fn auto_mode_field(
    catalog: &dyn ClusterCatalog,
    cluster_name: &str,
) -> Result<Value, CatalogError> {
    let cluster = catalog.cluster(cluster_name).await?;
    let managed_node_groups = catalog.list_node_groups(cluster_name).await?.len();
    let cluster_active = cluster.get("status").and_then(Value::as_str) == Some("ACTIVE");
    let self_managed_nodes = self_managed_node_evidence(&cluster);
    let (auto_mode_tagged_instances, auto_scaling_groups) =
        match catalog.cluster_instances(cluster_name).await {
            Ok(instances) => auto_mode_instance_signals(&instances),
            Err(_) => (0, Vec::new()),
        };
    let auto_mode_stack_present = catalog.auto_mode_stack_present().await.unwrap_or_default();
    let assessment = assess_auto_mode(AutoModeSignals {
        cluster_active,
        managed_node_groups,
        self_managed_nodes,
        auto_mode_tagged_instances,
        auto_scaling_groups,
        auto_mode_stack_present,
    });
    serde_json::to_value(assessment)
        .map_err(|err| CatalogError::Service(format!("assessment encoding failed: {err}")))
}

/// Probes the cluster description for self-managed node evidence.
fn self_managed_node_evidence(cluster: &Value) -> bool {
    if cluster.get("nodeGroups").is_some() || cluster.get("selfManagedNodeGroups").is_some() {
        return true;
    }
    cluster
        .pointer("/resources/autoScalingGroups")
        .and_then(Value::as_array)
        .is_some_and(|groups| {
            groups
                .iter()
                .any(|group| group.get("instanceType").is_some())
        })
}

/// Counts Auto Mode tagged instances and collects their scaling groups.
fn auto_mode_instance_signals(instances: &[ClusterInstance]) -> (usize, Vec<String>) {
    let mut tagged = 0;
    let mut scaling_groups = BTreeSet::new();
    for instance in instances {
        let tag_hit = instance.tags.contains_key("eks:auto-mode")
            || instance.tags.contains_key("eks:auto-scaling-group");
        let dns_hit = instance
            .private_dns_name
            .as_deref()
            .is_some_and(|dns| dns.starts_with("eks-auto-"));
        if tag_hit || dns_hit {
            tagged += 1;
        }
        if let Some(group) = instance.tags.get("aws:autoscaling:groupName") {
            scaling_groups.insert(group.clone());
        }
    }
    (tagged, scaling_groups.into_iter().collect())
}

// ============================================================================
// SECTION: Plan
// ============================================================================

/// Builds the cluster inspector's aggregation plan.
///
/// # Errors
///
/// Returns [`PlanError`] if a field name is registered twice.
pub fn cluster_plan(catalog: Arc<dyn ClusterCatalog>) -> Result<AggregationPlan, PlanError> {
    let mut plan = AggregationPlan::new();
    for field in ClusterField::ALL {
        let fetcher = ClusterFieldFetcher {
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

/// Cluster catalog backed by the live EKS, EC2, IAM, STS, and
/// CloudFormation APIs.
#[derive(Debug, Clone)]
pub struct SdkClusterCatalog {
    /// Shared service clients.
    clients: AwsClients,
}

impl SdkClusterCatalog {
    /// Creates a catalog over the given client bundle.
    #[must_use]
    pub fn new(clients: AwsClients) -> Self {
        Self {
            clients,
        }
    }
}

#[async_trait]
impl ClusterCatalog for SdkClusterCatalog {
    async fn cluster(&self, cluster_name: &str) -> Result<Value, CatalogError> {
        let output = self
            .clients
            .eks
            .describe_cluster()
            .name(cluster_name)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("DescribeCluster: {err}")))?;
        let cluster = output.cluster().ok_or_else(|| {
            CatalogError::MissingData("cluster not present in response".to_string())
        })?;
        Ok(cluster_value(cluster))
    }

    async fn list_node_groups(&self, cluster_name: &str) -> Result<Vec<String>, CatalogError> {
        let output = self
            .clients
            .eks
            .list_nodegroups()
            .cluster_name(cluster_name)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("ListNodegroups: {err}")))?;
        Ok(output.nodegroups().to_vec())
    }

    async fn node_group(&self, cluster_name: &str, name: &str) -> Result<Value, CatalogError> {
        let output = self
            .clients
            .eks
            .describe_nodegroup()
            .cluster_name(cluster_name)
            .nodegroup_name(name)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("DescribeNodegroup: {err}")))?;
        let group = output.nodegroup().ok_or_else(|| {
            CatalogError::MissingData("nodegroup not present in response".to_string())
        })?;
        Ok(nodegroup_value(group))
    }

    async fn list_fargate_profiles(
        &self,
        cluster_name: &str,
    ) -> Result<Vec<String>, CatalogError> {
        let output = self
            .clients
            .eks
            .list_fargate_profiles()
            .cluster_name(cluster_name)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("ListFargateProfiles: {err}")))?;
        Ok(output.fargate_profile_names().to_vec())
    }

    async fn fargate_profile(
        &self,
        cluster_name: &str,
        name: &str,
    ) -> Result<Value, CatalogError> {
        let output = self
            .clients
            .eks
            .describe_fargate_profile()
            .cluster_name(cluster_name)
            .fargate_profile_name(name)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("DescribeFargateProfile: {err}")))?;
        let profile = output.fargate_profile().ok_or_else(|| {
            CatalogError::MissingData("fargate profile not present in response".to_string())
        })?;
        Ok(fargate_profile_value(profile))
    }

    async fn list_addons(&self, cluster_name: &str) -> Result<Vec<String>, CatalogError> {
        let output = self
            .clients
            .eks
            .list_addons()
            .cluster_name(cluster_name)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("ListAddons: {err}")))?;
        Ok(output.addons().to_vec())
    }

    async fn addon(&self, cluster_name: &str, name: &str) -> Result<Value, CatalogError> {
        let output = self
            .clients
            .eks
            .describe_addon()
            .cluster_name(cluster_name)
            .addon_name(name)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("DescribeAddon: {err}")))?;
        let addon = output.addon().ok_or_else(|| {
            CatalogError::MissingData("addon not present in response".to_string())
        })?;
        Ok(addon_value(addon))
    }

    async fn caller_account(&self) -> Result<String, CatalogError> {
        let output = self
            .clients
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetCallerIdentity: {err}")))?;
        output.account().map(str::to_string).ok_or_else(|| {
            CatalogError::MissingData("caller identity did not include an account id".to_string())
        })
    }

    async fn open_id_connect_provider(
        &self,
        provider_arn: &str,
    ) -> Result<Option<Value>, CatalogError> {
        // A provider that is not registered surfaces as a service error;
        // the caller only needs registered-or-not.
        match self
            .clients
            .iam
            .get_open_id_connect_provider()
            .open_id_connect_provider_arn(provider_arn)
            .send()
            .await
        {
            Ok(output) => Ok(Some(json!({
                "clientIDs": output.client_id_list(),
                "thumbprint": output.thumbprint_list(),
            }))),
            Err(_) => Ok(None),
        }
    }

    async fn attached_role_policies(&self, role_name: &str) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .iam
            .list_attached_role_policies()
            .role_name(role_name)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("ListAttachedRolePolicies: {err}")))?;
        let policies = output
            .attached_policies()
            .iter()
            .map(|policy| {
                json!({
                    "policyName": policy.policy_name(),
                    "policyArn": policy.policy_arn(),
                    "type": "managed",
                })
            })
            .collect();
        Ok(policies)
    }

    async fn inline_policy_names(&self, role_name: &str) -> Result<Vec<String>, CatalogError> {
        let output = self
            .clients
            .iam
            .list_role_policies()
            .role_name(role_name)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("ListRolePolicies: {err}")))?;
        Ok(output.policy_names().to_vec())
    }

    async fn role_policy_document(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<Value, CatalogError> {
        let output = self
            .clients
            .iam
            .get_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetRolePolicy: {err}")))?;
        Ok(policy_document_value(output.policy_document()))
    }

    async fn security_groups(&self, group_ids: &[String]) -> Result<Vec<Value>, CatalogError> {
        let output = self
            .clients
            .ec2
            .describe_security_groups()
            .set_group_ids(Some(group_ids.to_vec()))
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("DescribeSecurityGroups: {err}")))?;
        Ok(output
            .security_groups()
            .iter()
            .map(security_group_value)
            .collect())
    }

    async fn ebs_encryption_by_default(&self) -> Result<bool, CatalogError> {
        let output = self
            .clients
            .ec2
            .get_ebs_encryption_by_default()
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("GetEbsEncryptionByDefault: {err}")))?;
        Ok(output.ebs_encryption_by_default().unwrap_or_default())
    }

    async fn karpenter_tagged_instances(
        &self,
        cluster_name: &str,
    ) -> Result<KarpenterInstanceSummary, CatalogError> {
        let output = self
            .clients
            .ec2
            .describe_instances()
            .filters(
                Filter::builder()
                    .name("tag:eks:cluster-name")
                    .values(cluster_name)
                    .build(),
            )
            .filters(
                Filter::builder()
                    .name("tag:karpenter.sh/provisioner-name")
                    .values("*")
                    .build(),
            )
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("DescribeInstances: {err}")))?;
        let mut running_count = 0;
        let mut instance_types = BTreeSet::new();
        for reservation in output.reservations() {
            for instance in reservation.instances() {
                let running = instance.state().and_then(|state| state.name())
                    == Some(&InstanceStateName::Running);
                if running {
                    running_count += 1;
                    if let Some(instance_type) = instance.instance_type() {
                        instance_types.insert(instance_type.as_str().to_string());
                    }
                }
            }
        }
        Ok(KarpenterInstanceSummary {
            running_count,
            instance_types: instance_types.into_iter().collect(),
        })
    }

    async fn cluster_instances(
        &self,
        cluster_name: &str,
    ) -> Result<Vec<ClusterInstance>, CatalogError> {
        let output = self
            .clients
            .ec2
            .describe_instances()
            .filters(
                Filter::builder()
                    .name("tag:eks:cluster-name")
                    .values(cluster_name)
                    .build(),
            )
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("DescribeInstances: {err}")))?;
        let mut instances = Vec::new();
        for reservation in output.reservations() {
            for instance in reservation.instances() {
                let tags = instance
                    .tags()
                    .iter()
                    .filter_map(|tag| Some((tag.key()?.to_string(), tag.value()?.to_string())))
                    .collect();
                instances.push(ClusterInstance {
                    tags,
                    private_dns_name: instance.private_dns_name().map(str::to_string),
                });
            }
        }
        Ok(instances)
    }

    async fn role_names(&self) -> Result<Vec<String>, CatalogError> {
        let output = self
            .clients
            .iam
            .list_roles()
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("ListRoles: {err}")))?;
        Ok(output
            .roles()
            .iter()
            .map(|role| role.role_name().to_string())
            .collect())
    }

    async fn karpenter_security_group_match(
        &self,
        cluster_name: &str,
    ) -> Result<bool, CatalogError> {
        let output = self
            .clients
            .ec2
            .describe_security_groups()
            .filters(
                Filter::builder()
                    .name("tag:eks:cluster-name")
                    .values(cluster_name)
                    .build(),
            )
            .filters(
                Filter::builder()
                    .name("group-name")
                    .values("*karpenter*")
                    .build(),
            )
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("DescribeSecurityGroups: {err}")))?;
        Ok(!output.security_groups().is_empty())
    }

    async fn auto_mode_stack_present(&self) -> Result<bool, CatalogError> {
        let output = self
            .clients
            .cloudformation
            .list_stacks()
            .stack_status_filter(StackStatus::CreateComplete)
            .stack_status_filter(StackStatus::UpdateComplete)
            .send()
            .await
            .map_err(|err| CatalogError::Service(format!("ListStacks: {err}")))?;
        Ok(output
            .stack_summaries()
            .iter()
            .any(|stack| stack.stack_name().to_lowercase().contains("eks-auto-mode")))
    }
}

// ============================================================================
// SECTION: Reshape Helpers
// ============================================================================

/// Renders a cluster description with the wire keys consumers expect.
fn cluster_value(cluster: &Cluster) -> Value {
    json!({
        "name": cluster.name(),
        "arn": cluster.arn(),
        "createdAt": cluster.created_at().map(|date| date.secs()),
        "version": cluster.version(),
        "endpoint": cluster.endpoint(),
        "roleArn": cluster.role_arn(),
        "resourcesVpcConfig": cluster.resources_vpc_config().map(|vpc| json!({
            "subnetIds": vpc.subnet_ids(),
            "securityGroupIds": vpc.security_group_ids(),
            "clusterSecurityGroupId": vpc.cluster_security_group_id(),
            "vpcId": vpc.vpc_id(),
            "endpointPublicAccess": vpc.endpoint_public_access(),
            "endpointPrivateAccess": vpc.endpoint_private_access(),
            "publicAccessCidrs": vpc.public_access_cidrs(),
        })),
        "identity": cluster.identity().map(|identity| json!({
            "oidc": identity.oidc().map(|oidc| json!({ "issuer": oidc.issuer() })),
        })),
        "status": cluster.status().map(|status| status.as_str()),
        "certificateAuthority": cluster
            .certificate_authority()
            .map(|authority| json!({ "data": authority.data() })),
        "platformVersion": cluster.platform_version(),
        "logging": cluster.logging().map(|logging| json!({
            "clusterLogging": logging.cluster_logging().iter().map(|setup| json!({
                "types": setup.types().iter().map(|kind| kind.as_str()).collect::<Vec<_>>(),
                "enabled": setup.enabled(),
            })).collect::<Vec<_>>(),
        })),
        "encryptionConfig": cluster.encryption_config().iter().map(|config| json!({
            "resources": config.resources(),
            "provider": config.provider().map(|provider| json!({ "keyArn": provider.key_arn() })),
        })).collect::<Vec<_>>(),
        "tags": string_map_value(cluster.tags()),
    })
}

/// Renders a managed node group description.
fn nodegroup_value(group: &Nodegroup) -> Value {
    json!({
        "nodegroupName": group.nodegroup_name(),
        "nodegroupArn": group.nodegroup_arn(),
        "clusterName": group.cluster_name(),
        "version": group.version(),
        "releaseVersion": group.release_version(),
        "createdAt": group.created_at().map(|date| date.secs()),
        "modifiedAt": group.modified_at().map(|date| date.secs()),
        "status": group.status().map(|status| status.as_str()),
        "capacityType": group.capacity_type().map(|kind| kind.as_str()),
        "scalingConfig": group.scaling_config().map(|scaling| json!({
            "minSize": scaling.min_size(),
            "maxSize": scaling.max_size(),
            "desiredSize": scaling.desired_size(),
        })),
        "instanceTypes": group.instance_types(),
        "subnets": group.subnets(),
        "amiType": group.ami_type().map(|kind| kind.as_str()),
        "nodeRole": group.node_role(),
        "labels": string_map_value(group.labels()),
        "diskSize": group.disk_size(),
        "tags": string_map_value(group.tags()),
    })
}

/// Renders a Fargate profile description.
fn fargate_profile_value(profile: &FargateProfile) -> Value {
    json!({
        "fargateProfileName": profile.fargate_profile_name(),
        "fargateProfileArn": profile.fargate_profile_arn(),
        "clusterName": profile.cluster_name(),
        "createdAt": profile.created_at().map(|date| date.secs()),
        "podExecutionRoleArn": profile.pod_execution_role_arn(),
        "subnets": profile.subnets(),
        "selectors": profile.selectors().iter().map(|selector| json!({
            "namespace": selector.namespace(),
            "labels": string_map_value(selector.labels()),
        })).collect::<Vec<_>>(),
        "status": profile.status().map(|status| status.as_str()),
        "tags": string_map_value(profile.tags()),
    })
}

/// Renders an add-on description.
fn addon_value(addon: &Addon) -> Value {
    json!({
        "addonName": addon.addon_name(),
        "addonArn": addon.addon_arn(),
        "clusterName": addon.cluster_name(),
        "status": addon.status().map(|status| status.as_str()),
        "addonVersion": addon.addon_version(),
        "serviceAccountRoleArn": addon.service_account_role_arn(),
        "createdAt": addon.created_at().map(|date| date.secs()),
        "modifiedAt": addon.modified_at().map(|date| date.secs()),
        "tags": string_map_value(addon.tags()),
    })
}

/// Renders a security group description.
fn security_group_value(group: &SecurityGroup) -> Value {
    json!({
        "GroupId": group.group_id(),
        "GroupName": group.group_name(),
        "Description": group.description(),
        "VpcId": group.vpc_id(),
        "OwnerId": group.owner_id(),
        "IpPermissions": group
            .ip_permissions()
            .iter()
            .map(ip_permission_value)
            .collect::<Vec<_>>(),
        "IpPermissionsEgress": group
            .ip_permissions_egress()
            .iter()
            .map(ip_permission_value)
            .collect::<Vec<_>>(),
        "Tags": group.tags().iter().map(|tag| json!({
            "Key": tag.key(),
            "Value": tag.value(),
        })).collect::<Vec<_>>(),
    })
}

/// Renders one security group rule.
fn ip_permission_value(permission: &IpPermission) -> Value {
    json!({
        "IpProtocol": permission.ip_protocol(),
        "FromPort": permission.from_port(),
        "ToPort": permission.to_port(),
        "IpRanges": permission.ip_ranges().iter().map(|range| json!({
            "CidrIp": range.cidr_ip(),
            "Description": range.description(),
        })).collect::<Vec<_>>(),
        "UserIdGroupPairs": permission.user_id_group_pairs().iter().map(|pair| json!({
            "GroupId": pair.group_id(),
            "Description": pair.description(),
        })).collect::<Vec<_>>(),
    })
}

/// Decodes an inline policy document from its URL-encoded wire form.
///
/// The document is delivered RFC 3986 encoded; a document that does not
/// decode or parse is reported as the string the service returned.
fn policy_document_value(document: &str) -> Value {
    match urlencoding::decode(document) {
        Ok(decoded) => serde_json::from_str(&decoded)
            .unwrap_or_else(|_| Value::String(decoded.into_owned())),
        Err(_) => Value::String(document.to_string()),
    }
}
