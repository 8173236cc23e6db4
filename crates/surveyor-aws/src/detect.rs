// crates/surveyor-aws/src/detect.rs
// ============================================================================
// Module: Detection Heuristics
// Description: Confidence-scored Karpenter and EKS Auto Mode detection.
// Purpose: Grade gathered signals into structured assessments.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Neither Karpenter nor EKS Auto Mode announces itself through a single
//! API field, so both are inferred from indirect signals: tagged instances,
//! installed add-ons, role and security group naming, stack naming. The
//! functions here are pure; signal gathering lives with the cluster catalog.
//!
//! Every assessment carries a `detection_confidence` grade alongside the
//! signals that produced it, so a consumer can tell direct evidence from a
//! naming coincidence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

// ============================================================================
// SECTION: Confidence
// ============================================================================

/// How strongly the gathered signals support a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionConfidence {
    /// Direct evidence: the component's own resources were observed.
    High,
    /// Circumstantial evidence only, such as matching names.
    Medium,
    /// No supporting signal.
    Low,
}

impl DetectionConfidence {
    /// Returns the lowercase wire form of this grade.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

// ============================================================================
// SECTION: Karpenter
// ============================================================================

/// Signals gathered for Karpenter detection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KarpenterSignals {
    /// Running instances tagged with a Karpenter provisioner name.
    pub tagged_running_instances: usize,
    /// Instance types observed on those instances.
    pub instance_types: Vec<String>,
    /// Name of an installed add-on whose name mentions Karpenter.
    pub addon_name: Option<String>,
    /// Version of that add-on, when the describe call returned one.
    pub addon_version: Option<String>,
    /// Whether any IAM role name mentions Karpenter.
    pub role_name_match: bool,
    /// Whether any cluster security group name mentions Karpenter.
    pub security_group_match: bool,
}

/// Karpenter detection result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KarpenterAssessment {
    /// Whether any signal supported detection.
    pub detected: bool,
    /// The grade assigned to the combined signals.
    pub detection_confidence: DetectionConfidence,
    /// Running instances tagged with a Karpenter provisioner name.
    pub provisioned_nodes: usize,
    /// Whether a Karpenter add-on is installed.
    pub addon_installed: bool,
    /// The installed add-on version, when known.
    pub version: Option<String>,
    /// Instance types observed on provisioned instances.
    pub instance_types: Vec<String>,
    /// Whether an IAM role name mentioned Karpenter.
    pub role_name_match: bool,
    /// Whether a security group name mentioned Karpenter.
    pub security_group_match: bool,
    /// The mechanism that produced these signals.
    pub detection_method: &'static str,
}

/// Grades Karpenter signals.
///
/// Provisioner-tagged instances or an installed add-on are direct evidence
/// and grade high. Role or security group names mentioning Karpenter are
/// circumstantial and grade medium on their own. Anything else grades low.
#[must_use]
pub fn assess_karpenter(signals: KarpenterSignals) -> KarpenterAssessment {
    let direct = signals.addon_name.is_some() || signals.tagged_running_instances > 0;
    let circumstantial = signals.role_name_match || signals.security_group_match;
    let detection_confidence = if direct {
        DetectionConfidence::High
    } else if circumstantial {
        DetectionConfidence::Medium
    } else {
        DetectionConfidence::Low
    };
    KarpenterAssessment {
        detected: direct || circumstantial,
        detection_confidence,
        provisioned_nodes: signals.tagged_running_instances,
        addon_installed: signals.addon_name.is_some(),
        version: signals.addon_version,
        instance_types: signals.instance_types,
        role_name_match: signals.role_name_match,
        security_group_match: signals.security_group_match,
        detection_method: "aws_api",
    }
}

// ============================================================================
// SECTION: EKS Auto Mode
// ============================================================================

/// Signals gathered for EKS Auto Mode detection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoModeSignals {
    /// Whether the cluster reports ACTIVE status.
    pub cluster_active: bool,
    /// Number of managed node groups attached to the cluster.
    pub managed_node_groups: usize,
    /// Whether self-managed node evidence was found on the cluster.
    pub self_managed_nodes: bool,
    /// Instances carrying Auto Mode tags or the Auto Mode DNS prefix.
    pub auto_mode_tagged_instances: usize,
    /// Auto scaling group names observed on cluster instances.
    pub auto_scaling_groups: Vec<String>,
    /// Whether a CloudFormation stack named for Auto Mode exists.
    pub auto_mode_stack_present: bool,
}

/// EKS Auto Mode detection result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoModeAssessment {
    /// Whether the signals point at Auto Mode managing this cluster.
    pub likely_enabled: bool,
    /// Whether managed node groups exist.
    pub managed_node_groups: bool,
    /// Whether self-managed node evidence was found.
    pub self_managed_nodes: bool,
    /// Whether Auto Mode tags or stack naming were observed.
    pub auto_mode_tags_detected: bool,
    /// Instances carrying Auto Mode tags or the Auto Mode DNS prefix.
    pub auto_mode_instance_count: usize,
    /// Auto scaling group names observed on cluster instances.
    pub auto_scaling_groups: Vec<String>,
    /// The grade assigned to the combined signals.
    pub detection_confidence: DetectionConfidence,
}

/// Grades EKS Auto Mode signals.
///
/// Tag or stack evidence is direct and grades high. An active cluster with
/// neither managed node groups nor self-managed nodes must be getting its
/// capacity from somewhere, which grades medium. Anything else grades low.
#[must_use]
pub fn assess_auto_mode(signals: AutoModeSignals) -> AutoModeAssessment {
    let tags_detected = signals.auto_mode_tagged_instances > 0 || signals.auto_mode_stack_present;
    let capacity_unaccounted = signals.cluster_active
        && signals.managed_node_groups == 0
        && !signals.self_managed_nodes;
    let detection_confidence = if tags_detected {
        DetectionConfidence::High
    } else if capacity_unaccounted {
        DetectionConfidence::Medium
    } else {
        DetectionConfidence::Low
    };
    AutoModeAssessment {
        likely_enabled: tags_detected || capacity_unaccounted,
        managed_node_groups: signals.managed_node_groups > 0,
        self_managed_nodes: signals.self_managed_nodes,
        auto_mode_tags_detected: tags_detected,
        auto_mode_instance_count: signals.auto_mode_tagged_instances,
        auto_scaling_groups: signals.auto_scaling_groups,
        detection_confidence,
    }
}
