// crates/surveyor-aws/tests/detection.rs
// ============================================================================
// Module: Detection Grading Tests
// Description: Tests for Karpenter and EKS Auto Mode signal grading.
// ============================================================================
//! ## Overview
//! Exercises the pure grading rules: direct evidence grades high,
//! circumstantial evidence grades medium, and an empty signal set grades
//! low without claiming a detection.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use surveyor_aws::AutoModeSignals;
use surveyor_aws::DetectionConfidence;
use surveyor_aws::KarpenterSignals;
use surveyor_aws::assess_auto_mode;
use surveyor_aws::assess_karpenter;

// ============================================================================
// SECTION: Karpenter
// ============================================================================

#[test]
fn provisioned_instances_grade_high() {
    let assessment = assess_karpenter(KarpenterSignals {
        tagged_running_instances: 3,
        instance_types: vec!["m5.large".to_string()],
        ..KarpenterSignals::default()
    });

    assert!(assessment.detected);
    assert_eq!(assessment.detection_confidence, DetectionConfidence::High);
    assert_eq!(assessment.provisioned_nodes, 3);
    assert!(!assessment.addon_installed);
}

#[test]
fn installed_addon_grades_high_without_instances() {
    let assessment = assess_karpenter(KarpenterSignals {
        addon_name: Some("karpenter".to_string()),
        addon_version: Some("v1.2.3".to_string()),
        ..KarpenterSignals::default()
    });

    assert!(assessment.detected);
    assert_eq!(assessment.detection_confidence, DetectionConfidence::High);
    assert!(assessment.addon_installed);
    assert_eq!(assessment.version.as_deref(), Some("v1.2.3"));
}

#[test]
fn name_matches_alone_grade_medium() {
    let by_role = assess_karpenter(KarpenterSignals {
        role_name_match: true,
        ..KarpenterSignals::default()
    });
    assert!(by_role.detected);
    assert_eq!(by_role.detection_confidence, DetectionConfidence::Medium);

    let by_group = assess_karpenter(KarpenterSignals {
        security_group_match: true,
        ..KarpenterSignals::default()
    });
    assert!(by_group.detected);
    assert_eq!(by_group.detection_confidence, DetectionConfidence::Medium);
}

#[test]
fn empty_signals_grade_low_without_detection() {
    let assessment = assess_karpenter(KarpenterSignals::default());

    assert!(!assessment.detected);
    assert_eq!(assessment.detection_confidence, DetectionConfidence::Low);
    assert_eq!(assessment.detection_method, "aws_api");
}

#[test]
fn direct_evidence_outranks_name_matches() {
    let assessment = assess_karpenter(KarpenterSignals {
        tagged_running_instances: 1,
        role_name_match: true,
        ..KarpenterSignals::default()
    });

    assert_eq!(assessment.detection_confidence, DetectionConfidence::High);
}

// ============================================================================
// SECTION: EKS Auto Mode
// ============================================================================

#[test]
fn auto_mode_tags_grade_high() {
    let assessment = assess_auto_mode(AutoModeSignals {
        cluster_active: true,
        managed_node_groups: 2,
        auto_mode_tagged_instances: 4,
        ..AutoModeSignals::default()
    });

    assert!(assessment.likely_enabled);
    assert!(assessment.auto_mode_tags_detected);
    assert_eq!(assessment.detection_confidence, DetectionConfidence::High);
    assert_eq!(assessment.auto_mode_instance_count, 4);
}

#[test]
fn auto_mode_stack_grades_high_without_instances() {
    let assessment = assess_auto_mode(AutoModeSignals {
        cluster_active: true,
        auto_mode_stack_present: true,
        ..AutoModeSignals::default()
    });

    assert!(assessment.likely_enabled);
    assert_eq!(assessment.detection_confidence, DetectionConfidence::High);
}

#[test]
fn unaccounted_capacity_grades_medium() {
    let assessment = assess_auto_mode(AutoModeSignals {
        cluster_active: true,
        managed_node_groups: 0,
        self_managed_nodes: false,
        ..AutoModeSignals::default()
    });

    assert!(assessment.likely_enabled);
    assert_eq!(assessment.detection_confidence, DetectionConfidence::Medium);
    assert!(!assessment.auto_mode_tags_detected);
}

#[test]
fn accounted_capacity_grades_low() {
    let with_managed = assess_auto_mode(AutoModeSignals {
        cluster_active: true,
        managed_node_groups: 3,
        ..AutoModeSignals::default()
    });
    assert!(!with_managed.likely_enabled);
    assert_eq!(with_managed.detection_confidence, DetectionConfidence::Low);

    let with_self_managed = assess_auto_mode(AutoModeSignals {
        cluster_active: true,
        self_managed_nodes: true,
        ..AutoModeSignals::default()
    });
    assert!(!with_self_managed.likely_enabled);
    assert_eq!(with_self_managed.detection_confidence, DetectionConfidence::Low);
}

#[test]
fn inactive_cluster_never_grades_on_capacity_alone() {
    let assessment = assess_auto_mode(AutoModeSignals {
        cluster_active: false,
        managed_node_groups: 0,
        ..AutoModeSignals::default()
    });

    assert!(!assessment.likely_enabled);
    assert_eq!(assessment.detection_confidence, DetectionConfidence::Low);
}
