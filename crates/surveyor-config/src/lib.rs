// crates/surveyor-config/src/lib.rs
// ============================================================================
// Module: Surveyor Config Library
// Description: Canonical config model and validation for surveyor hosts.
// Purpose: Single source of truth for surveyor.toml semantics.
// Dependencies: surveyor-core, serde, toml
// ============================================================================

//! ## Overview
//! `surveyor-config` defines the configuration model shared by every
//! surveyor deployment: which inspection domain the host serves, how the
//! extractor names its target, AWS client overrides, and the notification
//! and audit switches. Parsing is strict and validation fails closed so a
//! misconfigured host never starts half-wired.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
