//! Core types, errors, and configuration for the plugin gate.
//!
//! This crate provides the foundational types shared by the admission
//! controller and the security gate.
//!
//! # Architecture
//!
//! The core consists of:
//! - Strong domain types (`PluginId`, `FunctionName`, `ExecutionId`)
//! - Priority, outcome, severity, and denial-reason enums
//! - Plugin manifests and install plans as consumed by the security gate
//! - Error hierarchy with contextual information
//! - Configuration types with documented defaults

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod error;
mod types;

pub use config::{
    AdmissionConfig, AdmissionConfigBuilder, SecurityGateConfig, SecurityGateConfigBuilder,
};
pub use error::{Error, Result};
pub use types::{
    DenialReason, DependencyRef, ExecutionId, ExecutionOutcome, FunctionName, InstallPlan,
    PluginId, PluginManifest, PluginSource, Priority, Severity, VersionKey,
};
