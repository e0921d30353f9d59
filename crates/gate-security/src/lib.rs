//! Static security risk gate for plugin installation and execution.
//!
//! This crate decides whether a plugin may run, based purely on static
//! inspection of its manifest and code: dangerous code patterns, requested
//! permissions, known-vulnerable dependencies, and source trust. Findings
//! are folded into a risk score and an approve/reject verdict, cached per
//! plugin version.
//!
//! # Architecture
//!
//! - [`analyzer`]: pattern, permission, and dependency analyzers behind
//!   trait seams
//! - [`risk`]: deterministic risk scoring
//! - [`gate`]: the caching [`SecurityGate`] and install-plan validation
//!
//! # Examples
//!
//! ```
//! use gate_security::SecurityGate;
//! use gate_core::{PluginId, PluginManifest, PluginSource, SecurityGateConfig};
//!
//! let gate = SecurityGate::new(SecurityGateConfig::default());
//!
//! let mut manifest = PluginManifest::new(
//!     PluginId::new("data-export"),
//!     "0.4.2",
//!     PluginSource::Community,
//! );
//! manifest.permissions = vec!["network".to_string()];
//!
//! let verdict = gate.validate_plugin(&manifest);
//! assert!(verdict.approved);
//! assert_eq!(verdict.risk_score, 30);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod analyzer;
pub mod gate;
pub mod risk;

pub use analyzer::{
    CodeAnalyzer, CodeSource, DependencyAuditor, EmptyCodeSource, Issue, IssueKind,
    PatternAnalyzer, PermissionInspector, RULES_VERSION, StaticCodeSource,
    TablePermissionInspector,
};
pub use gate::{PlanSummary, PlanVerdict, SecurityGate, ValidationResult};
pub use risk::{RiskAssessment, RiskEngine, RiskFactor, RiskLevel};
