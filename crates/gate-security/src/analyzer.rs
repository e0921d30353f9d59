//! Static analyzers feeding the security gate.
//!
//! Three independent inspections run over a plugin before the risk engine
//! scores it: code pattern matching, permission inspection, and a
//! dependency audit. Each is behind a trait seam so hosts can substitute a
//! real static-analysis feed; the bundled implementations are fixed,
//! versioned rule tables.
//!
//! The contract is "given code text, return issues"; how the text is
//! obtained is a host concern behind [`CodeSource`].
//!
//! # Examples
//!
//! ```
//! use gate_security::analyzer::{CodeAnalyzer, PatternAnalyzer};
//!
//! let analyzer = PatternAnalyzer::new();
//! let issues = analyzer.analyze("eval(payload)").unwrap();
//! assert_eq!(issues.len(), 1);
//! ```

use gate_core::{DependencyRef, PluginManifest, Severity};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Version of the bundled rule tables.
///
/// Bumped whenever a pattern, permission, or advisory entry changes, so
/// hosts can invalidate cached verdicts produced under older rules.
pub const RULES_VERSION: u32 = 1;

/// Category of a detected security issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Plugin comes from a source other than the official marketplace.
    UntrustedSource,
    /// Code matched a dangerous construct in the pattern table.
    DangerousPattern,
    /// Requested permission carries risk.
    Permission,
    /// Declared dependency has a known vulnerability.
    VulnerableDependency,
    /// An analyzer failed; the verdict fails closed.
    AnalysisFailure,
}

/// One finding produced by an analyzer.
///
/// Immutable after creation; owned by the validation result it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Category of the finding.
    pub kind: IssueKind,
    /// Human-readable description.
    pub description: String,
    /// Severity tier.
    pub severity: Severity,
    /// Optional extra context (matched text, permission name, package id).
    #[serde(default)]
    pub context: Option<String>,
}

impl Issue {
    /// Creates an issue without extra context.
    #[must_use]
    pub fn new(kind: IssueKind, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind,
            description: description.into(),
            severity,
            context: None,
        }
    }

    /// Attaches context to the issue.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Supplies the code text for a plugin under validation.
///
/// The gate's contract is "given code text, return issues"; obtaining the
/// text (bundle extraction, registry download, local file) is a host
/// collaborator concern behind this trait.
pub trait CodeSource: Send + Sync + fmt::Debug {
    /// Returns the code text to analyze for the given plugin.
    ///
    /// # Errors
    ///
    /// Any error here fails the plugin's verdict closed (critical).
    fn code_for(&self, manifest: &PluginManifest) -> gate_core::Result<String>;
}

/// Code source for hosts with no code feed. Supplies empty text, so the
/// pattern analyzer finds nothing; permission and dependency analysis
/// still apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCodeSource;

impl CodeSource for EmptyCodeSource {
    fn code_for(&self, _manifest: &PluginManifest) -> gate_core::Result<String> {
        Ok(String::new())
    }
}

/// In-memory code source, keyed by plugin id. Useful in tests and for
/// hosts that already hold plugin bundles in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCodeSource {
    code: HashMap<String, String>,
}

impl StaticCodeSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers code text for a plugin id.
    #[must_use]
    pub fn with_code(mut self, plugin_id: impl Into<String>, code: impl Into<String>) -> Self {
        self.code.insert(plugin_id.into(), code.into());
        self
    }
}

impl CodeSource for StaticCodeSource {
    fn code_for(&self, manifest: &PluginManifest) -> gate_core::Result<String> {
        Ok(self
            .code
            .get(manifest.id.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

/// Analyzes code text for dangerous constructs.
pub trait CodeAnalyzer: Send + Sync + fmt::Debug {
    /// Returns the issues found in the given code text.
    ///
    /// # Errors
    ///
    /// An analyzer failure is escalated to a critical verdict by the gate
    /// (fail closed), never silently skipped.
    fn analyze(&self, code: &str) -> gate_core::Result<Vec<Issue>>;
}

struct PatternRule {
    pattern: Regex,
    description: &'static str,
    severity: Severity,
}

/// Table-driven code analyzer matching known dangerous constructs.
///
/// The rule table is fixed and versioned ([`RULES_VERSION`]); each rule
/// maps a pattern to a severity tier. One issue is reported per matching
/// rule, carrying the first matched text as context.
pub struct PatternAnalyzer {
    rules: Vec<PatternRule>,
}

impl fmt::Debug for PatternAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternAnalyzer")
            .field("rules", &self.rules.len())
            .field("rules_version", &RULES_VERSION)
            .finish()
    }
}

impl PatternAnalyzer {
    /// Creates the analyzer with the bundled rule table.
    ///
    /// # Examples
    ///
    /// ```
    /// use gate_security::analyzer::{CodeAnalyzer, PatternAnalyzer};
    /// use gate_core::Severity;
    ///
    /// let analyzer = PatternAnalyzer::new();
    /// let issues = analyzer.analyze("new Function(body)").unwrap();
    /// assert_eq!(issues[0].severity, Severity::Critical);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        let table: &[(&str, &str, Severity)] = &[
            (
                r"\beval\s*\(|new\s+Function\s*\(",
                "dynamic code execution",
                Severity::Critical,
            ),
            (
                r"\b(?:inner|outer)HTML\s*=|document\.write\s*\(",
                "raw markup injection",
                Severity::High,
            ),
            (
                r"\brequire\s*\(|\bimport\s*\(",
                "dynamic module loading",
                Severity::High,
            ),
            (
                r"\bfetch\s*\(|XMLHttpRequest|new\s+WebSocket\s*\(",
                "network call",
                Severity::Medium,
            ),
        ];

        let rules = table
            .iter()
            .map(|(pattern, description, severity)| PatternRule {
                pattern: Regex::new(pattern).expect("bundled rule pattern is valid"),
                description,
                severity: *severity,
            })
            .collect();
        Self { rules }
    }
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeAnalyzer for PatternAnalyzer {
    fn analyze(&self, code: &str) -> gate_core::Result<Vec<Issue>> {
        let mut issues = Vec::new();
        for rule in &self.rules {
            if let Some(found) = rule.pattern.find(code) {
                issues.push(
                    Issue::new(IssueKind::DangerousPattern, rule.description, rule.severity)
                        .with_context(found.as_str().to_string()),
                );
            }
        }
        Ok(issues)
    }
}

/// Inspects requested permissions against a severity table.
pub trait PermissionInspector: Send + Sync + fmt::Debug {
    /// Returns one issue per risky permission.
    fn inspect(&self, permissions: &[String]) -> Vec<Issue>;
}

/// Fixed permission-to-severity table.
///
/// Arbitrary code execution permissions are critical, network permissions
/// high, storage permissions medium, logging low. Unrecognized permissions
/// are flagged at medium: an unknown surface is suspicious but not
/// blocking on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct TablePermissionInspector;

impl TablePermissionInspector {
    const TABLE: &'static [(&'static str, Severity)] = &[
        ("execute_code", Severity::Critical),
        ("eval", Severity::Critical),
        ("shell", Severity::Critical),
        ("network", Severity::High),
        ("http", Severity::High),
        ("websocket", Severity::High),
        ("storage", Severity::Medium),
        ("filesystem", Severity::Medium),
        ("clipboard", Severity::Medium),
        ("logging", Severity::Low),
        ("notifications", Severity::Low),
    ];

    /// Creates the inspector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn severity_for(permission: &str) -> Severity {
        Self::TABLE
            .iter()
            .find(|(name, _)| *name == permission)
            .map_or(Severity::Medium, |(_, severity)| *severity)
    }
}

impl PermissionInspector for TablePermissionInspector {
    fn inspect(&self, permissions: &[String]) -> Vec<Issue> {
        permissions
            .iter()
            .map(|permission| {
                let severity = Self::severity_for(permission);
                let known = Self::TABLE.iter().any(|(name, _)| name == permission);
                let description = if known {
                    format!("permission '{permission}' requested")
                } else {
                    format!("unrecognized permission '{permission}' requested")
                };
                Issue::new(IssueKind::Permission, description, severity)
                    .with_context(permission.clone())
            })
            .collect()
    }
}

/// Flags declared dependencies with known vulnerabilities.
///
/// The bundled advisory table is a stand-in for a real advisory feed;
/// hosts wire their feed in via [`DependencyAuditor::with_table`].
#[derive(Debug, Clone)]
pub struct DependencyAuditor {
    advisories: Vec<(String, String)>,
}

impl DependencyAuditor {
    const KNOWN_VULNERABLE: &'static [(&'static str, &'static str)] = &[
        ("event-stream", "3.3.6"),
        ("flatmap-stream", "0.1.1"),
        ("ua-parser-js", "0.7.29"),
        ("node-ipc", "10.1.1"),
        ("coa", "2.0.3"),
    ];

    /// Creates the auditor with the bundled advisory table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            advisories: Self::KNOWN_VULNERABLE
                .iter()
                .map(|(id, version)| ((*id).to_string(), (*version).to_string()))
                .collect(),
        }
    }

    /// Creates an auditor over a host-supplied advisory table of
    /// `(dependency_id, version)` pairs.
    #[must_use]
    pub const fn with_table(advisories: Vec<(String, String)>) -> Self {
        Self { advisories }
    }

    /// Returns one high-severity issue per known-vulnerable dependency.
    #[must_use]
    pub fn audit(&self, dependencies: &[DependencyRef]) -> Vec<Issue> {
        dependencies
            .iter()
            .filter(|dep| {
                self.advisories
                    .iter()
                    .any(|(id, version)| *id == dep.id && *version == dep.version)
            })
            .map(|dep| {
                Issue::new(
                    IssueKind::VulnerableDependency,
                    format!("dependency '{}@{}' has a known vulnerability", dep.id, dep.version),
                    Severity::High,
                )
                .with_context(format!("{}@{}", dep.id, dep.version))
            })
            .collect()
    }
}

impl Default for DependencyAuditor {
    fn default() -> Self {
        Self::new()
    }
}
