//! Strong domain types for the plugin gate.
//!
//! This module implements the newtype pattern to provide type safety for
//! domain primitives used by the admission controller and the security gate.
//!
//! # Type Safety Benefits
//!
//! Using strong types instead of primitives prevents:
//! - Mixing up parameters of the same primitive type
//! - Invalid values being passed
//! - Accidental type conversions
//!
//! # Examples
//!
//! ```
//! use gate_core::{PluginId, FunctionName, Priority};
//!
//! // Type-safe identifiers
//! let plugin = PluginId::new("chart-widget");
//! let function = FunctionName::new("render");
//! assert_eq!(Priority::default(), Priority::Normal);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Plugin identifier (newtype over String).
///
/// Represents a unique identifier for an installed plugin. Using a strong
/// type prevents accidentally mixing plugin ids with other string values.
///
/// # Examples
///
/// ```
/// use gate_core::PluginId;
///
/// let id = PluginId::new("chart-widget");
/// assert_eq!(id.as_str(), "chart-widget");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginId(String);

impl PluginId {
    /// Creates a new plugin identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use gate_core::PluginId;
    ///
    /// let id = PluginId::new("my-plugin");
    /// let from_string = PluginId::new(String::from("my-plugin"));
    /// assert_eq!(id, from_string);
    /// ```
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the plugin id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PluginId` and returns the inner `String`.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PluginId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PluginId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Plugin function name (newtype over String).
///
/// Represents the name of a plugin function a caller wants to execute.
///
/// # Examples
///
/// ```
/// use gate_core::FunctionName;
///
/// let function = FunctionName::new("render_chart");
/// assert_eq!(function.as_str(), "render_chart");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionName(String);

impl FunctionName {
    /// Creates a new function name.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the function name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `FunctionName` and returns the inner `String`.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FunctionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FunctionName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for one admitted or queued execution.
///
/// Generated by the admission controller when a caller requests execution.
/// Backed by a UUID v4 rendered as a string for stable serialization.
///
/// # Examples
///
/// ```
/// use gate_core::ExecutionId;
///
/// let id = ExecutionId::generate();
/// let other = ExecutionId::generate();
/// assert_ne!(id, other);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Generates a fresh, unique execution id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Creates an execution id from an existing string.
    ///
    /// Intended for deserialization and tests; normal flow uses
    /// [`generate()`](Self::generate).
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the execution id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority of an execution request.
///
/// Queued requests are ordered priority-major, FIFO-minor: a `High` entry
/// drains before any `Normal` entry, regardless of arrival time, while
/// entries at the same priority keep their arrival order.
///
/// # Examples
///
/// ```
/// use gate_core::Priority;
///
/// assert!(Priority::High.rank() > Priority::Normal.rank());
/// assert!(Priority::Normal.rank() > Priority::Low.rank());
/// assert_eq!(Priority::default(), Priority::Normal);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Drains ahead of normal and low entries.
    High,
    /// Default priority for plugin function calls.
    #[default]
    Normal,
    /// Background work; drains last and may starve under sustained
    /// high-priority traffic until queue age-out.
    Low,
}

impl Priority {
    /// Returns the numeric rank used for queue ordering (high=3, normal=2,
    /// low=1).
    #[inline]
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Normal => 2,
            Self::Low => 1,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        };
        write!(f, "{s}")
    }
}

/// How an execution ended.
///
/// `Timeout` is reserved for reclamation by the cleanup timer; callers
/// report `Success` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionOutcome {
    /// The plugin function completed normally.
    Success,
    /// The plugin function failed; counted in the failure statistics.
    Error,
    /// Forced release after exceeding the maximum execution time.
    Timeout,
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Timeout => "timeout",
        };
        write!(f, "{s}")
    }
}

/// Why an execution request was denied immediate admission.
///
/// Denial is recoverable: the request is queued and drained once the
/// blocking condition clears.
///
/// # Examples
///
/// ```
/// use gate_core::DenialReason;
///
/// assert_eq!(
///     DenialReason::MaxConcurrentReached.as_str(),
///     "max_concurrent_reached"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Host memory pressure at or above the configured threshold.
    MemoryExhausted,
    /// CPU pressure proxy at or above the configured threshold.
    CpuOverload,
    /// All concurrency slots occupied.
    MaxConcurrentReached,
}

impl DenialReason {
    /// Returns the stable wire form of the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MemoryExhausted => "memory_exhausted",
            Self::CpuOverload => "cpu_overload",
            Self::MaxConcurrentReached => "max_concurrent_reached",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a plugin was obtained from.
///
/// Source trust feeds directly into the risk score: less trusted sources
/// add a fixed risk contribution.
///
/// # Examples
///
/// ```
/// use gate_core::PluginSource;
///
/// assert_eq!(PluginSource::Official.trust_risk(), 0);
/// assert_eq!(PluginSource::Unknown.trust_risk(), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginSource {
    /// Published through the official marketplace.
    Official,
    /// Installed from the local filesystem by the user.
    Local,
    /// Published by a community registry.
    Community,
    /// Source could not be determined. Any unrecognized source
    /// deserializes to this variant.
    #[serde(other)]
    Unknown,
}

impl PluginSource {
    /// Returns the risk contribution of this source
    /// (official=0, local=5, community=10, unknown=30).
    #[must_use]
    pub const fn trust_risk(self) -> u32 {
        match self {
            Self::Official => 0,
            Self::Local => 5,
            Self::Community => 10,
            Self::Unknown => 30,
        }
    }

    /// Returns `true` for sources that are not the official marketplace.
    #[must_use]
    pub const fn is_untrusted(self) -> bool {
        !matches!(self, Self::Official)
    }
}

impl fmt::Display for PluginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Official => "official",
            Self::Local => "local",
            Self::Community => "community",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Severity of a detected security issue.
///
/// Ordered from least to most severe, so `Ord` comparisons read naturally:
///
/// ```
/// use gate_core::Severity;
///
/// assert!(Severity::Critical > Severity::High);
/// assert!(Severity::Medium > Severity::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; never blocks approval.
    Low,
    /// Worth surfacing; never blocks approval on its own.
    Medium,
    /// Blocks approval under strict mode.
    High,
    /// Always blocks approval.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Cache key for one analyzed plugin version: `pluginId@version`.
///
/// A validation verdict is computed at most once per key unless explicitly
/// invalidated.
///
/// # Examples
///
/// ```
/// use gate_core::{PluginId, VersionKey};
///
/// let key = VersionKey::for_plugin(&PluginId::new("chart-widget"), "1.2.0");
/// assert_eq!(key.as_str(), "chart-widget@1.2.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionKey(String);

impl VersionKey {
    /// Builds the key for a plugin id and version string.
    #[must_use]
    pub fn for_plugin(plugin_id: &PluginId, version: &str) -> Self {
        Self(format!("{plugin_id}@{version}"))
    }

    /// Returns the key as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a plugin dependency as declared in its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRef {
    /// Identifier of the depended-on package.
    pub id: String,
    /// Exact declared version.
    pub version: String,
}

impl DependencyRef {
    /// Creates a new dependency reference.
    #[must_use]
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

/// Declared metadata for one plugin, as submitted for validation.
///
/// The manifest carries everything the security gate inspects statically:
/// identity, source, requested permissions, and declared dependencies.
/// Code text is supplied separately by the host's code source.
///
/// # Examples
///
/// ```
/// use gate_core::{PluginId, PluginManifest, PluginSource};
///
/// let manifest = PluginManifest::new(
///     PluginId::new("chart-widget"),
///     "1.2.0",
///     PluginSource::Community,
/// );
/// assert_eq!(manifest.version, "1.2.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin identifier.
    pub id: PluginId,
    /// Version string; bumping it invalidates the cached verdict.
    pub version: String,
    /// Where the plugin was obtained from.
    pub source: PluginSource,
    /// Free-form marketplace category.
    #[serde(default)]
    pub category: Option<String>,
    /// Permissions the plugin requests from the host.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Declared package dependencies.
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
}

impl PluginManifest {
    /// Creates a manifest with no category, permissions, or dependencies.
    #[must_use]
    pub fn new(id: PluginId, version: impl Into<String>, source: PluginSource) -> Self {
        Self {
            id,
            version: version.into(),
            source,
            category: None,
            permissions: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Returns the verdict cache key for this manifest.
    #[must_use]
    pub fn version_key(&self) -> VersionKey {
        VersionKey::for_plugin(&self.id, &self.version)
    }
}

/// A set of plugins to be installed together.
///
/// The security gate validates every member and additionally applies a
/// plan-level ceiling on the aggregate risk score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallPlan {
    /// Plugins in the plan, in install order.
    pub plugins: Vec<PluginManifest>,
}

impl InstallPlan {
    /// Creates an install plan over the given manifests.
    #[must_use]
    pub const fn new(plugins: Vec<PluginManifest>) -> Self {
        Self { plugins }
    }
}
