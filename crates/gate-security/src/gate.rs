//! The security gate: cached approve/reject verdicts per plugin version.
//!
//! A plugin version is analyzed at most once; the verdict is cached under
//! `pluginId@version` and returned unchanged until explicitly invalidated.
//! Analysis failures are escalated to a critical rejection and cached like
//! any other verdict, so a broken analyzer fails closed instead of open.
//!
//! # Examples
//!
//! ```
//! use gate_security::SecurityGate;
//! use gate_core::{PluginId, PluginManifest, PluginSource, SecurityGateConfig};
//!
//! let gate = SecurityGate::new(SecurityGateConfig::default());
//! let manifest = PluginManifest::new(
//!     PluginId::new("chart-widget"),
//!     "1.0.0",
//!     PluginSource::Official,
//! );
//! let verdict = gate.validate_plugin(&manifest);
//! assert!(verdict.approved);
//! assert_eq!(verdict.risk_score, 0);
//! ```

use crate::analyzer::{
    CodeAnalyzer, CodeSource, DependencyAuditor, EmptyCodeSource, Issue, IssueKind,
    PatternAnalyzer, PermissionInspector, TablePermissionInspector,
};
use crate::risk::{RiskEngine, RiskLevel};
use chrono::{DateTime, Utc};
use gate_core::{
    Error, InstallPlan, PluginId, PluginManifest, PluginSource, SecurityGateConfig, Severity,
    VersionKey,
};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// The verdict for one plugin version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Plugin the verdict applies to.
    pub plugin_id: PluginId,
    /// Version the verdict applies to.
    pub version: String,
    /// Declared source of the plugin.
    pub source: PluginSource,
    /// Whether the plugin may be executed/installed.
    pub approved: bool,
    /// Why the plugin was rejected, when it was.
    pub reason: Option<String>,
    /// Highest severity among the issues, if any were found.
    pub severity: Option<Severity>,
    /// All findings, in analyzer order.
    pub issues: Vec<Issue>,
    /// Total risk score in `[0, 100]`.
    pub risk_score: u32,
    /// Tier derived from the risk score.
    pub risk_level: RiskLevel,
    /// When the analysis ran. Cache hits keep the original timestamp.
    pub validated_at: DateTime<Utc>,
}

/// Aggregate counts over an install plan verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Number of plugins in the plan.
    pub plugins: usize,
    /// How many were approved.
    pub approved_count: usize,
    /// How many were rejected.
    pub rejected_count: usize,
    /// Sum of per-plugin risk scores.
    pub total_risk_score: u32,
    /// Total number of issues across all plugins.
    pub warnings: usize,
}

/// The verdict for an install plan as a whole.
///
/// Per-plugin verdicts are always included, so the caller can report which
/// member sank an otherwise healthy plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanVerdict {
    /// Whether the whole plan may proceed.
    pub approved: bool,
    /// Per-plugin verdicts, in plan order.
    pub results: Vec<ValidationResult>,
    /// Plan-level issues (aggregate risk ceiling breaches).
    pub issues: Vec<Issue>,
    /// Aggregate counts.
    pub summary: PlanSummary,
}

/// Static security risk gate with a per-version verdict cache.
///
/// Thread-safe: validation may be called concurrently from multiple
/// threads, and a given version is still analyzed at most once because
/// callers serialize on the verdict cache. Analyzer collaborators sit
/// behind trait objects so hosts can substitute real code feeds and
/// advisory databases.
pub struct SecurityGate {
    config: SecurityGateConfig,
    code_source: Box<dyn CodeSource>,
    code_analyzer: Box<dyn CodeAnalyzer>,
    permission_inspector: Box<dyn PermissionInspector>,
    dependency_auditor: DependencyAuditor,
    cache: Mutex<LruCache<VersionKey, ValidationResult>>,
    analysis_count: AtomicU64,
}

impl fmt::Debug for SecurityGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityGate")
            .field("config", &self.config)
            .field("analysis_count", &self.analysis_count.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl SecurityGate {
    /// Creates a gate with the bundled analyzers and no code feed.
    #[must_use]
    pub fn new(config: SecurityGateConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity().max(1))
            .expect("cache capacity is at least one");
        Self {
            config,
            code_source: Box::new(EmptyCodeSource),
            code_analyzer: Box::new(PatternAnalyzer::new()),
            permission_inspector: Box::new(TablePermissionInspector::new()),
            dependency_auditor: DependencyAuditor::new(),
            cache: Mutex::new(LruCache::new(capacity)),
            analysis_count: AtomicU64::new(0),
        }
    }

    /// Replaces the code source.
    #[must_use]
    pub fn with_code_source(mut self, source: impl CodeSource + 'static) -> Self {
        self.code_source = Box::new(source);
        self
    }

    /// Replaces the code analyzer.
    #[must_use]
    pub fn with_code_analyzer(mut self, analyzer: impl CodeAnalyzer + 'static) -> Self {
        self.code_analyzer = Box::new(analyzer);
        self
    }

    /// Replaces the permission inspector.
    #[must_use]
    pub fn with_permission_inspector(
        mut self,
        inspector: impl PermissionInspector + 'static,
    ) -> Self {
        self.permission_inspector = Box::new(inspector);
        self
    }

    /// Replaces the dependency auditor.
    #[must_use]
    pub fn with_dependency_auditor(mut self, auditor: DependencyAuditor) -> Self {
        self.dependency_auditor = auditor;
        self
    }

    /// Returns the gate configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SecurityGateConfig {
        &self.config
    }

    /// Number of full analyses performed (cache hits excluded).
    #[must_use]
    pub fn analysis_count(&self) -> u64 {
        self.analysis_count.load(Ordering::Relaxed)
    }

    /// Validates one plugin, returning the cached verdict when present.
    ///
    /// Never errors: an analysis failure is folded into a cached critical
    /// rejection so repeated calls for a broken plugin stay cheap and stay
    /// closed.
    pub fn validate_plugin(&self, manifest: &PluginManifest) -> ValidationResult {
        let key = manifest.version_key();
        // The cache lock is held across the analysis: concurrent callers
        // for the same version serialize here and the second one takes the
        // cache hit instead of re-analyzing.
        let mut cache = self.cache.lock().unwrap();
        if let Some(cached) = cache.get(&key) {
            debug!(plugin = %manifest.id, version = %manifest.version, "verdict cache hit");
            return cached.clone();
        }

        let result = match self.analyze(manifest) {
            Ok(result) => result,
            Err(err) => {
                warn!(plugin = %manifest.id, error = %err, "analysis failed, rejecting");
                self.fail_closed(manifest, &err)
            }
        };
        self.analysis_count.fetch_add(1, Ordering::Relaxed);

        if result.approved {
            debug!(
                plugin = %manifest.id,
                version = %manifest.version,
                risk_score = result.risk_score,
                "plugin approved"
            );
        } else {
            info!(
                plugin = %manifest.id,
                version = %manifest.version,
                risk_score = result.risk_score,
                reason = result.reason.as_deref().unwrap_or(""),
                "plugin rejected"
            );
        }

        cache.put(key, result.clone());
        result
    }

    /// Validates every plugin in a plan and applies the aggregate ceiling.
    ///
    /// A plan containing a plugin with a critical issue is rejected
    /// outright with [`Error::PlanRejected`]. Otherwise the verdict is
    /// returned: approved only when every member is approved and the sum of
    /// risk scores stays at or under the plan ceiling. A ceiling breach is
    /// surfaced as a plan-level high-severity issue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PlanRejected`] when any member carries a
    /// critical-severity issue.
    pub fn validate_install_plan(&self, plan: &InstallPlan) -> gate_core::Result<PlanVerdict> {
        let results: Vec<ValidationResult> = plan
            .plugins
            .iter()
            .map(|manifest| self.validate_plugin(manifest))
            .collect();

        let total_risk_score: u32 = results.iter().map(|r| r.risk_score).sum();

        if let Some(critical) = results
            .iter()
            .find(|r| r.severity == Some(Severity::Critical))
        {
            return Err(Error::PlanRejected {
                reason: format!(
                    "plugin '{}' has a critical security issue",
                    critical.plugin_id
                ),
                total_risk_score,
            });
        }

        let mut plan_issues = Vec::new();
        let ceiling = self.config.plan_risk_reject_threshold();
        let within_ceiling = total_risk_score <= ceiling;
        if !within_ceiling {
            plan_issues.push(Issue::new(
                IssueKind::DangerousPattern,
                format!(
                    "aggregate plan risk {total_risk_score} exceeds ceiling {ceiling}"
                ),
                Severity::High,
            ));
        }

        let approved_count = results.iter().filter(|r| r.approved).count();
        let rejected_count = results.len() - approved_count;
        let warnings = results.iter().map(|r| r.issues.len()).sum();
        let approved = rejected_count == 0 && within_ceiling;

        if !approved {
            info!(
                total_risk_score,
                rejected_count, "install plan not approved"
            );
        }

        Ok(PlanVerdict {
            approved,
            summary: PlanSummary {
                plugins: results.len(),
                approved_count,
                rejected_count,
                total_risk_score,
                warnings,
            },
            results,
            issues: plan_issues,
        })
    }

    /// Drops the cached verdict for one plugin version.
    ///
    /// Returns `true` when a verdict was present.
    pub fn invalidate(&self, key: &VersionKey) -> bool {
        self.cache.lock().unwrap().pop(key).is_some()
    }

    /// Drops every cached verdict for a plugin, across versions.
    ///
    /// Returns the number of verdicts dropped. Used when a plugin is
    /// delisted or its advisory status changes.
    pub fn invalidate_plugin(&self, plugin_id: &PluginId) -> usize {
        let prefix = format!("{plugin_id}@");
        let mut cache = self.cache.lock().unwrap();
        let keys: Vec<VersionKey> = cache
            .iter()
            .filter(|(key, _)| key.as_str().starts_with(&prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            cache.pop(key);
        }
        keys.len()
    }

    /// Number of cached verdicts.
    #[must_use]
    pub fn cached_verdicts(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    fn analyze(&self, manifest: &PluginManifest) -> gate_core::Result<ValidationResult> {
        let code = self.code_source.code_for(manifest)?;

        let mut issues = self.code_analyzer.analyze(&code)?;
        issues.extend(self.permission_inspector.inspect(&manifest.permissions));
        issues.extend(self.dependency_auditor.audit(&manifest.dependencies));

        if self.config.strict_mode() && manifest.source.is_untrusted() {
            issues.push(
                Issue::new(
                    IssueKind::UntrustedSource,
                    format!("plugin source '{}' is not the official marketplace", manifest.source),
                    Severity::High,
                )
                .with_context(manifest.source.to_string()),
            );
        }

        let assessment = RiskEngine::new().assess(manifest.source, &issues);
        let severity = issues.iter().map(|i| i.severity).max();

        let reason = if severity == Some(Severity::Critical) {
            Some("critical security issue detected".to_string())
        } else if self.config.strict_mode() && severity >= Some(Severity::High) {
            Some("high-severity issue under strict mode".to_string())
        } else if assessment.total_score > self.config.risk_score_reject_threshold() {
            Some(format!(
                "risk score {} exceeds threshold {}",
                assessment.total_score,
                self.config.risk_score_reject_threshold()
            ))
        } else {
            None
        };

        Ok(ValidationResult {
            plugin_id: manifest.id.clone(),
            version: manifest.version.clone(),
            source: manifest.source,
            approved: reason.is_none(),
            reason,
            severity,
            issues,
            risk_score: assessment.total_score,
            risk_level: assessment.level,
            validated_at: Utc::now(),
        })
    }

    /// Builds the cached critical rejection for a failed analysis.
    fn fail_closed(&self, manifest: &PluginManifest, err: &Error) -> ValidationResult {
        let issue = Issue::new(
            IssueKind::AnalysisFailure,
            format!("analysis failed: {err}"),
            Severity::Critical,
        );
        ValidationResult {
            plugin_id: manifest.id.clone(),
            version: manifest.version.clone(),
            source: manifest.source,
            approved: false,
            reason: Some("analysis failure".to_string()),
            severity: Some(Severity::Critical),
            issues: vec![issue],
            risk_score: RiskEngine::MAX_SCORE,
            risk_level: RiskLevel::Critical,
            validated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::StaticCodeSource;

    fn manifest(id: &str, version: &str, source: PluginSource) -> PluginManifest {
        PluginManifest::new(PluginId::new(id), version, source)
    }

    #[derive(Debug)]
    struct BrokenAnalyzer;

    impl CodeAnalyzer for BrokenAnalyzer {
        fn analyze(&self, _code: &str) -> gate_core::Result<Vec<Issue>> {
            Err(Error::AnalysisFailure {
                plugin: "any".to_string(),
                message: "analyzer crashed".to_string(),
                source: None,
            })
        }
    }

    #[test]
    fn test_clean_official_plugin_approved() {
        let gate = SecurityGate::new(SecurityGateConfig::default());
        let result = gate.validate_plugin(&manifest("clean", "1.0.0", PluginSource::Official));
        assert!(result.approved);
        assert!(result.reason.is_none());
        assert_eq!(result.risk_score, 0);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.issues.is_empty());
        assert!(result.severity.is_none());
    }

    #[test]
    fn test_critical_pattern_rejects() {
        let gate = SecurityGate::new(SecurityGateConfig::default()).with_code_source(
            StaticCodeSource::new().with_code("evil", "eval(input)"),
        );
        let result = gate.validate_plugin(&manifest("evil", "1.0.0", PluginSource::Official));
        assert!(!result.approved);
        assert_eq!(result.severity, Some(Severity::Critical));
        assert_eq!(result.reason.as_deref(), Some("critical security issue detected"));
    }

    #[test]
    fn test_cache_hit_skips_analysis() {
        let gate = SecurityGate::new(SecurityGateConfig::default());
        let m = manifest("cached", "2.0.0", PluginSource::Community);

        let first = gate.validate_plugin(&m);
        let second = gate.validate_plugin(&m);
        assert_eq!(first, second);
        assert_eq!(gate.analysis_count(), 1);
    }

    #[test]
    fn test_version_bump_reanalyzes() {
        let gate = SecurityGate::new(SecurityGateConfig::default());
        gate.validate_plugin(&manifest("p", "1.0.0", PluginSource::Official));
        gate.validate_plugin(&manifest("p", "1.0.1", PluginSource::Official));
        assert_eq!(gate.analysis_count(), 2);
        assert_eq!(gate.cached_verdicts(), 2);
    }

    #[test]
    fn test_invalidate_forces_reanalysis() {
        let gate = SecurityGate::new(SecurityGateConfig::default());
        let m = manifest("p", "1.0.0", PluginSource::Official);
        gate.validate_plugin(&m);
        assert!(gate.invalidate(&m.version_key()));
        assert!(!gate.invalidate(&m.version_key()));
        gate.validate_plugin(&m);
        assert_eq!(gate.analysis_count(), 2);
    }

    #[test]
    fn test_invalidate_plugin_drops_all_versions() {
        let gate = SecurityGate::new(SecurityGateConfig::default());
        gate.validate_plugin(&manifest("p", "1.0.0", PluginSource::Official));
        gate.validate_plugin(&manifest("p", "1.1.0", PluginSource::Official));
        gate.validate_plugin(&manifest("other", "1.0.0", PluginSource::Official));

        assert_eq!(gate.invalidate_plugin(&PluginId::new("p")), 2);
        assert_eq!(gate.cached_verdicts(), 1);
    }

    #[test]
    fn test_strict_mode_rejects_high_severity() {
        let config = SecurityGateConfig::builder().strict_mode(true).build();
        let gate = SecurityGate::new(config).with_code_source(
            StaticCodeSource::new().with_code("p", "node.innerHTML = html;"),
        );
        let result = gate.validate_plugin(&manifest("p", "1.0.0", PluginSource::Official));
        assert!(!result.approved);
        assert_eq!(result.severity, Some(Severity::High));
    }

    #[test]
    fn test_strict_mode_flags_untrusted_source() {
        let config = SecurityGateConfig::builder().strict_mode(true).build();
        let gate = SecurityGate::new(config);
        let result = gate.validate_plugin(&manifest("p", "1.0.0", PluginSource::Community));
        assert!(!result.approved);
        assert!(
            result
                .issues
                .iter()
                .any(|i| i.kind == IssueKind::UntrustedSource)
        );
    }

    #[test]
    fn test_lenient_mode_allows_high_severity_under_threshold() {
        let gate = SecurityGate::new(SecurityGateConfig::default()).with_code_source(
            StaticCodeSource::new().with_code("p", "node.innerHTML = html;"),
        );
        // One high issue (20) + community trust (10) = 30, under 80
        let result = gate.validate_plugin(&manifest("p", "1.0.0", PluginSource::Community));
        assert!(result.approved);
        assert_eq!(result.risk_score, 30);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_score_threshold_rejects() {
        let config = SecurityGateConfig::builder()
            .risk_score_reject_threshold(25)
            .build();
        let gate = SecurityGate::new(config);
        let result = gate.validate_plugin(&manifest("p", "1.0.0", PluginSource::Unknown));
        // Unknown source alone contributes 30, over the lowered threshold
        assert!(!result.approved);
        assert!(result.reason.as_deref().unwrap_or("").contains("threshold"));
    }

    #[test]
    fn test_analysis_failure_fails_closed_and_caches() {
        let gate =
            SecurityGate::new(SecurityGateConfig::default()).with_code_analyzer(BrokenAnalyzer);
        let m = manifest("broken", "1.0.0", PluginSource::Official);

        let result = gate.validate_plugin(&m);
        assert!(!result.approved);
        assert_eq!(result.severity, Some(Severity::Critical));
        assert_eq!(result.risk_score, 100);
        assert_eq!(result.issues[0].kind, IssueKind::AnalysisFailure);

        // Cached: the broken analyzer is not consulted again
        let again = gate.validate_plugin(&m);
        assert_eq!(result, again);
        assert_eq!(gate.analysis_count(), 1);
    }

    #[test]
    fn test_plan_with_critical_member_errors() {
        let gate = SecurityGate::new(SecurityGateConfig::default()).with_code_source(
            StaticCodeSource::new().with_code("evil", "new Function(body)"),
        );
        let plan = InstallPlan::new(vec![
            manifest("fine", "1.0.0", PluginSource::Official),
            manifest("evil", "1.0.0", PluginSource::Official),
        ]);
        let err = gate.validate_install_plan(&plan).unwrap_err();
        assert!(err.is_plan_rejected());
        assert!(format!("{err}").contains("evil"));
    }

    #[test]
    fn test_plan_ceiling_breach_not_approved() {
        // Two unknown-source plugins with permission load: each well under
        // the per-plugin threshold, together over a lowered ceiling.
        let config = SecurityGateConfig::builder()
            .plan_risk_reject_threshold(50)
            .build();
        let gate = SecurityGate::new(config);

        let mut a = manifest("a", "1.0.0", PluginSource::Unknown);
        a.permissions = vec!["network".to_string()];
        let b = manifest("b", "1.0.0", PluginSource::Unknown);

        let verdict = gate
            .validate_install_plan(&InstallPlan::new(vec![a, b]))
            .unwrap();
        // 30+20=50 for a, 30 for b: total 80 > 50
        assert!(!verdict.approved);
        assert_eq!(verdict.summary.total_risk_score, 80);
        assert_eq!(verdict.summary.rejected_count, 0);
        assert_eq!(verdict.issues.len(), 1);
        assert_eq!(verdict.issues[0].severity, Severity::High);
    }

    #[test]
    fn test_plan_within_ceiling_approved() {
        let gate = SecurityGate::new(SecurityGateConfig::default());
        let plan = InstallPlan::new(vec![
            manifest("a", "1.0.0", PluginSource::Official),
            manifest("b", "1.0.0", PluginSource::Local),
        ]);
        let verdict = gate.validate_install_plan(&plan).unwrap();
        assert!(verdict.approved);
        assert_eq!(verdict.summary.plugins, 2);
        assert_eq!(verdict.summary.approved_count, 2);
        assert_eq!(verdict.summary.total_risk_score, 5);
        assert!(verdict.issues.is_empty());
    }

    #[test]
    fn test_concurrent_validation_analyzes_once() {
        let gate = SecurityGate::new(SecurityGateConfig::default());
        let m = manifest("shared", "1.0.0", PluginSource::Community);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| gate.validate_plugin(&m));
            }
        });

        assert_eq!(gate.analysis_count(), 1);
        assert_eq!(gate.cached_verdicts(), 1);
    }

    #[test]
    fn test_cache_eviction_respects_capacity() {
        let config = SecurityGateConfig::builder().cache_capacity(2).build();
        let gate = SecurityGate::new(config);
        gate.validate_plugin(&manifest("a", "1.0.0", PluginSource::Official));
        gate.validate_plugin(&manifest("b", "1.0.0", PluginSource::Official));
        gate.validate_plugin(&manifest("c", "1.0.0", PluginSource::Official));
        assert_eq!(gate.cached_verdicts(), 2);

        // The least recently used entry (a) was evicted and is re-analyzed
        gate.validate_plugin(&manifest("a", "1.0.0", PluginSource::Official));
        assert_eq!(gate.analysis_count(), 4);
    }
}
