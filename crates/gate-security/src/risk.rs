//! Risk scoring for analyzed plugins.
//!
//! The engine folds analyzer findings and source trust into a single score
//! in `[0, 100]` plus a coarse level. Scoring is deterministic: the same
//! issues and source always produce the same assessment, which is what
//! makes per-version verdict caching sound.

use crate::analyzer::{Issue, IssueKind};
use gate_core::{PluginSource, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse risk tier derived from the numeric score.
///
/// # Examples
///
/// ```
/// use gate_security::risk::RiskLevel;
///
/// assert_eq!(RiskLevel::from_score(85), RiskLevel::Critical);
/// assert_eq!(RiskLevel::from_score(60), RiskLevel::High);
/// assert_eq!(RiskLevel::from_score(30), RiskLevel::Medium);
/// assert_eq!(RiskLevel::from_score(10), RiskLevel::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Score below 30.
    Low,
    /// Score in `[30, 60)`.
    Medium,
    /// Score in `[60, 80)`.
    High,
    /// Score of 80 or above.
    Critical,
}

impl RiskLevel {
    /// Maps a numeric score to its tier.
    #[must_use]
    pub const fn from_score(score: u32) -> Self {
        if score >= 80 {
            Self::Critical
        } else if score >= 60 {
            Self::High
        } else if score >= 30 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for RiskLevel {
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

/// One named contribution to the total risk score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// What contributed (source trust, or an issue description).
    pub description: String,
    /// Points added to the total score.
    pub contribution: u32,
}

/// The result of scoring one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Total score, clamped to `[0, 100]`.
    pub total_score: u32,
    /// Tier derived from the total score.
    pub level: RiskLevel,
    /// Individual contributions, in the order they were applied.
    pub factors: Vec<RiskFactor>,
}

/// Deterministic risk scorer.
///
/// Weights are additive: source trust contributes its fixed risk, each
/// issue contributes by severity, and the sum is clamped to 100. Untrusted
/// source *issues* contribute nothing here because the source factor
/// already covers them; they exist so strict mode can reject on them.
///
/// # Examples
///
/// ```
/// use gate_security::analyzer::{Issue, IssueKind};
/// use gate_security::risk::{RiskEngine, RiskLevel};
/// use gate_core::{PluginSource, Severity};
///
/// let issues = vec![Issue::new(
///     IssueKind::DangerousPattern,
///     "dynamic code execution",
///     Severity::Critical,
/// )];
/// let assessment = RiskEngine::new().assess(PluginSource::Community, &issues);
/// assert_eq!(assessment.total_score, 50);
/// assert_eq!(assessment.level, RiskLevel::Medium);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskEngine;

impl RiskEngine {
    /// Points per critical issue.
    pub const WEIGHT_CRITICAL: u32 = 40;
    /// Points per high issue.
    pub const WEIGHT_HIGH: u32 = 20;
    /// Points per medium issue.
    pub const WEIGHT_MEDIUM: u32 = 10;
    /// Points per low issue.
    pub const WEIGHT_LOW: u32 = 5;
    /// Ceiling of the total score.
    pub const MAX_SCORE: u32 = 100;

    /// Creates the engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    const fn weight(severity: Severity) -> u32 {
        match severity {
            Severity::Critical => Self::WEIGHT_CRITICAL,
            Severity::High => Self::WEIGHT_HIGH,
            Severity::Medium => Self::WEIGHT_MEDIUM,
            Severity::Low => Self::WEIGHT_LOW,
        }
    }

    /// Scores a plugin from its source and analyzer findings.
    ///
    /// Adding an issue never lowers the score.
    #[must_use]
    pub fn assess(&self, source: PluginSource, issues: &[Issue]) -> RiskAssessment {
        let mut factors = Vec::with_capacity(issues.len() + 1);
        let mut total: u32 = 0;

        let source_risk = source.trust_risk();
        if source_risk > 0 {
            factors.push(RiskFactor {
                description: format!("source trust ({source})"),
                contribution: source_risk,
            });
            total += source_risk;
        }

        for issue in issues {
            let contribution = if issue.kind == IssueKind::UntrustedSource {
                0
            } else {
                Self::weight(issue.severity)
            };
            if contribution > 0 {
                factors.push(RiskFactor {
                    description: issue.description.clone(),
                    contribution,
                });
                total += contribution;
            }
        }

        let total_score = total.min(Self::MAX_SCORE);
        RiskAssessment {
            total_score,
            level: RiskLevel::from_score(total_score),
            factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: Severity) -> Issue {
        Issue::new(IssueKind::DangerousPattern, "finding", severity)
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(29), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(59), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(79), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(80), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Critical);
    }

    #[test]
    fn test_official_clean_scores_zero() {
        let assessment = RiskEngine::new().assess(PluginSource::Official, &[]);
        assert_eq!(assessment.total_score, 0);
        assert_eq!(assessment.level, RiskLevel::Low);
        assert!(assessment.factors.is_empty());
    }

    #[test]
    fn test_source_trust_contributes() {
        let engine = RiskEngine::new();
        assert_eq!(engine.assess(PluginSource::Local, &[]).total_score, 5);
        assert_eq!(engine.assess(PluginSource::Community, &[]).total_score, 10);
        assert_eq!(engine.assess(PluginSource::Unknown, &[]).total_score, 30);
    }

    #[test]
    fn test_severity_weights() {
        let engine = RiskEngine::new();
        let issues = vec![
            issue(Severity::Critical),
            issue(Severity::High),
            issue(Severity::Medium),
            issue(Severity::Low),
        ];
        let assessment = engine.assess(PluginSource::Official, &issues);
        assert_eq!(assessment.total_score, 40 + 20 + 10 + 5);
        assert_eq!(assessment.factors.len(), 4);
    }

    #[test]
    fn test_score_clamped_at_ceiling() {
        let engine = RiskEngine::new();
        let issues = vec![issue(Severity::Critical); 4];
        let assessment = engine.assess(PluginSource::Unknown, &issues);
        assert_eq!(assessment.total_score, 100);
        assert_eq!(assessment.level, RiskLevel::Critical);
    }

    #[test]
    fn test_adding_issue_never_lowers_score() {
        let engine = RiskEngine::new();
        let mut issues = Vec::new();
        let mut previous = 0;
        for severity in [Severity::Low, Severity::Medium, Severity::High, Severity::Critical] {
            issues.push(issue(severity));
            let score = engine.assess(PluginSource::Community, &issues).total_score;
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_untrusted_source_issue_not_double_counted() {
        let engine = RiskEngine::new();
        let marker = Issue::new(
            IssueKind::UntrustedSource,
            "plugin source is not the official marketplace",
            Severity::High,
        );
        let with_marker = engine.assess(PluginSource::Community, &[marker]);
        let without = engine.assess(PluginSource::Community, &[]);
        assert_eq!(with_marker.total_score, without.total_score);
    }
}
