//! Error types for the plugin gate.
//!
//! This module provides the error hierarchy shared by the admission
//! controller and the security gate. Resource denial is intentionally *not*
//! an error: denied admission is a normal, structured result returned to the
//! caller. Errors cover the terminal and exceptional paths only.
//!
//! # Examples
//!
//! ```
//! use gate_core::{Error, Result};
//!
//! fn check_threshold(value: f64) -> Result<()> {
//!     if !(0.0..=1.0).contains(&value) {
//!         return Err(Error::ConfigError {
//!             message: format!("threshold {value} outside [0, 1]"),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = check_threshold(1.5).unwrap_err();
//! assert!(err.is_config_error());
//! ```

use thiserror::Error;

/// Main error type for the plugin gate.
///
/// All errors in the system use this type, providing consistent error
/// handling across all crates in the workspace.
#[derive(Error, Debug)]
pub enum Error {
    /// Install plan rejected as a whole.
    ///
    /// Raised when a plan contains a critically rejected plugin or the
    /// aggregate risk score exceeds the plan-level ceiling. The installer
    /// must stop; this is a fail-closed decision.
    #[error("Install plan rejected: {reason} (total risk score {total_risk_score})")]
    PlanRejected {
        /// Description of why the plan was rejected
        reason: String,
        /// Sum of per-plugin risk scores across the plan
        total_risk_score: u32,
    },

    /// Static analysis of a single plugin failed.
    ///
    /// An exception during code, permission, or dependency analysis is
    /// escalated to a critical verdict for that plugin (fail closed), never
    /// silently skipped.
    #[error("Analysis failed for plugin '{plugin}': {message}")]
    AnalysisFailure {
        /// Identifier of the plugin under analysis
        plugin: String,
        /// Description of the analysis failure
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Release requested for an execution id that is not active.
    ///
    /// Occurs when a caller releases an id twice or releases an id already
    /// reclaimed by the cleanup timer.
    #[error("Unknown execution id: {execution_id}")]
    UnknownExecution {
        /// The id that was not found in the active set
        execution_id: String,
    },

    /// Configuration error.
    ///
    /// Raised when configuration is invalid, missing required fields,
    /// or contains contradictory settings.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Resource probe failed to produce a reading.
    ///
    /// Probe implementations return this when the host cannot supply a
    /// memory reading. The metrics sampler logs and swallows it, keeping
    /// the last-known metrics in place.
    #[error("Resource probe failure: {message}")]
    ProbeFailure {
        /// Description of the probe failure
        message: String,
    },
}

impl Error {
    /// Returns `true` if this is a plan-level rejection.
    ///
    /// # Examples
    ///
    /// ```
    /// use gate_core::Error;
    ///
    /// let err = Error::PlanRejected {
    ///     reason: "critical issue in plugin 'evil'".to_string(),
    ///     total_risk_score: 95,
    /// };
    /// assert!(err.is_plan_rejected());
    /// ```
    #[must_use]
    pub const fn is_plan_rejected(&self) -> bool {
        matches!(self, Self::PlanRejected { .. })
    }

    /// Returns `true` if this is an analysis failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use gate_core::Error;
    ///
    /// let err = Error::AnalysisFailure {
    ///     plugin: "demo".to_string(),
    ///     message: "pattern table unavailable".to_string(),
    ///     source: None,
    /// };
    /// assert!(err.is_analysis_failure());
    /// ```
    #[must_use]
    pub const fn is_analysis_failure(&self) -> bool {
        matches!(self, Self::AnalysisFailure { .. })
    }

    /// Returns `true` if this is an unknown-execution error.
    ///
    /// # Examples
    ///
    /// ```
    /// use gate_core::Error;
    ///
    /// let err = Error::UnknownExecution {
    ///     execution_id: "exec-123".to_string(),
    /// };
    /// assert!(err.is_unknown_execution());
    /// ```
    #[must_use]
    pub const fn is_unknown_execution(&self) -> bool {
        matches!(self, Self::UnknownExecution { .. })
    }

    /// Returns `true` if this is a configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use gate_core::Error;
    ///
    /// let err = Error::ConfigError {
    ///     message: "invalid threshold".to_string(),
    /// };
    /// assert!(err.is_config_error());
    /// ```
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns `true` if this is a probe failure.
    #[must_use]
    pub const fn is_probe_failure(&self) -> bool {
        matches!(self, Self::ProbeFailure { .. })
    }
}

/// Result type alias for gate operations.
///
/// This is a convenience alias for `Result<T, Error>` used throughout
/// the codebase.
///
/// # Examples
///
/// ```
/// use gate_core::{Result, Error};
///
/// fn validate_capacity(value: usize) -> Result<usize> {
///     if value == 0 {
///         return Err(Error::ConfigError {
///             message: "capacity must be non-zero".to_string(),
///         });
///     }
///     Ok(value)
/// }
///
/// assert!(validate_capacity(5).is_ok());
/// assert!(validate_capacity(0).is_err());
/// ```
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_rejected_detection() {
        let err = Error::PlanRejected {
            reason: "aggregate risk too high".to_string(),
            total_risk_score: 210,
        };
        assert!(err.is_plan_rejected());
        assert!(!err.is_analysis_failure());
    }

    #[test]
    fn test_analysis_failure_detection() {
        let err = Error::AnalysisFailure {
            plugin: "chart-widget".to_string(),
            message: "analyzer crashed".to_string(),
            source: None,
        };
        assert!(err.is_analysis_failure());
        assert!(!err.is_plan_rejected());
    }

    #[test]
    fn test_unknown_execution_detection() {
        let err = Error::UnknownExecution {
            execution_id: "missing".to_string(),
        };
        assert!(err.is_unknown_execution());
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_config_error_detection() {
        let err = Error::ConfigError {
            message: "bad interval".to_string(),
        };
        assert!(err.is_config_error());
        assert!(!err.is_probe_failure());
    }

    #[test]
    fn test_probe_failure_detection() {
        let err = Error::ProbeFailure {
            message: "meter unavailable".to_string(),
        };
        assert!(err.is_probe_failure());
        assert!(!err.is_unknown_execution());
    }

    #[test]
    fn test_error_display() {
        let err = Error::PlanRejected {
            reason: "critical issue".to_string(),
            total_risk_score: 120,
        };
        let display = format!("{err}");
        assert!(display.contains("Install plan rejected"));
        assert!(display.contains("120"));
    }

    #[test]
    fn test_analysis_failure_with_source() {
        let inner: Box<dyn std::error::Error + Send + Sync> = "io error".into();
        let err = Error::AnalysisFailure {
            plugin: "demo".to_string(),
            message: "could not read code".to_string(),
            source: Some(inner),
        };
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_result_alias() {
        #[allow(clippy::unnecessary_wraps)]
        fn returns_ok() -> Result<i32> {
            Ok(7)
        }

        fn returns_err() -> Result<i32> {
            Err(Error::ConfigError {
                message: "test error".to_string(),
            })
        }

        assert_eq!(returns_ok().unwrap(), 7);
        assert!(returns_err().is_err());
    }
}
