//! Configuration types for the plugin gate.
//!
//! Two independent configurations: [`AdmissionConfig`] for the resource
//! admission controller and [`SecurityGateConfig`] for the security risk
//! gate. Both carry documented defaults and a builder.
//!
//! # Examples
//!
//! ```
//! use gate_core::AdmissionConfig;
//! use std::time::Duration;
//!
//! let config = AdmissionConfig::builder()
//!     .max_concurrent_executions(3)
//!     .max_execution_time(Duration::from_secs(60))
//!     .build();
//!
//! assert_eq!(config.max_concurrent_executions(), 3);
//! ```

use std::time::Duration;

/// Configuration for the resource admission controller.
///
/// Thresholds are fractions in `[0, 1]`; intervals and ages are durations.
///
/// # Examples
///
/// ```
/// use gate_core::AdmissionConfig;
///
/// let config = AdmissionConfig::default();
/// assert_eq!(config.max_concurrent_executions(), 5);
/// assert!((config.memory_threshold() - 0.8).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Memory pressure fraction at which new admissions are denied
    memory_threshold: f64,

    /// CPU pressure fraction at which new admissions are denied
    cpu_threshold: f64,

    /// Maximum number of simultaneously active executions
    max_concurrent_executions: usize,

    /// Interval of the background metrics sampling timer
    sample_interval: Duration,

    /// Interval of the background cleanup/reclamation timer
    cleanup_interval: Duration,

    /// Age past which an active execution is force-released as a timeout
    max_execution_time: Duration,

    /// Age past which a queued entry is evicted without admission
    max_queue_age: Duration,

    /// Capacity of the metrics ring buffer
    metrics_window: usize,
}

impl AdmissionConfig {
    /// Default memory pressure threshold: 0.8
    pub const DEFAULT_MEMORY_THRESHOLD: f64 = 0.8;

    /// Default CPU pressure threshold: 0.9
    pub const DEFAULT_CPU_THRESHOLD: f64 = 0.9;

    /// Default maximum concurrent executions: 5
    pub const DEFAULT_MAX_CONCURRENT: usize = 5;

    /// Default metrics sampling interval: 5 seconds
    pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 5_000;

    /// Default cleanup interval: 30 seconds
    pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 30_000;

    /// Default maximum execution time before reclamation: 5 minutes
    pub const DEFAULT_MAX_EXECUTION_TIME_MS: u64 = 300_000;

    /// Default maximum queue age before eviction: 10 minutes
    pub const DEFAULT_MAX_QUEUE_AGE_MS: u64 = 600_000;

    /// Default metrics ring buffer capacity: 100 samples
    pub const DEFAULT_METRICS_WINDOW: usize = 100;

    /// Creates a new admission configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use gate_core::AdmissionConfig;
    ///
    /// let config = AdmissionConfig::builder()
    ///     .memory_threshold(0.7)
    ///     .build();
    /// assert!((config.memory_threshold() - 0.7).abs() < f64::EPSILON);
    /// ```
    #[inline]
    #[must_use]
    pub fn builder() -> AdmissionConfigBuilder {
        AdmissionConfigBuilder::default()
    }

    /// Returns the memory pressure threshold.
    #[inline]
    #[must_use]
    pub const fn memory_threshold(&self) -> f64 {
        self.memory_threshold
    }

    /// Returns the CPU pressure threshold.
    #[inline]
    #[must_use]
    pub const fn cpu_threshold(&self) -> f64 {
        self.cpu_threshold
    }

    /// Returns the maximum number of concurrent executions.
    #[inline]
    #[must_use]
    pub const fn max_concurrent_executions(&self) -> usize {
        self.max_concurrent_executions
    }

    /// Returns the metrics sampling interval.
    #[inline]
    #[must_use]
    pub const fn sample_interval(&self) -> Duration {
        self.sample_interval
    }

    /// Returns the cleanup timer interval.
    #[inline]
    #[must_use]
    pub const fn cleanup_interval(&self) -> Duration {
        self.cleanup_interval
    }

    /// Returns the maximum execution age before timeout reclamation.
    #[inline]
    #[must_use]
    pub const fn max_execution_time(&self) -> Duration {
        self.max_execution_time
    }

    /// Returns the maximum queue entry age before stale eviction.
    #[inline]
    #[must_use]
    pub const fn max_queue_age(&self) -> Duration {
        self.max_queue_age
    }

    /// Returns the metrics ring buffer capacity.
    #[inline]
    #[must_use]
    pub const fn metrics_window(&self) -> usize {
        self.metrics_window
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            memory_threshold: Self::DEFAULT_MEMORY_THRESHOLD,
            cpu_threshold: Self::DEFAULT_CPU_THRESHOLD,
            max_concurrent_executions: Self::DEFAULT_MAX_CONCURRENT,
            sample_interval: Duration::from_millis(Self::DEFAULT_SAMPLE_INTERVAL_MS),
            cleanup_interval: Duration::from_millis(Self::DEFAULT_CLEANUP_INTERVAL_MS),
            max_execution_time: Duration::from_millis(Self::DEFAULT_MAX_EXECUTION_TIME_MS),
            max_queue_age: Duration::from_millis(Self::DEFAULT_MAX_QUEUE_AGE_MS),
            metrics_window: Self::DEFAULT_METRICS_WINDOW,
        }
    }
}

/// Builder for [`AdmissionConfig`].
///
/// # Examples
///
/// ```
/// use gate_core::AdmissionConfig;
/// use std::time::Duration;
///
/// let config = AdmissionConfig::builder()
///     .memory_threshold(0.75)
///     .cpu_threshold(0.85)
///     .max_concurrent_executions(10)
///     .cleanup_interval(Duration::from_secs(15))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct AdmissionConfigBuilder {
    memory_threshold: Option<f64>,
    cpu_threshold: Option<f64>,
    max_concurrent_executions: Option<usize>,
    sample_interval: Option<Duration>,
    cleanup_interval: Option<Duration>,
    max_execution_time: Option<Duration>,
    max_queue_age: Option<Duration>,
    metrics_window: Option<usize>,
}

impl AdmissionConfigBuilder {
    /// Sets the memory pressure threshold (fraction in `[0, 1]`).
    #[must_use]
    pub const fn memory_threshold(mut self, threshold: f64) -> Self {
        self.memory_threshold = Some(threshold);
        self
    }

    /// Sets the CPU pressure threshold (fraction in `[0, 1]`).
    #[must_use]
    pub const fn cpu_threshold(mut self, threshold: f64) -> Self {
        self.cpu_threshold = Some(threshold);
        self
    }

    /// Sets the maximum number of concurrent executions.
    #[must_use]
    pub const fn max_concurrent_executions(mut self, max: usize) -> Self {
        self.max_concurrent_executions = Some(max);
        self
    }

    /// Sets the metrics sampling interval.
    #[must_use]
    pub const fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = Some(interval);
        self
    }

    /// Sets the cleanup timer interval.
    #[must_use]
    pub const fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Sets the maximum execution age before timeout reclamation.
    #[must_use]
    pub const fn max_execution_time(mut self, max: Duration) -> Self {
        self.max_execution_time = Some(max);
        self
    }

    /// Sets the maximum queue entry age before stale eviction.
    #[must_use]
    pub const fn max_queue_age(mut self, max: Duration) -> Self {
        self.max_queue_age = Some(max);
        self
    }

    /// Sets the metrics ring buffer capacity.
    #[must_use]
    pub const fn metrics_window(mut self, capacity: usize) -> Self {
        self.metrics_window = Some(capacity);
        self
    }

    /// Builds the admission configuration, filling unset fields with
    /// defaults.
    #[must_use]
    pub fn build(self) -> AdmissionConfig {
        AdmissionConfig {
            memory_threshold: self
                .memory_threshold
                .unwrap_or(AdmissionConfig::DEFAULT_MEMORY_THRESHOLD),
            cpu_threshold: self
                .cpu_threshold
                .unwrap_or(AdmissionConfig::DEFAULT_CPU_THRESHOLD),
            max_concurrent_executions: self
                .max_concurrent_executions
                .unwrap_or(AdmissionConfig::DEFAULT_MAX_CONCURRENT),
            sample_interval: self.sample_interval.unwrap_or_else(|| {
                Duration::from_millis(AdmissionConfig::DEFAULT_SAMPLE_INTERVAL_MS)
            }),
            cleanup_interval: self.cleanup_interval.unwrap_or_else(|| {
                Duration::from_millis(AdmissionConfig::DEFAULT_CLEANUP_INTERVAL_MS)
            }),
            max_execution_time: self.max_execution_time.unwrap_or_else(|| {
                Duration::from_millis(AdmissionConfig::DEFAULT_MAX_EXECUTION_TIME_MS)
            }),
            max_queue_age: self.max_queue_age.unwrap_or_else(|| {
                Duration::from_millis(AdmissionConfig::DEFAULT_MAX_QUEUE_AGE_MS)
            }),
            metrics_window: self
                .metrics_window
                .unwrap_or(AdmissionConfig::DEFAULT_METRICS_WINDOW),
        }
    }
}

/// Configuration for the security risk gate.
///
/// # Examples
///
/// ```
/// use gate_core::SecurityGateConfig;
///
/// let config = SecurityGateConfig::default();
/// assert!(!config.strict_mode());
/// assert_eq!(config.risk_score_reject_threshold(), 80);
/// assert_eq!(config.plan_risk_reject_threshold(), 200);
/// ```
#[derive(Debug, Clone)]
pub struct SecurityGateConfig {
    /// Reject on high-severity issues and flag untrusted sources
    strict_mode: bool,

    /// Per-plugin risk score above which the verdict is a rejection
    risk_score_reject_threshold: u32,

    /// Plan-level ceiling on the sum of per-plugin risk scores
    plan_risk_reject_threshold: u32,

    /// Capacity of the verdict cache
    cache_capacity: usize,
}

impl SecurityGateConfig {
    /// Default per-plugin risk rejection threshold: 80
    pub const DEFAULT_RISK_SCORE_REJECT: u32 = 80;

    /// Default plan-level aggregate risk ceiling: 200
    pub const DEFAULT_PLAN_RISK_REJECT: u32 = 200;

    /// Default verdict cache capacity: 256 entries
    pub const DEFAULT_CACHE_CAPACITY: usize = 256;

    /// Creates a new security gate configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SecurityGateConfigBuilder {
        SecurityGateConfigBuilder::default()
    }

    /// Returns whether strict mode is enabled.
    ///
    /// Under strict mode, any high-severity issue rejects the plugin and
    /// an untrusted source is itself flagged as a high-severity issue.
    #[inline]
    #[must_use]
    pub const fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// Returns the per-plugin risk score rejection threshold.
    #[inline]
    #[must_use]
    pub const fn risk_score_reject_threshold(&self) -> u32 {
        self.risk_score_reject_threshold
    }

    /// Returns the plan-level aggregate risk ceiling.
    #[inline]
    #[must_use]
    pub const fn plan_risk_reject_threshold(&self) -> u32 {
        self.plan_risk_reject_threshold
    }

    /// Returns the verdict cache capacity.
    #[inline]
    #[must_use]
    pub const fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }
}

impl Default for SecurityGateConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            risk_score_reject_threshold: Self::DEFAULT_RISK_SCORE_REJECT,
            plan_risk_reject_threshold: Self::DEFAULT_PLAN_RISK_REJECT,
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Builder for [`SecurityGateConfig`].
///
/// # Examples
///
/// ```
/// use gate_core::SecurityGateConfig;
///
/// let config = SecurityGateConfig::builder()
///     .strict_mode(true)
///     .risk_score_reject_threshold(60)
///     .build();
/// assert!(config.strict_mode());
/// ```
#[derive(Debug, Default)]
pub struct SecurityGateConfigBuilder {
    strict_mode: Option<bool>,
    risk_score_reject_threshold: Option<u32>,
    plan_risk_reject_threshold: Option<u32>,
    cache_capacity: Option<usize>,
}

impl SecurityGateConfigBuilder {
    /// Enables or disables strict mode.
    #[must_use]
    pub const fn strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = Some(strict);
        self
    }

    /// Sets the per-plugin risk score rejection threshold.
    #[must_use]
    pub const fn risk_score_reject_threshold(mut self, threshold: u32) -> Self {
        self.risk_score_reject_threshold = Some(threshold);
        self
    }

    /// Sets the plan-level aggregate risk ceiling.
    #[must_use]
    pub const fn plan_risk_reject_threshold(mut self, threshold: u32) -> Self {
        self.plan_risk_reject_threshold = Some(threshold);
        self
    }

    /// Sets the verdict cache capacity.
    #[must_use]
    pub const fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Builds the security gate configuration, filling unset fields with
    /// defaults.
    #[must_use]
    pub fn build(self) -> SecurityGateConfig {
        SecurityGateConfig {
            strict_mode: self.strict_mode.unwrap_or(false),
            risk_score_reject_threshold: self
                .risk_score_reject_threshold
                .unwrap_or(SecurityGateConfig::DEFAULT_RISK_SCORE_REJECT),
            plan_risk_reject_threshold: self
                .plan_risk_reject_threshold
                .unwrap_or(SecurityGateConfig::DEFAULT_PLAN_RISK_REJECT),
            cache_capacity: self
                .cache_capacity
                .unwrap_or(SecurityGateConfig::DEFAULT_CACHE_CAPACITY),
        }
    }
}
