//! Resource metrics sampling for admission decisions.
//!
//! Maintains a bounded history of memory/CPU pressure readings with a
//! running peak and a windowed average. Memory readings come from a
//! host-supplied [`ResourceProbe`]; CPU pressure is approximated as
//! `active_executions / max_concurrent`, an explicit, documented proxy,
//! not a true CPU measurement.
//!
//! # Examples
//!
//! ```
//! use gate_admission::metrics::{FixedProbe, ResourceMetricsSampler};
//! use std::sync::Arc;
//!
//! let mut sampler = ResourceMetricsSampler::new(Arc::new(FixedProbe(0.5)), 100, 5);
//! sampler.sample(2); // 2 active executions
//!
//! let metrics = sampler.window().metrics();
//! assert!((metrics.memory.current - 0.5).abs() < f64::EPSILON);
//! assert!((metrics.cpu.current - 0.4).abs() < f64::EPSILON);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Supplies the current memory pressure reading.
///
/// How "memory used" is measured is a host concern; the gate only consumes
/// a fraction in `[0, 1]` (used over limit). Implementations must be cheap
/// enough to call on every availability check interval.
pub trait ResourceProbe: Send + Sync + std::fmt::Debug {
    /// Returns the current memory pressure as a fraction of the configured
    /// ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`gate_core::Error::ProbeFailure`] when no reading can be
    /// produced. The sampler logs the failure and keeps the last-known
    /// reading in place; it never propagates.
    fn memory_fraction(&self) -> gate_core::Result<f64>;
}

/// Probe for hosts without a memory meter. Always reads 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnmeteredProbe;

impl ResourceProbe for UnmeteredProbe {
    fn memory_fraction(&self) -> gate_core::Result<f64> {
        Ok(0.0)
    }
}

/// Probe returning a fixed reading. Useful in tests and for hosts that
/// update a shared value out of band.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub f64);

impl ResourceProbe for FixedProbe {
    fn memory_fraction(&self) -> gate_core::Result<f64> {
        Ok(self.0)
    }
}

/// One recorded pressure sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    /// When the sample was taken (UTC).
    pub timestamp: DateTime<Utc>,
    /// Memory pressure fraction in `[0, 1]`.
    pub memory: f64,
    /// CPU pressure proxy in `[0, 1]`.
    pub cpu: f64,
    /// Number of active executions at sample time.
    pub active_executions: usize,
}

/// Current/peak/average triple for one pressure dimension.
///
/// `peak` is the running maximum over the sampler's lifetime; `average` is
/// the arithmetic mean over the bounded window only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Gauge {
    /// Most recent reading.
    pub current: f64,
    /// Running maximum since startup.
    pub peak: f64,
    /// Arithmetic mean over the retained window.
    pub average: f64,
}

/// Execution counters carried alongside the pressure gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionCounters {
    /// Currently active executions.
    pub active: usize,
    /// Executions admitted since startup.
    pub total: u64,
    /// Executions released with an error outcome.
    pub failed: u64,
    /// Executions force-released by timeout reclamation.
    pub timed_out: u64,
}

/// Snapshot of the process-wide resource metrics.
///
/// # Examples
///
/// ```
/// use gate_admission::metrics::MetricsWindow;
///
/// let window = MetricsWindow::new(100);
/// let metrics = window.metrics();
/// assert_eq!(metrics.memory.current, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceMetrics {
    /// Memory pressure gauge.
    pub memory: Gauge,
    /// CPU pressure proxy gauge.
    pub cpu: Gauge,
    /// Execution counters.
    pub executions: ExecutionCounters,
}

/// Fixed-capacity ring buffer of pressure samples.
///
/// Evicts the oldest sample on overflow and keeps running peaks for both
/// dimensions. Averages are recomputed over the retained samples.
#[derive(Debug, Clone)]
pub struct MetricsWindow {
    samples: VecDeque<ResourceSample>,
    capacity: usize,
    memory_peak: f64,
    cpu_peak: f64,
}

impl MetricsWindow {
    /// Creates an empty window with the given capacity.
    ///
    /// Capacity 0 is treated as 1: a window must be able to hold at least
    /// the latest sample.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            memory_peak: 0.0,
            cpu_peak: 0.0,
        }
    }

    /// Records a sample, evicting the oldest when the window is full.
    pub fn record(&mut self, sample: ResourceSample) {
        self.memory_peak = self.memory_peak.max(sample.memory);
        self.cpu_peak = self.cpu_peak.max(sample.cpu);
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Returns the most recent sample, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&ResourceSample> {
        self.samples.back()
    }

    /// Returns the number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when no samples have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the window capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Builds a metrics snapshot from the retained samples.
    ///
    /// Execution counters are zeroed; the controller overlays its own
    /// counters when assembling stats.
    #[must_use]
    pub fn metrics(&self) -> ResourceMetrics {
        let (memory_current, cpu_current) = self
            .latest()
            .map_or((0.0, 0.0), |s| (s.memory, s.cpu));

        let len = self.samples.len();
        let (memory_avg, cpu_avg) = if len == 0 {
            (0.0, 0.0)
        } else {
            let (mem_sum, cpu_sum) = self
                .samples
                .iter()
                .fold((0.0, 0.0), |(m, c), s| (m + s.memory, c + s.cpu));
            #[allow(clippy::cast_precision_loss)]
            let denom = len as f64;
            (mem_sum / denom, cpu_sum / denom)
        };

        ResourceMetrics {
            memory: Gauge {
                current: memory_current,
                peak: self.memory_peak,
                average: memory_avg,
            },
            cpu: Gauge {
                current: cpu_current,
                peak: self.cpu_peak,
                average: cpu_avg,
            },
            executions: ExecutionCounters::default(),
        }
    }
}

/// Periodic sampler feeding the metrics window.
///
/// Owned by the admission controller; `sample` is invoked by the background
/// sampling timer with the live active-execution count. Sampling never
/// fails: a probe error is logged at warn level and the last-known memory
/// reading stands.
#[derive(Debug)]
pub struct ResourceMetricsSampler {
    probe: Arc<dyn ResourceProbe>,
    window: MetricsWindow,
    max_concurrent: usize,
    last_memory: f64,
}

impl ResourceMetricsSampler {
    /// Creates a sampler over the given probe and window capacity.
    #[must_use]
    pub fn new(probe: Arc<dyn ResourceProbe>, window_capacity: usize, max_concurrent: usize) -> Self {
        Self {
            probe,
            window: MetricsWindow::new(window_capacity),
            max_concurrent,
            last_memory: 0.0,
        }
    }

    /// Takes one sample with the given active-execution count.
    ///
    /// CPU pressure is the documented proxy
    /// `min(active / max_concurrent, 1)`, which conflates "many
    /// executions" with "high CPU load" when no direct reading exists.
    pub fn sample(&mut self, active_executions: usize) {
        let memory = match self.probe.memory_fraction() {
            Ok(value) => value.clamp(0.0, 1.0),
            Err(err) => {
                tracing::warn!("Resource probe failed, keeping last reading: {err}");
                self.last_memory
            }
        };
        self.last_memory = memory;

        let cpu = Self::cpu_proxy(active_executions, self.max_concurrent);

        self.window.record(ResourceSample {
            timestamp: Utc::now(),
            memory,
            cpu,
            active_executions,
        });
        tracing::trace!(
            "Sampled resources: memory={memory:.3} cpu={cpu:.3} active={active_executions}"
        );
    }

    /// Returns the CPU pressure proxy for the given counts.
    #[must_use]
    pub fn cpu_proxy(active: usize, max_concurrent: usize) -> f64 {
        if max_concurrent == 0 {
            return 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = active as f64 / max_concurrent as f64;
        ratio.min(1.0)
    }

    /// Returns the underlying metrics window.
    #[must_use]
    pub const fn window(&self) -> &MetricsWindow {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FailingProbe;

    impl ResourceProbe for FailingProbe {
        fn memory_fraction(&self) -> gate_core::Result<f64> {
            Err(gate_core::Error::ProbeFailure {
                message: "meter offline".to_string(),
            })
        }
    }

    #[test]
    fn test_window_records_and_evicts() {
        let mut window = MetricsWindow::new(3);
        for i in 0..5 {
            window.record(ResourceSample {
                timestamp: Utc::now(),
                memory: f64::from(i) / 10.0,
                cpu: 0.0,
                active_executions: 0,
            });
        }
        // Oldest two evicted; window holds samples 2, 3, 4
        assert_eq!(window.len(), 3);
        let metrics = window.metrics();
        assert!((metrics.memory.current - 0.4).abs() < f64::EPSILON);
        assert!((metrics.memory.average - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_window_peak_survives_eviction() {
        let mut window = MetricsWindow::new(2);
        window.record(ResourceSample {
            timestamp: Utc::now(),
            memory: 0.9,
            cpu: 0.5,
            active_executions: 1,
        });
        window.record(ResourceSample {
            timestamp: Utc::now(),
            memory: 0.1,
            cpu: 0.1,
            active_executions: 1,
        });
        window.record(ResourceSample {
            timestamp: Utc::now(),
            memory: 0.2,
            cpu: 0.2,
            active_executions: 1,
        });
        let metrics = window.metrics();
        // 0.9 sample is gone from the window but the peak remains
        assert!((metrics.memory.peak - 0.9).abs() < f64::EPSILON);
        assert!((metrics.cpu.peak - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_window_metrics() {
        let window = MetricsWindow::new(10);
        let metrics = window.metrics();
        assert_eq!(metrics.memory.current, 0.0);
        assert_eq!(metrics.cpu.average, 0.0);
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let mut window = MetricsWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.record(ResourceSample {
            timestamp: Utc::now(),
            memory: 0.3,
            cpu: 0.0,
            active_executions: 0,
        });
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_cpu_proxy() {
        assert!((ResourceMetricsSampler::cpu_proxy(2, 5) - 0.4).abs() < f64::EPSILON);
        assert!((ResourceMetricsSampler::cpu_proxy(5, 5) - 1.0).abs() < f64::EPSILON);
        // Proxy saturates at 1.0
        assert!((ResourceMetricsSampler::cpu_proxy(9, 5) - 1.0).abs() < f64::EPSILON);
        assert!((ResourceMetricsSampler::cpu_proxy(1, 0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sampler_reads_probe() {
        let mut sampler = ResourceMetricsSampler::new(Arc::new(FixedProbe(0.65)), 10, 4);
        sampler.sample(1);
        let metrics = sampler.window().metrics();
        assert!((metrics.memory.current - 0.65).abs() < f64::EPSILON);
        assert!((metrics.cpu.current - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sampler_clamps_probe_reading() {
        let mut sampler = ResourceMetricsSampler::new(Arc::new(FixedProbe(1.7)), 10, 4);
        sampler.sample(0);
        assert!((sampler.window().metrics().memory.current - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sampler_swallows_probe_failure() {
        let mut sampler = ResourceMetricsSampler::new(Arc::new(FailingProbe), 10, 4);
        sampler.sample(2);
        // Failure leaves the last-known reading (initially 0.0) in place
        let metrics = sampler.window().metrics();
        assert_eq!(sampler.window().len(), 1);
        assert_eq!(metrics.memory.current, 0.0);
        assert!((metrics.cpu.current - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metrics_serialization() {
        let mut window = MetricsWindow::new(5);
        window.record(ResourceSample {
            timestamp: Utc::now(),
            memory: 0.4,
            cpu: 0.2,
            active_executions: 1,
        });
        let metrics = window.metrics();
        let json = serde_json::to_string(&metrics).unwrap();
        let back: ResourceMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(metrics, back);
    }
}
