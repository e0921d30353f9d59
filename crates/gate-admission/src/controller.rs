//! The resource admission controller.
//!
//! Single gate that grants or defers permission to execute a plugin
//! function. Bounds logical concurrency, denies admission under resource
//! pressure, queues denied requests in priority order, and reclaims
//! executions whose callers never released them.
//!
//! State machine per execution:
//! `requested -> {granted (active) | queued} -> (active ->) released`;
//! `queued -> active` on drain; `active -> released` via success, error,
//! or timeout reclamation.
//!
//! # Concurrency Model
//!
//! The controller never runs plugin code itself; it only counts and gates.
//! "Concurrency" is the logical count of outstanding admitted executions.
//! All calls return synchronously; queue draining happens as a side effect
//! of [`AdmissionController::release_execution`] and the cleanup timer.
//! Pressure readings refresh on the sampling timer (or via
//! [`AdmissionController::sample_metrics`]); the concurrency bound is
//! enforced against live state on every request.
//!
//! # Examples
//!
//! ```
//! use gate_admission::AdmissionController;
//! use gate_core::{AdmissionConfig, ExecutionOutcome, FunctionName, PluginId, Priority};
//!
//! let config = AdmissionConfig::builder().max_concurrent_executions(1).build();
//! let controller = AdmissionController::new(config);
//!
//! let first = controller.request_execution(
//!     PluginId::new("p1"),
//!     FunctionName::new("run"),
//!     Priority::Normal,
//! );
//! assert!(first.granted);
//!
//! // Slot occupied: second request is queued, not granted
//! let second = controller.request_execution(
//!     PluginId::new("p2"),
//!     FunctionName::new("run"),
//!     Priority::Normal,
//! );
//! assert!(!second.granted);
//!
//! // Releasing the first drains the queue and admits the second
//! controller
//!     .release_execution(&first.execution_id, ExecutionOutcome::Success)
//!     .unwrap();
//! assert_eq!(controller.stats().current.active, 1);
//! ```

use crate::metrics::{ExecutionCounters, ResourceMetrics, ResourceMetricsSampler, ResourceProbe, UnmeteredProbe};
use crate::queue::{AdmissionQueue, QueueEntry};
use gate_core::{
    AdmissionConfig, DenialReason, Error, ExecutionId, ExecutionOutcome, FunctionName, PluginId,
    Priority, Result,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Outcome of an availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    /// Whether a new execution may start now.
    pub can_execute: bool,
    /// Blocking condition when `can_execute` is false.
    pub reason: Option<DenialReason>,
}

impl Availability {
    /// Availability that admits.
    #[must_use]
    pub const fn admit() -> Self {
        Self {
            can_execute: true,
            reason: None,
        }
    }

    /// Availability denied for the given reason.
    #[must_use]
    pub const fn denied(reason: DenialReason) -> Self {
        Self {
            can_execute: false,
            reason: Some(reason),
        }
    }
}

/// Result of an execution request.
///
/// Either an immediate grant (`granted`, `wait_time` zero) or a queued
/// status carrying the blocking reason. The execution id is valid in both
/// cases: a queued entry keeps its id when promoted, so the caller releases
/// the same id it was handed.
#[derive(Debug, Clone)]
pub struct AdmissionTicket {
    /// Whether the execution may start immediately.
    pub granted: bool,
    /// Id for the granted or queued execution.
    pub execution_id: ExecutionId,
    /// Time spent queued before admission; zero for immediate grants.
    pub wait_time: Duration,
    /// Blocking condition when not granted.
    pub reason: Option<DenialReason>,
}

/// Bookkeeping record for one admitted execution.
///
/// Owned exclusively by the controller for its lifetime: created on
/// admission, destroyed on release or timeout reclamation.
#[derive(Debug, Clone)]
pub struct ActiveExecution {
    /// Execution id handed to the caller.
    pub id: ExecutionId,
    /// Plugin whose function is running.
    pub plugin_id: PluginId,
    /// Function being executed.
    pub function_name: FunctionName,
    /// Priority the request carried.
    pub priority: Priority,
    /// When the execution was admitted.
    pub started_at: Instant,
    /// Time spent queued before admission.
    pub wait_time: Duration,
}

/// Configured thresholds, echoed in stats snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdSnapshot {
    /// Memory pressure fraction denying new admissions.
    pub memory_threshold: f64,
    /// CPU pressure fraction denying new admissions.
    pub cpu_threshold: f64,
    /// Maximum simultaneously active executions.
    pub max_concurrent_executions: usize,
    /// Execution age triggering timeout reclamation, in milliseconds.
    pub max_execution_time_ms: u64,
    /// Queue entry age triggering stale eviction, in milliseconds.
    pub max_queue_age_ms: u64,
}

/// Live counts at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrentCounts {
    /// Currently active executions.
    pub active: usize,
    /// Entries waiting in the admission queue.
    pub queued: usize,
}

/// Read-only snapshot of controller state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionStats {
    /// Pressure gauges and execution counters.
    pub metrics: ResourceMetrics,
    /// Configured thresholds.
    pub thresholds: ThresholdSnapshot,
    /// Live active/queued counts.
    pub current: CurrentCounts,
    /// Queue entries evicted as stale since startup.
    pub evicted_stale: u64,
}

/// Mutable state owned by the controller.
///
/// The active map, the queue, and the metrics window are mutated only
/// through the controller's methods, under one mutex.
#[derive(Debug)]
struct Inner {
    active: HashMap<ExecutionId, ActiveExecution>,
    queue: AdmissionQueue,
    sampler: ResourceMetricsSampler,
    total: u64,
    failed: u64,
    timed_out: u64,
    evicted_stale: u64,
}

/// The single gate for plugin execution slots.
///
/// Explicitly constructed and dependency-injected; there is no ambient
/// global instance. Cheap to share via `Arc`.
///
/// # Thread Safety
///
/// `Send + Sync`; internal state is guarded by a mutex so the documented
/// single-owner policy of the active map, queue, and metrics window holds
/// under concurrent callers.
#[derive(Debug)]
pub struct AdmissionController {
    config: AdmissionConfig,
    inner: Mutex<Inner>,
}

impl AdmissionController {
    /// Creates a controller with an [`UnmeteredProbe`] (memory pressure
    /// always reads 0.0).
    ///
    /// # Examples
    ///
    /// ```
    /// use gate_admission::AdmissionController;
    /// use gate_core::AdmissionConfig;
    ///
    /// let controller = AdmissionController::new(AdmissionConfig::default());
    /// assert_eq!(controller.stats().current.active, 0);
    /// ```
    #[must_use]
    pub fn new(config: AdmissionConfig) -> Self {
        Self::with_probe(config, Arc::new(UnmeteredProbe))
    }

    /// Creates a controller over a host-supplied memory probe.
    ///
    /// # Examples
    ///
    /// ```
    /// use gate_admission::{AdmissionController, FixedProbe};
    /// use gate_core::AdmissionConfig;
    /// use std::sync::Arc;
    ///
    /// let controller = AdmissionController::with_probe(
    ///     AdmissionConfig::default(),
    ///     Arc::new(FixedProbe(0.5)),
    /// );
    /// controller.sample_metrics();
    /// assert!(controller.check_availability().can_execute);
    /// ```
    #[must_use]
    pub fn with_probe(config: AdmissionConfig, probe: Arc<dyn ResourceProbe>) -> Self {
        let sampler = ResourceMetricsSampler::new(
            probe,
            config.metrics_window(),
            config.max_concurrent_executions(),
        );
        Self {
            config,
            inner: Mutex::new(Inner {
                active: HashMap::new(),
                queue: AdmissionQueue::new(),
                sampler,
                total: 0,
                failed: 0,
                timed_out: 0,
                evicted_stale: 0,
            }),
        }
    }

    /// Returns the controller configuration.
    #[must_use]
    pub const fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Checks whether a new execution could start now.
    ///
    /// Evaluates, in precedence order: memory pressure, CPU pressure,
    /// concurrency bound. Never fails; pressure readings are the last
    /// sampled values and a missing sample reads as zero pressure.
    #[must_use]
    pub fn check_availability(&self) -> Availability {
        let inner = self.inner.lock().unwrap();
        self.availability_locked(&inner)
    }

    /// Requests a slot for one plugin function execution.
    ///
    /// Grants immediately when available, otherwise enqueues the request
    /// at its priority position and returns the blocking reason. Always
    /// returns synchronously; a queued caller learns of admission by
    /// observing the drain (there is no callback transport in the core).
    #[must_use]
    pub fn request_execution(
        &self,
        plugin_id: PluginId,
        function_name: FunctionName,
        priority: Priority,
    ) -> AdmissionTicket {
        let mut inner = self.inner.lock().unwrap();
        let availability = self.availability_locked(&inner);
        let execution_id = ExecutionId::generate();

        if availability.can_execute {
            tracing::info!(
                "Granted execution {execution_id} for {plugin_id}::{function_name} ({priority})"
            );
            inner.active.insert(
                execution_id.clone(),
                ActiveExecution {
                    id: execution_id.clone(),
                    plugin_id,
                    function_name,
                    priority,
                    started_at: Instant::now(),
                    wait_time: Duration::ZERO,
                },
            );
            inner.total += 1;
            return AdmissionTicket {
                granted: true,
                execution_id,
                wait_time: Duration::ZERO,
                reason: None,
            };
        }

        let reason = availability.reason;
        tracing::debug!(
            "Queued execution {execution_id} for {plugin_id}::{function_name}: {}",
            reason.map_or("unavailable", DenialReason::as_str)
        );
        inner.queue.enqueue(QueueEntry::new(
            execution_id.clone(),
            plugin_id,
            function_name,
            priority,
        ));
        AdmissionTicket {
            granted: false,
            execution_id,
            wait_time: Duration::ZERO,
            reason,
        }
    }

    /// Releases an execution slot and drains the queue.
    ///
    /// Every granted execution must be released exactly once; the cleanup
    /// timer covers callers that never do.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownExecution`] if the id is not active, which
    /// also covers double release and release after reclamation.
    pub fn release_execution(
        &self,
        execution_id: &ExecutionId,
        outcome: ExecutionOutcome,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let Some(active) = inner.active.remove(execution_id) else {
            return Err(Error::UnknownExecution {
                execution_id: execution_id.to_string(),
            });
        };

        let duration = active.started_at.elapsed();
        match outcome {
            ExecutionOutcome::Error => inner.failed += 1,
            ExecutionOutcome::Timeout => inner.timed_out += 1,
            ExecutionOutcome::Success => {}
        }
        tracing::info!(
            "Released execution {execution_id} for {}::{} after {duration:?} ({outcome})",
            active.plugin_id,
            active.function_name
        );

        self.drain_locked(&mut inner);
        Ok(())
    }

    /// Drains the queue while slots are available.
    ///
    /// Promotes the head entry, preserving remaining queue order, and
    /// stops at the first failed availability check. Normally invoked as a
    /// side effect of release and cleanup; exposed for hosts that gate on
    /// external events.
    pub fn process_queue(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.drain_locked(&mut inner);
    }

    /// Reclaims hung executions and evicts stale queue entries.
    ///
    /// Force-releases every active execution older than the configured
    /// maximum execution time with a timeout outcome. This is the only
    /// tolerated path for a caller's failure to release; it guarantees no
    /// permanent slot leak. Runs on the cleanup timer.
    pub fn perform_cleanup(&self) {
        let mut inner = self.inner.lock().unwrap();
        let max_age = self.config.max_execution_time();

        let expired: Vec<ExecutionId> = inner
            .active
            .values()
            .filter(|active| active.started_at.elapsed() > max_age)
            .map(|active| active.id.clone())
            .collect();

        for id in expired {
            if let Some(active) = inner.active.remove(&id) {
                inner.timed_out += 1;
                tracing::warn!(
                    "Reclaimed hung execution {id} for {}::{} after {:?}",
                    active.plugin_id,
                    active.function_name,
                    active.started_at.elapsed()
                );
            }
        }

        let evicted = inner.queue.evict_stale(self.config.max_queue_age());
        if evicted > 0 {
            inner.evicted_stale += evicted as u64;
            tracing::warn!("Evicted {evicted} stale queue entries without admission");
        }

        self.drain_locked(&mut inner);
    }

    /// Records one pressure sample with the live active count.
    ///
    /// Invoked by the background sampling timer; also callable directly by
    /// hosts that drive sampling themselves.
    pub fn sample_metrics(&self) {
        let mut inner = self.inner.lock().unwrap();
        let active = inner.active.len();
        inner.sampler.sample(active);
    }

    /// Returns a read-only snapshot of metrics, thresholds, and counts.
    #[must_use]
    pub fn stats(&self) -> AdmissionStats {
        let inner = self.inner.lock().unwrap();
        let mut metrics = inner.sampler.window().metrics();
        metrics.executions = ExecutionCounters {
            active: inner.active.len(),
            total: inner.total,
            failed: inner.failed,
            timed_out: inner.timed_out,
        };

        AdmissionStats {
            metrics,
            thresholds: ThresholdSnapshot {
                memory_threshold: self.config.memory_threshold(),
                cpu_threshold: self.config.cpu_threshold(),
                max_concurrent_executions: self.config.max_concurrent_executions(),
                max_execution_time_ms: duration_ms(self.config.max_execution_time()),
                max_queue_age_ms: duration_ms(self.config.max_queue_age()),
            },
            current: CurrentCounts {
                active: inner.active.len(),
                queued: inner.queue.len(),
            },
            evicted_stale: inner.evicted_stale,
        }
    }

    /// Spawns the metrics sampling and cleanup timers.
    ///
    /// The tasks hold a clone of the controller and run until aborted;
    /// callers keep the handles and abort them on shutdown.
    ///
    /// # Examples
    ///
    /// ```
    /// use gate_admission::AdmissionController;
    /// use gate_core::AdmissionConfig;
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let controller = Arc::new(AdmissionController::new(AdmissionConfig::default()));
    /// let handles = controller.spawn_background_tasks();
    /// for handle in &handles {
    ///     handle.abort();
    /// }
    /// # }
    /// ```
    #[must_use]
    pub fn spawn_background_tasks(self: &Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let sampling = {
            let controller = Arc::clone(self);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(controller.config.sample_interval());
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    controller.sample_metrics();
                }
            })
        };

        let cleanup = {
            let controller = Arc::clone(self);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(controller.config.cleanup_interval());
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    controller.perform_cleanup();
                }
            })
        };

        vec![sampling, cleanup]
    }

    fn availability_locked(&self, inner: &Inner) -> Availability {
        let metrics = inner.sampler.window().metrics();
        if metrics.memory.current >= self.config.memory_threshold() {
            return Availability::denied(DenialReason::MemoryExhausted);
        }
        if metrics.cpu.current >= self.config.cpu_threshold() {
            return Availability::denied(DenialReason::CpuOverload);
        }
        if inner.active.len() >= self.config.max_concurrent_executions() {
            return Availability::denied(DenialReason::MaxConcurrentReached);
        }
        Availability::admit()
    }

    fn drain_locked(&self, inner: &mut Inner) {
        while !inner.queue.is_empty() {
            if !self.availability_locked(inner).can_execute {
                break;
            }
            let Some(entry) = inner.queue.dequeue_next() else {
                break;
            };
            let wait_time = entry.queued_at.elapsed();
            tracing::info!(
                "Admitted queued execution {} for {}::{} after waiting {wait_time:?}",
                entry.id,
                entry.plugin_id,
                entry.function_name
            );
            inner.active.insert(
                entry.id.clone(),
                ActiveExecution {
                    id: entry.id,
                    plugin_id: entry.plugin_id,
                    function_name: entry.function_name,
                    priority: entry.priority,
                    started_at: Instant::now(),
                    wait_time,
                },
            );
            inner.total += 1;
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FixedProbe;
    use std::thread;

    fn request(controller: &AdmissionController, plugin: &str) -> AdmissionTicket {
        controller.request_execution(
            PluginId::new(plugin),
            FunctionName::new("run"),
            Priority::Normal,
        )
    }

    #[test]
    fn test_grants_until_concurrency_bound() {
        let config = AdmissionConfig::builder().max_concurrent_executions(2).build();
        let controller = AdmissionController::new(config);

        let p1 = request(&controller, "p1");
        let p2 = request(&controller, "p2");
        let p3 = request(&controller, "p3");

        assert!(p1.granted);
        assert_eq!(p1.wait_time, Duration::ZERO);
        assert!(p2.granted);
        assert!(!p3.granted);
        assert_eq!(p3.reason, Some(DenialReason::MaxConcurrentReached));

        let stats = controller.stats();
        assert_eq!(stats.current.active, 2);
        assert_eq!(stats.current.queued, 1);
    }

    #[test]
    fn test_release_drains_queue_in_order() {
        let config = AdmissionConfig::builder().max_concurrent_executions(1).build();
        let controller = AdmissionController::new(config);

        let p1 = request(&controller, "p1");
        let p2 = request(&controller, "p2");
        assert!(!p2.granted);

        controller
            .release_execution(&p1.execution_id, ExecutionOutcome::Success)
            .unwrap();

        let stats = controller.stats();
        assert_eq!(stats.current.active, 1);
        assert_eq!(stats.current.queued, 0);

        // The promoted execution keeps its original id
        controller
            .release_execution(&p2.execution_id, ExecutionOutcome::Success)
            .unwrap();
        assert_eq!(controller.stats().current.active, 0);
    }

    #[test]
    fn test_priority_drain_order() {
        let config = AdmissionConfig::builder().max_concurrent_executions(1).build();
        let controller = AdmissionController::new(config);

        let running = request(&controller, "running");
        let low = controller.request_execution(
            PluginId::new("low"),
            FunctionName::new("run"),
            Priority::Low,
        );
        let high = controller.request_execution(
            PluginId::new("high"),
            FunctionName::new("run"),
            Priority::High,
        );
        assert!(!low.granted);
        assert!(!high.granted);

        // First drain admits the high-priority entry despite arriving later
        controller
            .release_execution(&running.execution_id, ExecutionOutcome::Success)
            .unwrap();
        assert!(
            controller
                .release_execution(&high.execution_id, ExecutionOutcome::Success)
                .is_ok()
        );

        // Second drain admits the low-priority entry
        assert!(
            controller
                .release_execution(&low.execution_id, ExecutionOutcome::Success)
                .is_ok()
        );
    }

    #[test]
    fn test_active_never_exceeds_bound() {
        let config = AdmissionConfig::builder().max_concurrent_executions(3).build();
        let controller = AdmissionController::new(config);

        let mut granted = Vec::new();
        for i in 0..20 {
            let ticket = request(&controller, &format!("p{i}"));
            assert!(controller.stats().current.active <= 3);
            if ticket.granted {
                granted.push(ticket.execution_id);
            }
            if i % 4 == 3
                && let Some(id) = granted.pop()
            {
                controller
                    .release_execution(&id, ExecutionOutcome::Success)
                    .unwrap();
                assert!(controller.stats().current.active <= 3);
            }
        }
    }

    #[test]
    fn test_unknown_release_is_error() {
        let controller = AdmissionController::new(AdmissionConfig::default());
        let err = controller
            .release_execution(&ExecutionId::generate(), ExecutionOutcome::Success)
            .unwrap_err();
        assert!(err.is_unknown_execution());
    }

    #[test]
    fn test_double_release_is_error() {
        let controller = AdmissionController::new(AdmissionConfig::default());
        let ticket = request(&controller, "p1");
        controller
            .release_execution(&ticket.execution_id, ExecutionOutcome::Success)
            .unwrap();
        let err = controller
            .release_execution(&ticket.execution_id, ExecutionOutcome::Success)
            .unwrap_err();
        assert!(err.is_unknown_execution());
    }

    #[test]
    fn test_error_outcome_counts_failed() {
        let controller = AdmissionController::new(AdmissionConfig::default());
        let ticket = request(&controller, "p1");
        controller
            .release_execution(&ticket.execution_id, ExecutionOutcome::Error)
            .unwrap();
        let stats = controller.stats();
        assert_eq!(stats.metrics.executions.failed, 1);
        assert_eq!(stats.metrics.executions.total, 1);
    }

    #[test]
    fn test_memory_pressure_denies() {
        let config = AdmissionConfig::default();
        let controller =
            AdmissionController::with_probe(config, Arc::new(FixedProbe(0.95)));
        controller.sample_metrics();

        let availability = controller.check_availability();
        assert!(!availability.can_execute);
        assert_eq!(availability.reason, Some(DenialReason::MemoryExhausted));

        let ticket = request(&controller, "p1");
        assert!(!ticket.granted);
        assert_eq!(ticket.reason, Some(DenialReason::MemoryExhausted));
    }

    #[test]
    fn test_memory_precedes_cpu_denial() {
        // Saturate both dimensions; memory wins by precedence
        let config = AdmissionConfig::builder().max_concurrent_executions(1).build();
        let controller =
            AdmissionController::with_probe(config, Arc::new(FixedProbe(0.9)));
        let _running = request(&controller, "p1");
        controller.sample_metrics(); // memory=0.9, cpu proxy=1.0

        let availability = controller.check_availability();
        assert_eq!(availability.reason, Some(DenialReason::MemoryExhausted));
    }

    #[test]
    fn test_cpu_pressure_denies_after_sampling() {
        let config = AdmissionConfig::builder().max_concurrent_executions(2).build();
        let controller = AdmissionController::new(config);
        let _a = request(&controller, "p1");
        let _b = request(&controller, "p2");
        controller.sample_metrics(); // cpu proxy = 2/2 = 1.0

        let availability = controller.check_availability();
        assert!(!availability.can_execute);
        assert_eq!(availability.reason, Some(DenialReason::CpuOverload));
    }

    #[test]
    fn test_timeout_reclamation() {
        let config = AdmissionConfig::builder()
            .max_concurrent_executions(1)
            .max_execution_time(Duration::from_millis(10))
            .build();
        let controller = AdmissionController::new(config);

        let hung = request(&controller, "hung");
        assert!(hung.granted);
        let queued = request(&controller, "queued");
        assert!(!queued.granted);

        thread::sleep(Duration::from_millis(25));
        controller.perform_cleanup();

        let stats = controller.stats();
        assert_eq!(stats.metrics.executions.timed_out, 1);
        // Reclamation freed the slot and the drain admitted the queued entry
        assert_eq!(stats.current.active, 1);
        assert_eq!(stats.current.queued, 0);

        // Releasing the reclaimed id now fails: the slot is gone
        let err = controller
            .release_execution(&hung.execution_id, ExecutionOutcome::Success)
            .unwrap_err();
        assert!(err.is_unknown_execution());
    }

    #[test]
    fn test_cleanup_evicts_stale_queue_entries() {
        let config = AdmissionConfig::builder()
            .max_concurrent_executions(1)
            .max_queue_age(Duration::from_millis(10))
            .build();
        let controller = AdmissionController::new(config);

        let _running = request(&controller, "running");
        let _stale = request(&controller, "stale");
        assert_eq!(controller.stats().current.queued, 1);

        thread::sleep(Duration::from_millis(25));
        controller.perform_cleanup();

        let stats = controller.stats();
        assert_eq!(stats.current.queued, 0);
        assert_eq!(stats.evicted_stale, 1);
        // The running execution was not reclaimed (default max execution time)
        assert_eq!(stats.current.active, 1);
    }

    #[test]
    fn test_queued_wait_time_measured() {
        let config = AdmissionConfig::builder().max_concurrent_executions(1).build();
        let controller = AdmissionController::new(config);

        let first = request(&controller, "first");
        let _second = request(&controller, "second");

        thread::sleep(Duration::from_millis(15));
        controller
            .release_execution(&first.execution_id, ExecutionOutcome::Success)
            .unwrap();

        let inner = controller.inner.lock().unwrap();
        let promoted = inner
            .active
            .values()
            .find(|a| a.plugin_id.as_str() == "second")
            .unwrap();
        assert!(promoted.wait_time >= Duration::from_millis(15));
    }

    #[test]
    fn test_stats_snapshot_shape() {
        let controller = AdmissionController::new(AdmissionConfig::default());
        let _ticket = request(&controller, "p1");
        controller.sample_metrics();

        let stats = controller.stats();
        assert_eq!(stats.thresholds.max_concurrent_executions, 5);
        assert_eq!(stats.thresholds.max_execution_time_ms, 300_000);
        assert_eq!(stats.thresholds.max_queue_age_ms, 600_000);
        assert_eq!(stats.metrics.executions.active, 1);
        assert!((stats.metrics.cpu.current - 0.2).abs() < f64::EPSILON);

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("max_concurrent_executions"));
    }

    #[tokio::test]
    async fn test_background_tasks_sample_and_clean() {
        let config = AdmissionConfig::builder()
            .sample_interval(Duration::from_millis(5))
            .cleanup_interval(Duration::from_millis(5))
            .max_execution_time(Duration::from_millis(10))
            .build();
        let controller = Arc::new(AdmissionController::new(config));
        let ticket = request(&controller, "hung");
        assert!(ticket.granted);

        let handles = controller.spawn_background_tasks();
        tokio::time::sleep(Duration::from_millis(50)).await;
        for handle in &handles {
            handle.abort();
        }

        let stats = controller.stats();
        assert_eq!(stats.metrics.executions.timed_out, 1);
        assert_eq!(stats.current.active, 0);
        assert!(stats.metrics.cpu.peak > 0.0);
    }
}
