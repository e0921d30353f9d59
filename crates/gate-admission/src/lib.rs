//! Resource admission control for plugin function execution.
//!
//! Before a plugin function runs, the host asks the
//! [`AdmissionController`] for an execution slot. The controller bounds
//! logical concurrency, denies or queues requests under memory/CPU
//! pressure, drains the queue in priority order as slots free up, and
//! reclaims executions that were never released.
//!
//! # Examples
//!
//! ```
//! use gate_admission::AdmissionController;
//! use gate_core::{AdmissionConfig, ExecutionOutcome, FunctionName, PluginId, Priority};
//!
//! let controller = AdmissionController::new(AdmissionConfig::default());
//!
//! let ticket = controller.request_execution(
//!     PluginId::new("chart-widget"),
//!     FunctionName::new("render"),
//!     Priority::Normal,
//! );
//! assert!(ticket.granted);
//!
//! controller
//!     .release_execution(&ticket.execution_id, ExecutionOutcome::Success)
//!     .unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod controller;
pub mod metrics;
pub mod queue;

pub use controller::{
    ActiveExecution, AdmissionController, AdmissionStats, AdmissionTicket, Availability,
    CurrentCounts, ThresholdSnapshot,
};
pub use metrics::{
    ExecutionCounters, FixedProbe, Gauge, MetricsWindow, ResourceMetrics, ResourceMetricsSampler,
    ResourceProbe, ResourceSample, UnmeteredProbe,
};
pub use queue::{AdmissionQueue, QueueEntry};
