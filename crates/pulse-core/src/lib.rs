//! Core of the pulse dashboard.
//!
//! This crate owns the metrics refresh pipeline: the configuration model,
//! the query-source abstraction, the metric registry and its built-in
//! evaluators, the collector, and the scheduler that drives
//! collect → render → display. Drawing and database drivers live in sibling
//! crates and plug in through [`scheduler::Render`], [`scheduler::FrameSink`]
//! and [`source::QuerySource`].

pub mod collector;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod logging;
pub mod metric;
pub mod metrics;
pub mod registry;
pub mod scheduler;
pub mod source;
pub mod stop;

#[cfg(test)]
mod fake;

pub use collector::collect;
pub use config::Config;
pub use metric::{MetricId, MetricValue, MetricsSnapshot, PostSummary};
pub use registry::MetricRegistry;
pub use scheduler::{Scheduler, SchedulerState};
pub use stop::StopSignal;
