//! The refresh loop: collect → render → display, once per interval.

use std::fmt;

use crate::collector;
use crate::config::Config;
use crate::error::RenderError;
use crate::metric::MetricsSnapshot;
use crate::registry::MetricRegistry;
use crate::source::QuerySource;
use crate::stop::StopSignal;

/// Turns a snapshot into something a sink can display.
///
/// Implementations must be pure: the same snapshot and config always give the
/// same frame, and absent or failed metrics are ordinary inputs.
pub trait Render {
    type Frame;

    fn render(&self, snapshot: &MetricsSnapshot, config: &Config)
        -> Result<Self::Frame, RenderError>;
}

/// Receives one frame per tick and a final notification at shutdown.
pub trait FrameSink<F> {
    fn update(&mut self, frame: &F) -> anyhow::Result<()>;

    /// Called once when the scheduler stops, whatever the reason.
    ///
    /// The default implementation is a no-op.
    fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug)]
pub enum SchedulerError {
    /// `run` was called on a scheduler that already ran.
    AlreadyStarted,
    Render(RenderError),
    Sink(anyhow::Error),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyStarted => write!(f, "scheduler has already been started"),
            Self::Render(err) => write!(f, "render failed: {err}"),
            Self::Sink(err) => write!(f, "display update failed: {err:#}"),
        }
    }
}

impl std::error::Error for SchedulerError {}

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub ticks: u64,
    /// Metric failures summed over all ticks.
    pub failed_metrics: u64,
}

/// Drives the dashboard until stopped. Single use.
pub struct Scheduler<S, R, K> {
    config: Config,
    registry: MetricRegistry,
    source: S,
    renderer: R,
    sink: K,
    stop: StopSignal,
    state: SchedulerState,
}

impl<S, R, K> Scheduler<S, R, K>
where
    S: QuerySource,
    R: Render,
    K: FrameSink<R::Frame>,
{
    /// Build a scheduler around an already validated config and an
    /// established source.
    pub fn new(
        config: Config,
        registry: MetricRegistry,
        source: S,
        renderer: R,
        sink: K,
        stop: StopSignal,
    ) -> Self {
        Self {
            config,
            registry,
            source,
            renderer,
            sink,
            stop,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    fn transition(&mut self, to: SchedulerState) {
        tracing::debug!(from = ?self.state, to = ?to, "scheduler state change");
        self.state = to;
    }

    /// Run ticks until a stop is requested or a tick fails fatally.
    ///
    /// The source is closed and the sink finished on every exit path.
    pub fn run(&mut self) -> Result<RunSummary, SchedulerError> {
        if self.state != SchedulerState::Idle {
            return Err(SchedulerError::AlreadyStarted);
        }

        self.transition(SchedulerState::Running);
        tracing::info!(
            interval_ms = self.config.refresh_interval().as_millis() as u64,
            metrics = ?self.config.enabled(),
            "dashboard running"
        );

        let mut summary = RunSummary::default();
        let outcome = self.run_ticks(&mut summary);

        self.transition(SchedulerState::Stopping);
        self.shutdown();
        self.transition(SchedulerState::Stopped);

        tracing::info!(
            ticks = summary.ticks,
            failed_metrics = summary.failed_metrics,
            "dashboard stopped"
        );
        outcome.map(|()| summary)
    }

    fn run_ticks(&mut self, summary: &mut RunSummary) -> Result<(), SchedulerError> {
        let interval = self.config.refresh_interval();
        loop {
            if self.stop.is_stop_requested() {
                tracing::info!("stop requested before tick");
                return Ok(());
            }

            let snapshot = collector::collect(&self.config, &self.registry, &mut self.source);
            summary.failed_metrics += snapshot.failure_count() as u64;

            let frame = self
                .renderer
                .render(&snapshot, &self.config)
                .map_err(|err| {
                    tracing::error!(error = %err, "snapshot could not be rendered");
                    SchedulerError::Render(err)
                })?;
            drop(snapshot);

            self.sink.update(&frame).map_err(|err| {
                tracing::error!(error = %format!("{err:#}"), "display update failed");
                SchedulerError::Sink(err)
            })?;
            summary.ticks += 1;

            if self.stop.wait_timeout(interval) {
                tracing::info!("stop requested during wait");
                return Ok(());
            }
        }
    }

    fn shutdown(&mut self) {
        if let Err(err) = self.source.close() {
            tracing::warn!(error = %err, "failed to close query source");
        } else {
            tracing::info!("query source closed");
        }
        if let Err(err) = self.sink.finish() {
            tracing::warn!(error = %format!("{err:#}"), "display sink did not finish cleanly");
        }
    }
}
