mod controls;
mod sink;

use std::process::ExitCode;

use anyhow::{Context, Result};

use pulse_core::error::ConfigError;
use pulse_core::{logging, MetricRegistry, Scheduler, StopSignal};
use pulse_store::PostgresSource;
use pulse_ui::DashboardRenderer;

use crate::sink::TerminalSink;

/// Exit status for configuration problems; everything else fatal exits 1.
const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    logging::init();
    tracing::info!("pulse starting up");

    match run() {
        Ok(()) => {
            println!("Dashboard stopped. Database connection closed.");
            ExitCode::SUCCESS
        }
        Err(err) if err.downcast_ref::<ConfigError>().is_some() => {
            tracing::error!(error = %format!("{err:#}"), "invalid configuration");
            eprintln!("configuration error: {err:#}");
            ExitCode::from(EXIT_CONFIG)
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "dashboard failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = pulse_config::load()?;
    for name in config.unknown_metrics() {
        tracing::warn!(metric = name, "ignoring unknown metric flag");
    }

    let registry = MetricRegistry::builtin()?;
    let stop = StopSignal::new();
    controls::spawn_signal_listener(stop.clone())?;

    let source = PostgresSource::connect(config.connection(), config.time_zone())?;

    let sink = TerminalSink::enter().context("failed to initialise terminal")?;
    let keys = controls::spawn_key_listener(stop.clone())?;

    let mut scheduler = Scheduler::new(
        config,
        registry,
        source,
        DashboardRenderer::default(),
        sink,
        stop.clone(),
    );
    let outcome = scheduler.run();

    stop.request_stop();
    if keys.join().is_err() {
        tracing::warn!("key listener panicked");
    }

    let summary = outcome?;
    tracing::info!(ticks = summary.ticks, "pulse shutting down");
    Ok(())
}
