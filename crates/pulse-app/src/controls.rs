//! Helper threads that ask the scheduler to stop.
//!
//! Neither thread touches dashboard state; they only call
//! [`StopSignal::request_stop`].

use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use pulse_core::StopSignal;

const KEY_POLL: Duration = Duration::from_millis(100);

/// Keys that end the session: `q`, `Esc`, and `Ctrl+C` (raw mode swallows
/// the interrupt signal, so it arrives as a key).
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Watch the keyboard until a quit key is pressed or a stop is requested
/// elsewhere.
pub fn spawn_key_listener(stop: StopSignal) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("pulse-keys".into())
        .spawn(move || {
            while !stop.is_stop_requested() {
                match event::poll(KEY_POLL) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "keyboard polling failed, quit keys disabled");
                        return;
                    }
                }
                match event::read() {
                    Ok(Event::Key(key)) if is_quit_key(&key) => {
                        tracing::info!(key = ?key.code, "quit key pressed");
                        stop.request_stop();
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "reading terminal event failed");
                    }
                }
            }
        })
        .context("failed to spawn key listener")
}

/// Request a stop on SIGINT or SIGTERM.
///
/// The thread runs a single-threaded tokio runtime and is left detached; it
/// ends with the process.
pub fn spawn_signal_listener(stop: StopSignal) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build signal runtime")?;

    thread::Builder::new()
        .name("pulse-signals".into())
        .spawn(move || {
            runtime.block_on(async move {
                match wait_for_signal().await {
                    Ok(name) => tracing::info!(signal = name, "shutdown signal received"),
                    Err(err) => {
                        tracing::warn!(error = %err, "signal handlers unavailable");
                        return;
                    }
                }
                stop.request_stop();
            });
        })
        .context("failed to spawn signal listener")?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn quit_keys() {
        assert!(is_quit_key(&press(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn other_keys_are_ignored() {
        assert!(!is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit_key(&press(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(!is_quit_key(&press(KeyCode::Char('x'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn key_release_is_ignored() {
        let mut key = press(KeyCode::Char('q'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert!(!is_quit_key(&key));
    }

    #[test]
    fn key_listener_exits_once_stopped() {
        let stop = StopSignal::new();
        stop.request_stop();
        let handle = spawn_key_listener(stop).unwrap();
        handle.join().unwrap();
    }
}
