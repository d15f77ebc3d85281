use std::io::{self, Stdout};

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use pulse_core::scheduler::FrameSink;
use pulse_ui::{draw_frame, Frame};

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Draws dashboard frames on the real terminal.
///
/// The terminal is put into raw mode on the alternate screen when the sink is
/// created and restored by [`FrameSink::finish`], or on drop if the scheduler
/// never got that far.
pub struct TerminalSink {
    terminal: Option<Term>,
}

impl TerminalSink {
    pub fn enter() -> Result<Self> {
        Ok(Self {
            terminal: Some(setup_terminal()?),
        })
    }
}

impl FrameSink<Frame> for TerminalSink {
    fn update(&mut self, frame: &Frame) -> Result<()> {
        if let Some(terminal) = self.terminal.as_mut() {
            terminal.draw(|f| draw_frame(f, frame))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        match self.terminal.take() {
            Some(terminal) => restore_terminal(terminal),
            None => Ok(()),
        }
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        if let Some(terminal) = self.terminal.take() {
            let _ = restore_terminal(terminal);
        }
    }
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err.into());
    }
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(mut terminal: Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
