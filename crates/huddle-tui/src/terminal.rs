//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. The connection itself is
//! owned by the runtime.

use std::{
    io::{self, Stdout, stdout},
    time::Duration,
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use huddle_app::{Driver, Intent, NotificationSink, PresentationSink, ViewUpdate};
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;

use crate::{InputState, KeyInput, View, ui};

/// Longest wait between redraw checks.
const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The terminal stopped producing input events.
    #[error("terminal input closed")]
    InputClosed,
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Owns the input line and the view model. Updates from the runtime only
/// mark the screen dirty; drawing happens on the next poll.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    input_state: InputState,
    view: View,
    dirty: bool,
    restored: bool,
}

impl TerminalDriver {
    /// Enter raw mode and the alternate screen.
    pub fn new(identity: impl Into<String>) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            input_state: InputState::new(),
            view: View::new(identity),
            dirty: true,
            restored: false,
        })
    }

    /// Convert crossterm `KeyCode` to `KeyInput`.
    fn convert_key(code: KeyCode) -> Option<KeyInput> {
        match code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Tab => Some(KeyInput::Tab),
            KeyCode::BackTab => Some(KeyInput::BackTab),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Up => Some(KeyInput::Up),
            KeyCode::Down => Some(KeyInput::Down),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Intent> {
        self.dirty = true;
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Intent::Quit);
        }
        let input = Self::convert_key(key.code)?;
        self.input_state.handle_key(input, &mut self.view)
    }

    fn render(&mut self) -> Result<(), TerminalError> {
        self.terminal.draw(|frame| ui::render(frame, &self.view, &self.input_state))?;
        self.dirty = false;
        Ok(())
    }

    fn restore(&mut self) {
        if std::mem::replace(&mut self.restored, true) {
            return;
        }
        if let Err(error) = disable_raw_mode() {
            tracing::warn!(%error, "failed to leave raw mode");
        }
        if let Err(error) = stdout().execute(LeaveAlternateScreen) {
            tracing::warn!(%error, "failed to leave alternate screen");
        }
    }
}

impl NotificationSink for TerminalDriver {
    fn notify(&mut self, title: &str, body: &str) {
        tracing::info!(title, body, "notification");
        self.view.notify(title, body);
        self.dirty = true;
    }
}

impl PresentationSink for TerminalDriver {
    fn present(&mut self, update: ViewUpdate) {
        self.view.apply(update);
        self.dirty = true;
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_intent(&mut self) -> Result<Option<Intent>, Self::Error> {
        if self.dirty {
            self.render()?;
        }

        tokio::select! {
            biased;

            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        Ok(self.handle_key(key))
                    },
                    Some(Ok(Event::Resize(..))) => {
                        self.dirty = true;
                        Ok(None)
                    },
                    Some(Ok(_)) => Ok(None),
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    None => Err(TerminalError::InputClosed),
                }
            }

            () = tokio::time::sleep(REDRAW_INTERVAL) => Ok(None),
        }
    }

    fn stop(&mut self) {
        self.restore();
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.restore();
    }
}
