//! Input state and key handling for the TUI.
//!
//! Owns the edit buffer and cursor. Enter parses the line into a command;
//! Tab and the arrow keys move through channels and workspaces.

use huddle_app::Intent;

use crate::{
    View,
    commands::{self, Command},
};

/// Key input events from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Character input.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Tab key.
    Tab,
    /// Shift+Tab.
    BackTab,
    /// Escape key.
    Esc,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Home key.
    Home,
    /// End key.
    End,
}

/// Edit buffer with a cursor counted in characters.
#[derive(Debug, Default)]
pub struct InputState {
    buffer: String,
    cursor: usize,
}

impl InputState {
    /// Create a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text in the input buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor position, in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Handle a key.
    ///
    /// Returns the intent to hand to the runtime, if any. Purely local
    /// feedback (help, argument errors) goes straight to `view`.
    pub fn handle_key(&mut self, key: KeyInput, view: &mut View) -> Option<Intent> {
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_index(self.cursor);
                self.buffer.insert(at, c);
                self.cursor += 1;
                None
            },
            KeyInput::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
                None
            },
            KeyInput::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
                None
            },
            KeyInput::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            },
            KeyInput::Right => {
                self.cursor = (self.cursor + 1).min(self.len());
                None
            },
            KeyInput::Home => {
                self.cursor = 0;
                None
            },
            KeyInput::End => {
                self.cursor = self.len();
                None
            },
            KeyInput::Enter => self.handle_enter(view),
            KeyInput::Tab => view.cycle_channel(true).map(Intent::SelectChannel),
            KeyInput::BackTab => view.cycle_channel(false).map(Intent::SelectChannel),
            KeyInput::Down => view.cycle_workspace(true).map(Intent::SelectWorkspace),
            KeyInput::Up => view.cycle_workspace(false).map(Intent::SelectWorkspace),
            KeyInput::Esc if view.show_search => {
                view.close_search();
                None
            },
            KeyInput::Esc => Some(Intent::Quit),
        }
    }

    fn handle_enter(&mut self, view: &mut View) -> Option<Intent> {
        let text = std::mem::take(&mut self.buffer);
        self.cursor = 0;

        if text.trim().is_empty() {
            return None;
        }

        match commands::parse(&text) {
            Command::Help => {
                view.set_status(commands::HELP);
                None
            },
            Command::ClearSearch => {
                view.close_search();
                None
            },
            Command::Unknown { input } => {
                view.set_status(format!("Unknown command {input}, try /help"));
                None
            },
            Command::InvalidArgs { command, error } => {
                view.set_status(format!("/{command}: {error}"));
                None
            },
            Command::Nick(name) => {
                view.identity.clone_from(&name);
                Some(Intent::RegisterIdentity(name))
            },
            command => command.into_intent(),
        }
    }

    fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(at, _)| at)
    }
}
