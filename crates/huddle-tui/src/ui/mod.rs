//! UI rendering
//!
//! Pure functions from the [`View`] and input line to ratatui widgets.

mod chat;
mod input;
mod search;
mod sidebar;
mod status;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

use crate::{InputState, View};

/// Render the entire UI.
pub fn render(frame: &mut Frame, view: &View, input: &InputState) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    render_main_area(frame, view, *main_area);
    input::render(frame, input, *input_area);
    status::render(frame, view, *status_area);
}

/// Sidebar on the left; transcript, and search results when open, on the
/// right.
fn render_main_area(frame: &mut Frame, view: &View, area: Rect) {
    const SIDEBAR_WIDTH: u16 = 24;
    const CHAT_AREA_MIN_WIDTH: u16 = 20;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(CHAT_AREA_MIN_WIDTH)])
        .split(area);

    let [sidebar_area, right_area] = chunks.as_ref() else {
        return;
    };

    sidebar::render(frame, view, *sidebar_area);

    if !view.show_search {
        chat::render(frame, view, *right_area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(*right_area);

    let [chat_area, search_area] = chunks.as_ref() else {
        return;
    };

    chat::render(frame, view, *chat_area);
    search::render(frame, view, *search_area);
}
