//! Status bar
//!
//! Connection state, identity, active channel and the latest status text
//! or notification.

use huddle_app::ConnectionState;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::View;

/// Render the status bar.
pub fn render(frame: &mut Frame, view: &View, area: Rect) {
    let connection_status = match view.connection {
        ConnectionState::Disconnected => {
            Span::styled("Disconnected", Style::default().fg(Color::Red))
        },
        ConnectionState::Connecting => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        ConnectionState::Connected => Span::styled(
            "Connected",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };

    let mut info = format!(" | {}", view.identity);
    if let Some((workspace, channel)) = view.selection.complete() {
        info.push_str(&format!(" | {workspace}/#{channel}"));
    }
    if let Some(status) = &view.status {
        info.push_str(&format!(" | {status}"));
    }

    let mut spans = vec![Span::raw(" "), connection_status, Span::raw(info)];
    if let Some(notice) = view.latest_notice() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("{}: {}", notice.title, notice.body),
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph =
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
