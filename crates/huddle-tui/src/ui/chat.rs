//! Chat area
//!
//! Displays the active channel's transcript, oldest first, with a marker
//! line before each day.

use huddle_app::TranscriptEntry;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use crate::View;

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render(frame: &mut Frame, view: &View, area: Rect) {
    let title = view.selection.complete().map_or_else(
        || " No channel ".to_owned(),
        |(workspace, channel)| format!(" {workspace}/#{channel} "),
    );
    let block = Block::default().borders(Borders::ALL).title(title);

    let items: Vec<ListItem> = if view.transcript.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No messages yet",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        view.transcript.iter().map(|entry| entry_item(entry, &view.identity)).collect()
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

fn entry_item<'a>(entry: &'a TranscriptEntry, identity: &str) -> ListItem<'a> {
    match entry {
        TranscriptEntry::DayMarker(date) => ListItem::new(Line::from(Span::styled(
            format!("── {date} ──"),
            Style::default().fg(Color::DarkGray),
        ))),
        TranscriptEntry::Message(message) => {
            let sender_color = if message.sender == identity { Color::Cyan } else { Color::Green };
            ListItem::new(Line::from(vec![
                Span::styled(
                    message.time.format("%H:%M ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("<{}>", message.sender),
                    Style::default().fg(sender_color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::raw(message.body.as_str()),
            ]))
        },
    }
}
