//! Search results pane

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use crate::View;

/// Render the search results pane.
pub fn render(frame: &mut Frame, view: &View, area: Rect) {
    let title = format!(" Search results ({}) - Esc to close ", view.search_results.len());
    let block = Block::default().borders(Borders::ALL).title(title);

    let items: Vec<ListItem> = view
        .search_results
        .iter()
        .map(|hit| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} {} ", hit.date, hit.time.format("%H:%M")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{}/#{} ", hit.workspace, hit.channel),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(format!("<{}>", hit.sender), Style::default().fg(Color::Green)),
                Span::raw(" "),
                Span::raw(hit.body.as_str()),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
