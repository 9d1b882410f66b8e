//! Workspace sidebar
//!
//! Lists workspaces with the channels of each beneath it.

use huddle_app::Workspace;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use crate::View;

const ACTIVE_PREFIX: &str = ">";
const INACTIVE_PREFIX: &str = " ";
const PENDING_SUFFIX: &str = " (pending)";

/// Render the sidebar.
pub fn render(frame: &mut Frame, view: &View, area: Rect) {
    let active_workspace = view.selection.workspace.as_deref();
    let active_channel = view.selection.channel.as_deref();

    let mut items = Vec::new();
    for workspace in &view.workspaces {
        let is_active = active_workspace == Some(workspace.name.as_str());
        items.push(workspace_item(workspace, is_active));

        for channel in &workspace.channels {
            let selected = is_active && active_channel == Some(channel.name.as_str());
            let (prefix, style) = if selected {
                (ACTIVE_PREFIX, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            } else {
                (INACTIVE_PREFIX, Style::default())
            };
            items.push(ListItem::new(Line::from(vec![
                Span::raw(prefix),
                Span::raw("  "),
                Span::styled(format!("#{}", channel.name), style),
                pending_marker(channel.pending),
            ])));
        }
    }

    let block = Block::default().borders(Borders::ALL).title(" Workspaces ");
    frame.render_widget(List::new(items).block(block), area);
}

fn workspace_item(workspace: &Workspace, is_active: bool) -> ListItem<'_> {
    let (prefix, style) = if is_active {
        (ACTIVE_PREFIX, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    } else {
        (INACTIVE_PREFIX, Style::default().add_modifier(Modifier::BOLD))
    };
    ListItem::new(Line::from(vec![
        Span::raw(prefix),
        Span::raw(" "),
        Span::styled(workspace.name.as_str(), style),
        pending_marker(workspace.pending),
    ]))
}

fn pending_marker(pending: bool) -> Span<'static> {
    if pending {
        Span::styled(PENDING_SUFFIX, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw("")
    }
}
