//! The three selection lists: groups, subgroups and members.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, AppState};
use crate::ui::styles;
use crate::utils::truncate;

/// Longest name shown before truncating.
const MAX_NAME_WIDTH: usize = 48;

pub fn render_groups(frame: &mut Frame, app: &App, area: Rect) {
    let names: Vec<String> = app.visible_groups().iter().map(|g| g.name.clone()).collect();
    render_list(frame, app, area, " Select Group ", names, "No groups yet. Press [a] to add one.");
}

pub fn render_subgroups(frame: &mut Frame, app: &App, area: Rect) {
    let group = app.flow.group().map(|g| g.name.as_str()).unwrap_or_default();
    let names: Vec<String> = app.visible_subgroups().iter().map(|s| s.name.clone()).collect();
    render_list(
        frame,
        app,
        area,
        &format!(" {} - Select Subgroup ", group),
        names,
        "No subgroups in this group. Press [a] to add one.",
    );
}

pub fn render_members(frame: &mut Frame, app: &App, area: Rect) {
    let subgroup = app.flow.subgroup().map(|s| s.name.as_str()).unwrap_or_default();
    let names: Vec<String> = app.visible_members().iter().map(|m| m.name.clone()).collect();
    render_list(
        frame,
        app,
        area,
        &format!(" {} - Select Your Name ", subgroup),
        names,
        "No members found. Press [a] to add yourself.",
    );
}

fn render_list(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    names: Vec<String>,
    empty_hint: &str,
) {
    let title = format!("{}({}) ", title, names.len());
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.state == AppState::Normal));

    if names.is_empty() {
        let message = if app.pending {
            Span::styled("Loading...", styles::muted_style())
        } else if !app.search_query.is_empty() {
            Span::styled(format!("Nothing matches \"{}\"", app.search_query), styles::muted_style())
        } else {
            Span::styled(empty_hint.to_string(), styles::muted_style())
        };
        frame.render_widget(Paragraph::new(Line::from(message)).block(block), area);
        return;
    }

    let items: Vec<ListItem> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let style = if i == app.selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(format!("  {}", truncate(name, MAX_NAME_WIDTH)))).style(style)
        })
        .collect();

    let list = List::new(items).block(block);

    let mut state = ListState::default();
    state.select(Some(app.selection));

    frame.render_stateful_widget(list, area, &mut state);
}
