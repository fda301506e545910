use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use kiosk_core::Gender;

use crate::app::{App, HISTORY_LIMIT};
use crate::ui::styles;
use crate::utils::truncate;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_stats(frame, app, chunks[0]);
    render_history(frame, app, chunks[1]);
}

fn stat_line(label: &str, value: usize) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<18}", label), styles::muted_style()),
        Span::styled(value.to_string(), styles::highlight_style()),
    ])
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Today ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let Some(admin) = &app.admin else {
        let paragraph = Paragraph::new(Span::styled("  Loading...", styles::muted_style())).block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let report = &admin.report;
    let mut lines = vec![
        Line::from(Span::styled(
            format!("  Service date {}", report.service_date.format("%Y-%m-%d")),
            styles::muted_style(),
        )),
        Line::from(""),
        stat_line("Present today", report.total_attendees),
        stat_line("All-time records", admin.all.len()),
        Line::from(""),
        Line::from(Span::styled("  By gender", styles::title_style())),
    ];
    for gender in Gender::ALL {
        lines.push(stat_line(gender.as_str(), report.gender_count(gender)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  By group", styles::title_style())));
    let groups = report.sorted_group_stats();
    if groups.is_empty() {
        lines.push(Line::from(Span::styled("  No check-ins yet", styles::muted_style())));
    }
    for (name, count) in groups {
        lines.push(stat_line(&truncate(name, 18), count));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  [e]", styles::help_key_style()),
        Span::styled(" export today  ", styles::help_desc_style()),
        Span::styled("[E]", styles::help_key_style()),
        Span::styled(" export all", styles::help_desc_style()),
    ]));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    let history = app.history();
    let block = Block::default()
        .title(format!(" Recent Check-ins (last {}) ", HISTORY_LIMIT))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let items: Vec<ListItem> = history
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let time = record
                .check_in_time
                .with_timezone(&Local)
                .format("%m-%d %H:%M");
            let style = if i == app.history_scroll {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", time), styles::muted_style()),
                Span::styled(format!("{:<24}", truncate(&record.member_name, 24)), style),
                Span::styled(
                    format!("{} / {}", record.group_name, record.subgroup_name),
                    styles::muted_style(),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    if !history.is_empty() {
        state.select(Some(app.history_scroll));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
