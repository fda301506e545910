use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use kiosk_core::Screen;

use crate::app::{App, AppState, ToastKind};

use super::screens::{admin, centered_rect_fixed, confirmation, lists, welcome};
use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(2), // Breadcrumb / search
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_breadcrumb(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::EditingForm => render_form_overlay(frame, app),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  Church Check-In  ·  {}", app.screen().title());
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + help_hint.len() + 4),
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

/// Selections made so far, or the live search query.
fn render_breadcrumb(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.state == AppState::Searching || !app.search_query.is_empty() {
        let cursor = if app.state == AppState::Searching { "▌" } else { "" };
        Line::from(vec![
            Span::styled("  Search: ", styles::muted_style()),
            Span::styled(format!("{}{}", app.search_query, cursor), styles::search_style()),
        ])
    } else {
        let mut parts: Vec<String> = Vec::new();
        if let Some(gender) = app.flow.gender() {
            parts.push(gender.to_string());
        }
        if let Some(group) = app.flow.group() {
            parts.push(group.name.clone());
        }
        if let Some(subgroup) = app.flow.subgroup() {
            parts.push(subgroup.name.clone());
        }
        Line::from(Span::styled(format!("  {}", parts.join(" › ")), styles::muted_style()))
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.screen() {
        Screen::Welcome => welcome::render(frame, app, area),
        Screen::Groups => lists::render_groups(frame, app, area),
        Screen::Subgroups => lists::render_subgroups(frame, app, area),
        Screen::Members => lists::render_members(frame, app, area),
        Screen::Confirmation => confirmation::render(frame, app, area),
        Screen::Admin => admin::render(frame, app, area),
    }
}

fn shortcuts(screen: Screen) -> &'static str {
    match screen {
        Screen::Welcome => "[m]ale [f]emale | [A]dmin | [q]uit",
        Screen::Groups => "[/] search [a]dd [d]elete | [Esc] back",
        Screen::Subgroups | Screen::Members => "[/] search [a]dd | [Esc] back",
        Screen::Confirmation => "any key to continue",
        Screen::Admin => "[e]xport [E]xport all [r]efresh | [Esc] back",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (left_text, left_style) = if let Some(ref toast) = app.toast {
        let style = match toast.kind {
            ToastKind::Info => styles::highlight_style(),
            ToastKind::Success => styles::success_style(),
            ToastKind::Error => styles::error_style(),
        };
        (format!(" {}: {} ", toast.title, toast.message), style)
    } else if app.pending {
        (" Working... ".to_string(), styles::muted_style())
    } else {
        (format!(" Backend: {} ", app.backend_name()), styles::muted_style())
    };

    let right_text = format!(" {} ", shortcuts(app.screen()));
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 22, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Church Check-In Kiosk", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("m / f", "Choose male or female"),
        help_line("↑/↓", "Move selection"),
        help_line("Enter", "Select / check in"),
        help_line("Esc", "Go back one step"),
        help_line("A", "Admin dashboard"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("/", "Search the list"),
        help_line("a", "Add group, subgroup or member"),
        help_line("d", "Delete the highlighted group"),
        help_line("e / E", "Export today / all (admin)"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_form_overlay(frame: &mut Frame, app: &App) {
    let Some(form) = &app.form else {
        return;
    };
    let height = if form.error.is_some() { 9 } else { 7 };
    let area = centered_rect_fixed(50, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Name: [", styles::muted_style()),
            Span::styled(format!("{:<30}▌", form.name), styles::selected_style()),
            Span::styled("]", styles::muted_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [Enter]", styles::help_key_style()),
            Span::styled(" save  ", styles::muted_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]),
    ];

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(format!(" {} ", form.kind.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let name = app.selected_group().map(|g| g.name.as_str()).unwrap_or_default();
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   Delete group \"{}\"?", name), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use kiosk_core::LocalStore;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_render_welcome_and_help() {
        let mut app = App::new(Config::default(), Arc::new(LocalStore::in_memory()));
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();

        terminal.draw(|f| render(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Welcome!"));
        assert!(text.contains("Female"));

        app.state = AppState::ShowingHelp;
        terminal.draw(|f| render(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("Go back one step"));
    }
}
