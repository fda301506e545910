use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use kiosk_core::Gender;

use super::centered_rect_fixed;
use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect_fixed(44, 11, area);

    let mut lines = vec![
        Line::from(Span::styled("Welcome!", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled("Please select to check in", styles::muted_style())),
        Line::from(""),
    ];

    for (i, gender) in Gender::ALL.iter().enumerate() {
        let key = gender.as_str().chars().next().unwrap_or(' ').to_ascii_lowercase();
        let style = if i == app.gender_selection {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("[{}] ", key), styles::help_key_style()),
            Span::styled(format!("{:<10}", gender.as_str()), style),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}
