use chrono::Local;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::centered_rect_fixed;
use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect_fixed(48, 10, area);

    let lines = match app.flow.last_check_in() {
        Some(record) => vec![
            Line::from(Span::styled("✓ Check-in Successful", styles::success_style())),
            Line::from(""),
            Line::from(Span::styled(record.member_name.clone(), styles::title_style())),
            Line::from(Span::styled(
                format!("{} / {}", record.group_name, record.subgroup_name),
                styles::list_item_style(),
            )),
            Line::from(Span::styled(
                record
                    .check_in_time
                    .with_timezone(&Local)
                    .format("%H:%M")
                    .to_string(),
                styles::muted_style(),
            )),
            Line::from(""),
            Line::from(Span::styled("Press any key to continue", styles::muted_style())),
        ],
        None => vec![Line::from(Span::styled("Nothing to confirm", styles::muted_style()))],
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}
