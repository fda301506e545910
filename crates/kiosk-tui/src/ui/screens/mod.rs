//! Screen content rendering, one module per kiosk screen.

pub mod admin;
pub mod confirmation;
pub mod lists;
pub mod welcome;

use ratatui::layout::Rect;

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
