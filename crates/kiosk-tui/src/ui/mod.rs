//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, status bar and overlays
//! - `input`: keyboard event handling
//! - `styles`: color scheme and text styling
//! - `screens`: per-screen content (welcome, lists, confirmation, admin)

pub mod input;
pub mod render;
pub mod screens;
pub mod styles;
