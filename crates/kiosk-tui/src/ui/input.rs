//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use kiosk_core::{Gender, Screen};

use crate::app::{App, AppState, ExportScope};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.delete_selected_group();
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::EditingForm => {
            handle_form_input(app, key);
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    // Any key clears the confirmation screen
    if app.screen() == Screen::Confirmation {
        app.dismiss_confirmation();
        return Ok(false);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('A') => app.open_admin(),
        KeyCode::Esc => app.go_back(),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(false),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(true),
        KeyCode::Enter => app.activate(),
        _ => match app.screen() {
            Screen::Welcome => handle_welcome_input(app, key),
            Screen::Groups | Screen::Subgroups | Screen::Members => handle_list_input(app, key),
            Screen::Admin => handle_admin_input(app, key),
            Screen::Confirmation => {}
        },
    }

    Ok(false)
}

fn handle_welcome_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('m') | KeyCode::Char('M') => app.select_gender(Gender::Male),
        KeyCode::Char('f') | KeyCode::Char('F') => app.select_gender(Gender::Female),
        _ => {}
    }
}

fn handle_list_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
            app.search_query.clear();
            app.selection = 0;
        }
        KeyCode::Char('a') => {
            if !app.pending {
                app.open_form();
            }
        }
        KeyCode::Char('d') if app.screen() == Screen::Groups => {
            if !app.pending {
                app.request_delete();
            }
        }
        _ => {}
    }
}

fn handle_admin_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('e') => app.export(ExportScope::Today),
        KeyCode::Char('E') => app.export(ExportScope::All),
        KeyCode::Char('r') => app.load_admin(),
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
        }
        KeyCode::Enter => {
            // Keep search query active
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            app.selection = 0;
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.selection = 0;
        }
        _ => {}
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_form(),
        KeyCode::Enter => app.submit_form(),
        KeyCode::Backspace => {
            if let Some(form) = app.form.as_mut() {
                form.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(form) = app.form.as_mut() {
                form.push(c);
            }
        }
        _ => {}
    }
}
