//! Input event handling for the terminal dashboard

use super::app::App;
use super::forms::ModalAction;
use crate::config::DetailPanel;
use crate::route::Route;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::time::Instant;
use tracing::debug;

/// Handles keyboard input events
pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    /// Handle a keyboard event
    pub fn handle_key_event(&self, key_event: KeyEvent, app: &mut App, now: Instant) {
        debug!("Key event: {:?}", key_event);

        if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
            app.should_quit = true;
            return;
        }

        if app.dialog.is_some() {
            self.handle_dialog(key_event, app);
        } else if app.modal.is_some() {
            self.handle_modal(key_event, app);
        } else if matches!(app.dashboard.route(), Route::TaskDetail(_)) {
            self.handle_detail(key_event, app, now);
        } else {
            self.handle_list(key_event, app, now);
        }
    }

    fn handle_dialog(&self, key_event: KeyEvent, app: &mut App) {
        let Some(dialog) = app.dialog.as_mut() else {
            return;
        };
        match key_event.code {
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => dialog.select_prev(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => dialog.select_next(),
            KeyCode::Char('y') => {
                dialog.selected_index = 0;
                app.close_dialog(true);
            }
            KeyCode::Char('n') | KeyCode::Esc => app.close_dialog(false),
            KeyCode::Enter => app.close_dialog(true),
            _ => {}
        }
    }

    fn handle_modal(&self, key_event: KeyEvent, app: &mut App) {
        let Some(modal) = app.modal.as_mut() else {
            return;
        };
        match modal.handle_key(key_event) {
            ModalAction::Submit => app.submit_create_modal(),
            ModalAction::Cancel => app.modal = None,
            ModalAction::None => {}
        }
    }

    fn handle_list(&self, key_event: KeyEvent, app: &mut App, now: Instant) {
        match key_event.code {
            KeyCode::Up | KeyCode::Char('k') => {
                let (list, store) = app.dashboard.list_mut();
                list.select_prev(store);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let (list, store) = app.dashboard.list_mut();
                list.select_next(store);
            }
            KeyCode::Enter => app.open_selected(now),
            KeyCode::Char('n') => app.open_create_modal(),
            KeyCode::Char('d') => app.confirm_delete_selected(),
            KeyCode::Char('s') => app.start_selected(),
            KeyCode::Char('r') => app.dashboard.refresh(),
            KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
            _ => {}
        }
    }

    fn handle_detail(&self, key_event: KeyEvent, app: &mut App, now: Instant) {
        match key_event.code {
            KeyCode::Esc | KeyCode::Backspace => app.dashboard.navigate(Route::Tasks, now),
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Char('s') => app.start_current(),
            KeyCode::Char('r') => app.dashboard.refresh(),
            KeyCode::Char('g') => {
                if let Some(detail) = app.dashboard.detail_mut() {
                    detail.toggle_panel();
                }
            }
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Left => {
                let count = app.screenshot_count();
                if let Some(detail) = app.dashboard.detail_mut() {
                    detail.select_prev_screenshot(count);
                }
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Right => {
                let count = app.screenshot_count();
                if let Some(detail) = app.dashboard.detail_mut() {
                    detail.select_next_screenshot(count);
                }
            }
            KeyCode::Enter => {
                let gallery = app
                    .dashboard
                    .detail()
                    .is_some_and(|detail| detail.panel() == DetailPanel::Screenshots);
                if gallery {
                    app.open_selected_screenshot();
                }
            }
            _ => {}
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
