//! Application state for the terminal dashboard

use super::dialog::{Dialog, PendingAction};
use super::forms::CreateTaskModal;
use crate::dashboard::Dashboard;
use crate::route::Route;
use crate::views::DetailView;
use tokio::time::Instant;
use tracing::{info, warn};

/// Spinner frames for animated badges and running cells
pub const SPINNER: [char; 4] = ['◐', '◓', '◑', '◒'];

/// Main application structure
pub struct App {
    pub dashboard: Dashboard,
    pub modal: Option<CreateTaskModal>,
    pub dialog: Option<Dialog>,
    pub open_in_browser: bool,
    pub should_quit: bool,
    frame: usize,
}

impl App {
    pub fn new(dashboard: Dashboard, open_in_browser: bool) -> Self {
        Self {
            dashboard,
            modal: None,
            dialog: None,
            open_in_browser,
            should_quit: false,
            frame: 0,
        }
    }

    /// Advance animations by one frame
    pub fn on_frame(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    pub fn spinner(&self) -> char {
        SPINNER[self.frame % SPINNER.len()]
    }

    pub fn open_create_modal(&mut self) {
        self.modal = Some(CreateTaskModal::new());
    }

    /// Submit the modal; it stays open if the form is rejected
    pub fn submit_create_modal(&mut self) {
        let Some(modal) = self.modal.as_ref() else {
            return;
        };
        if self.dashboard.create_task(&modal.form).is_ok() {
            self.modal = None;
        }
    }

    /// Ask before deleting the selected row
    pub fn confirm_delete_selected(&mut self) {
        let store = self.dashboard.store();
        let Some(id) = self.dashboard.list().selected_id(store) else {
            return;
        };
        let name = store
            .task_list()
            .data()
            .and_then(|rows| rows.iter().find(|row| row.id == id))
            .map(|row| row.name.clone())
            .unwrap_or_else(|| id.clone());
        self.dialog = Some(Dialog::confirm(
            "Delete task",
            format!("Delete '{}'? This cannot be undone.", name),
            PendingAction::DeleteTask(id),
        ));
    }

    /// Close the dialog, running its action if it was accepted
    pub fn close_dialog(&mut self, accepted: bool) {
        if let Some(dialog) = self.dialog.take() {
            if !accepted {
                return;
            }
            if let Some(PendingAction::DeleteTask(id)) = dialog.accepted_action() {
                self.dashboard.delete_task(&id);
            }
        }
    }

    pub fn start_selected(&mut self) {
        let store = self.dashboard.store();
        if let Some(id) = self.dashboard.list().selected_id(store) {
            self.dashboard.start_task(&id);
        }
    }

    pub fn open_selected(&mut self, now: Instant) {
        let store = self.dashboard.store();
        if let Some(id) = self.dashboard.list().selected_id(store) {
            self.dashboard.navigate(Route::TaskDetail(id), now);
        }
    }

    /// Start the task shown in the detail view, if it is not active
    pub fn start_current(&mut self) {
        let Some(detail) = self.dashboard.detail() else {
            return;
        };
        if detail.start_enabled(self.dashboard.store()) {
            let id = detail.task_id().to_string();
            self.dashboard.start_task(&id);
        }
    }

    /// Show (and optionally open) the selected screenshot in full size
    pub fn open_selected_screenshot(&mut self) {
        let Some(DetailView::Loaded(page)) = self.dashboard.detail_view() else {
            return;
        };
        let Some(detail) = self.dashboard.detail() else {
            return;
        };
        let Some(step) = page.screenshots.get(detail.selected_screenshot()) else {
            return;
        };
        let Some(url) = step.screenshot_url.clone() else {
            return;
        };

        let mut message = format!("Step {}: {}\n\n{}", step.index + 1, step.content, url);
        if self.open_in_browser {
            match webbrowser::open(&url) {
                Ok(()) => info!(%url, "Opened screenshot in browser"),
                Err(e) => {
                    warn!(%url, error = %e, "Could not open browser");
                    message.push_str(&format!("\n\nCould not open a browser: {}", e));
                }
            }
        }
        self.dialog = Some(Dialog::info("Screenshot", message));
    }

    pub fn screenshot_count(&self) -> usize {
        match self.dashboard.detail_view() {
            Some(DetailView::Loaded(page)) => page.screenshots.len(),
            _ => 0,
        }
    }
}
