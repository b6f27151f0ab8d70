//! Modal dialogs for the terminal dashboard

use ratatui::{
    prelude::*,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Dialog types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogType {
    Information,
    Confirmation,
}

/// What a confirmed dialog triggers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    DeleteTask(String),
}

#[derive(Debug, Clone)]
pub struct Dialog {
    pub title: String,
    pub dialog_type: DialogType,
    pub message: String,
    pub options: Vec<String>,
    pub selected_index: usize,
    pub action: Option<PendingAction>,
}

impl Dialog {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dialog_type: DialogType::Information,
            message: message.into(),
            options: vec!["OK".to_string()],
            selected_index: 0,
            action: None,
        }
    }

    /// Yes/No dialog; "No" is preselected
    pub fn confirm(title: impl Into<String>, message: impl Into<String>, action: PendingAction) -> Self {
        Self {
            title: title.into(),
            dialog_type: DialogType::Confirmation,
            message: message.into(),
            options: vec!["Yes".to_string(), "No".to_string()],
            selected_index: 1,
            action: Some(action),
        }
    }

    pub fn select_prev(&mut self) {
        if !self.options.is_empty() {
            self.selected_index = if self.selected_index > 0 {
                self.selected_index - 1
            } else {
                self.options.len() - 1
            };
        }
    }

    pub fn select_next(&mut self) {
        if !self.options.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.options.len();
        }
    }

    pub fn selected_option(&self) -> Option<&str> {
        self.options.get(self.selected_index).map(|s| s.as_str())
    }

    /// Action to run if the dialog was accepted with the current selection
    pub fn accepted_action(&self) -> Option<PendingAction> {
        match self.dialog_type {
            DialogType::Confirmation if self.selected_option() == Some("Yes") => self.action.clone(),
            _ => None,
        }
    }
}

/// Render a dialog centered on screen
pub fn render_dialog(f: &mut Frame, dialog: &Dialog) {
    let title_len = dialog.title.chars().count();
    let message_len = dialog
        .message
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    let screen_area = f.area();
    let width = (title_len + 6)
        .max(message_len + 4)
        .max(30)
        .min(screen_area.width.saturating_sub(4) as usize) as u16;
    let height = (dialog.message.lines().count() as u16 + 4).clamp(6, 15);

    let dialog_area = Rect {
        x: (screen_area.width.saturating_sub(width)) / 2,
        y: (screen_area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    f.render_widget(Clear, dialog_area);

    let (border_color, icon) = match dialog.dialog_type {
        DialogType::Information => (Color::Green, "ℹ"),
        DialogType::Confirmation => (Color::Yellow, "?"),
    };

    let block = Block::default()
        .title(format!("{} {}", icon, dialog.title))
        .borders(Borders::ALL)
        .style(Style::default().fg(border_color).bold());
    let inner_area = block.inner(dialog_area);
    f.render_widget(block, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(2), Constraint::Length(1)])
        .split(inner_area);

    let message = Paragraph::new(dialog.message.as_str())
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false });
    f.render_widget(message, chunks[0]);

    let mut spans = Vec::new();
    for (idx, option) in dialog.options.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw("   "));
        }
        if idx == dialog.selected_index {
            spans.push(Span::styled(
                format!("[{}]", option),
                Style::default().bg(border_color).fg(Color::Black).bold(),
            ));
        } else {
            spans.push(Span::styled(format!(" {} ", option), Style::default().fg(Color::White)));
        }
    }

    let buttons = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    f.render_widget(buttons, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_defaults_to_no() {
        let dialog = Dialog::confirm("Delete", "Delete task 3?", PendingAction::DeleteTask("3".into()));
        assert_eq!(dialog.selected_option(), Some("No"));
        assert_eq!(dialog.accepted_action(), None);
    }

    #[test]
    fn test_confirm_yes_returns_action() {
        let mut dialog = Dialog::confirm("Delete", "Delete task 3?", PendingAction::DeleteTask("3".into()));
        dialog.select_prev();
        assert_eq!(dialog.accepted_action(), Some(PendingAction::DeleteTask("3".into())));
    }

    #[test]
    fn test_info_has_no_action() {
        let mut dialog = Dialog::info("Screenshot", "http://localhost:8000/a.png");
        dialog.select_next();
        assert_eq!(dialog.accepted_action(), None);
    }
}
