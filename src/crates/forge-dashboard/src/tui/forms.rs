//! Create-task modal
//!
//! Fields: Name (required), Description, and a multi-line YAML editor.
//! Inside the editor `Tab` indents; focus moves with `Shift+Tab`,
//! `Ctrl+N` and `Ctrl+P`.

use crate::editor::YamlEditor;
use crate::views::CreateTaskForm;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    prelude::*,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Focusable parts of the modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalFocus {
    Name,
    Description,
    Yaml,
    Submit,
}

impl ModalFocus {
    fn next(self) -> Self {
        match self {
            Self::Name => Self::Description,
            Self::Description => Self::Yaml,
            Self::Yaml => Self::Submit,
            Self::Submit => Self::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Name => Self::Submit,
            Self::Description => Self::Name,
            Self::Yaml => Self::Description,
            Self::Submit => Self::Yaml,
        }
    }
}

/// What the caller should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    None,
    Submit,
    Cancel,
}

/// Single-line text input with a character cursor
#[derive(Debug, Clone, Default)]
struct LineInput {
    cursor: usize,
}

impl LineInput {
    fn byte_offset(value: &str, cursor: usize) -> usize {
        value.char_indices().nth(cursor).map(|(i, _)| i).unwrap_or(value.len())
    }

    fn insert(&mut self, value: &mut String, c: char) {
        value.insert(Self::byte_offset(value, self.cursor), c);
        self.cursor += 1;
    }

    fn backspace(&mut self, value: &mut String) {
        if self.cursor > 0 {
            self.cursor -= 1;
            value.remove(Self::byte_offset(value, self.cursor));
        }
    }

    fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn right(&mut self, value: &str) {
        self.cursor = (self.cursor + 1).min(value.chars().count());
    }

    fn display(&self, value: &str, focused: bool) -> String {
        if !focused {
            return value.to_string();
        }
        let mut text = String::new();
        for (i, c) in value.chars().enumerate() {
            if i == self.cursor {
                text.push('│');
            }
            text.push(c);
        }
        if self.cursor >= value.chars().count() {
            text.push('│');
        }
        text
    }
}

/// State of the open modal
#[derive(Debug, Clone)]
pub struct CreateTaskModal {
    pub form: CreateTaskForm,
    pub focus: ModalFocus,
    name_input: LineInput,
    description_input: LineInput,
}

impl Default for CreateTaskModal {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateTaskModal {
    pub fn new() -> Self {
        Self {
            form: CreateTaskForm::new(),
            focus: ModalFocus::Name,
            name_input: LineInput::default(),
            description_input: LineInput::default(),
        }
    }

    pub fn yaml(&self) -> &YamlEditor {
        &self.form.yaml
    }

    pub fn submit_enabled(&self) -> bool {
        self.form.can_submit()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ModalAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return ModalAction::Cancel,
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return ModalAction::None;
            }
            KeyCode::Char('n') if ctrl => {
                self.focus = self.focus.next();
                return ModalAction::None;
            }
            KeyCode::Char('p') if ctrl => {
                self.focus = self.focus.prev();
                return ModalAction::None;
            }
            KeyCode::Char('s') if ctrl => {
                return if self.submit_enabled() {
                    ModalAction::Submit
                } else {
                    ModalAction::None
                };
            }
            _ => {}
        }

        match self.focus {
            ModalFocus::Name => self.edit_line(key, true),
            ModalFocus::Description => self.edit_line(key, false),
            ModalFocus::Yaml => self.edit_yaml(key),
            ModalFocus::Submit => {
                if key.code == KeyCode::Enter && self.submit_enabled() {
                    return ModalAction::Submit;
                }
                if key.code == KeyCode::Tab {
                    self.focus = self.focus.next();
                }
            }
        }
        ModalAction::None
    }

    fn edit_line(&mut self, key: KeyEvent, name: bool) {
        let (input, value) = if name {
            (&mut self.name_input, &mut self.form.name)
        } else {
            (&mut self.description_input, &mut self.form.description)
        };
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert(value, c),
            KeyCode::Backspace => input.backspace(value),
            KeyCode::Left => input.left(),
            KeyCode::Right => input.right(value),
            KeyCode::Tab | KeyCode::Enter | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::Up => self.focus = self.focus.prev(),
            _ => {}
        }
    }

    fn edit_yaml(&mut self, key: KeyEvent) {
        let editor = &mut self.form.yaml;
        match key.code {
            KeyCode::Tab => editor.insert_tab(),
            KeyCode::Enter => editor.insert_newline(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => editor.insert_char(c),
            KeyCode::Backspace => editor.backspace(),
            KeyCode::Delete => editor.delete(),
            KeyCode::Left => editor.move_left(),
            KeyCode::Right => editor.move_right(),
            KeyCode::Up => editor.move_up(),
            KeyCode::Down => editor.move_down(),
            KeyCode::Home => editor.move_home(),
            KeyCode::End => editor.move_end(),
            _ => {}
        }
    }
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::White)
    }
}

/// Render the modal centered over `area`
pub fn render_create_modal(f: &mut Frame, modal: &CreateTaskModal, area: Rect) {
    let width = area.width.saturating_sub(8).min(90);
    let height = area.height.saturating_sub(4).min(30);
    let modal_area = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    f.render_widget(Clear, modal_area);
    let block = Block::default()
        .title("✎ New task")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));
    let inner = block.inner(modal_area);
    f.render_widget(block, modal_area);

    let warning = modal.form.yaml_warning();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(if warning.is_some() { 2 } else { 0 }),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let name_focused = modal.focus == ModalFocus::Name;
    let name = Paragraph::new(modal.name_input.display(&modal.form.name, name_focused)).block(
        Block::default()
            .title("Name *")
            .borders(Borders::ALL)
            .style(field_style(name_focused)),
    );
    f.render_widget(name, chunks[0]);

    let description_focused = modal.focus == ModalFocus::Description;
    let description = Paragraph::new(
        modal
            .description_input
            .display(&modal.form.description, description_focused),
    )
    .block(
        Block::default()
            .title("Description")
            .borders(Borders::ALL)
            .style(field_style(description_focused)),
    );
    f.render_widget(description, chunks[1]);

    render_yaml_editor(f, modal, chunks[2]);

    if let Some(warning) = warning {
        let text = Paragraph::new(format!("⚠ YAML: {}", warning))
            .style(Style::default().fg(Color::Yellow))
            .wrap(Wrap { trim: true });
        f.render_widget(text, chunks[3]);
    }

    let submit_style = if !modal.submit_enabled() {
        Style::default().fg(Color::DarkGray)
    } else if modal.focus == ModalFocus::Submit {
        Style::default().bg(Color::Cyan).fg(Color::Black).bold()
    } else {
        Style::default().fg(Color::White).bold()
    };
    let buttons = Paragraph::new(Line::from(vec![
        Span::styled("[ Create ]", submit_style),
        Span::raw("   "),
        Span::styled("[ Cancel: Esc ]", Style::default().fg(Color::White)),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(buttons, chunks[4]);

    let help = Paragraph::new("Tab indents in YAML · Shift+Tab / Ctrl+N / Ctrl+P move focus · Ctrl+S create")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[5]);
}

fn render_yaml_editor(f: &mut Frame, modal: &CreateTaskModal, area: Rect) {
    let focused = modal.focus == ModalFocus::Yaml;
    let editor = modal.yaml();
    let (cursor_line, cursor_col) = editor.line_col();
    let visible = area.height.saturating_sub(2) as usize;
    let skip = if visible > 0 && cursor_line >= visible { cursor_line + 1 - visible } else { 0 };

    let lines: Vec<Line> = editor
        .lines()
        .enumerate()
        .skip(skip)
        .take(visible)
        .map(|(idx, line)| {
            if focused && idx == cursor_line {
                let split = line.char_indices().nth(cursor_col).map(|(i, _)| i).unwrap_or(line.len());
                Line::from(format!("{}│{}", &line[..split], &line[split..]))
            } else {
                Line::from(line.to_string())
            }
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title("YAML test case")
            .borders(Borders::ALL)
            .style(field_style(focused)),
    );
    f.render_widget(paragraph, area);
}
