//! UI rendering for the terminal dashboard

use super::app::App;
use super::dialog::render_dialog;
use super::forms::render_create_modal;
use crate::config::DetailPanel;
use crate::dashboard::NoticeLevel;
use crate::models::StepStatus;
use crate::route::Route;
use crate::views::{Badge, CellIndicator, CellView, Definition, DetailView, ListView, StepView, TaskPage, Tone};
use ratatui::{
    prelude::*,
    layout::{Alignment, Constraint, Direction, Layout},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Wrap},
};

/// Render the complete UI
pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(5),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    render_title(f, app, chunks[0]);
    match app.dashboard.route() {
        Route::TaskDetail(_) => render_detail(f, app, chunks[1]),
        _ => render_list(f, app, chunks[1]),
    }
    render_status_bar(f, app, chunks[2]);

    if let Some(modal) = &app.modal {
        let area = centered(f.area(), 70, 80);
        f.render_widget(Clear, area);
        render_create_modal(f, modal, area);
    }
    if let Some(dialog) = &app.dialog {
        render_dialog(f, dialog);
    }
}

fn render_title(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Forge  {}  {}", app.dashboard.route(), app.dashboard.settings().base_url);
    let bar = Paragraph::new(title)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(bar, area);
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Success => Color::Green,
        Tone::Info => Color::Cyan,
        Tone::Neutral => Color::Gray,
        Tone::Error => Color::Red,
    }
}

fn badge_span(badge: &Badge, spinner: char) -> Span<'static> {
    let label = if badge.animated {
        format!("{} {}", spinner, badge.label)
    } else {
        badge.label.clone()
    };
    Span::styled(label, Style::default().fg(tone_color(badge.tone)).bold())
}

fn render_list(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title("Tasks").borders(Borders::ALL);

    let (rows, error) = match app.dashboard.list_view() {
        ListView::Loading { error: None } => {
            let loading = Paragraph::new(format!("{} Loading tasks...", app.spinner()))
                .block(block)
                .alignment(Alignment::Center);
            f.render_widget(loading, area);
            return;
        }
        ListView::Loading { error: Some(error) } => {
            let failed = Paragraph::new(format!("Failed to load tasks: {}\n\nPress r to retry", error))
                .block(block)
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            f.render_widget(failed, area);
            return;
        }
        ListView::Loaded { rows, error } => (rows, error),
    };

    if rows.is_empty() {
        let empty = Paragraph::new("No tasks yet. Press n to create one.")
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(empty, area);
        return;
    }

    let spinner = app.spinner();
    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.name.clone()),
                Cell::from(Line::from(badge_span(&row.badge, spinner))),
                Cell::from(row.created_at.clone()),
                Cell::from(row.id.clone()).style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let title = match error {
        Some(error) => format!("Tasks (refresh failed: {})", error),
        None => "Tasks".to_string(),
    };

    let table = Table::new(
        table_rows,
        [
            Constraint::Percentage(45),
            Constraint::Length(14),
            Constraint::Length(17),
            Constraint::Min(8),
        ],
    )
    .header(
        Row::new(vec!["Name", "Status", "Created", "ID"])
            .style(Style::default().fg(Color::Yellow).bold()),
    )
    .block(Block::default().title(title).borders(Borders::ALL))
    .highlight_style(Style::default().bg(Color::DarkGray).bold())
    .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(app.dashboard.list().selected(app.dashboard.store()));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_detail(f: &mut Frame, app: &App, area: Rect) {
    let page = match app.dashboard.detail_view() {
        Some(DetailView::Loaded(page)) => page,
        Some(DetailView::NotFound { id }) => {
            let missing = Paragraph::new(format!("Task {} was not found.\n\nPress Esc to go back", id))
                .block(Block::default().title("Task").borders(Borders::ALL))
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center);
            f.render_widget(missing, area);
            return;
        }
        Some(DetailView::Loading { error }) => {
            let text = match error {
                Some(error) => format!("Failed to load task: {}", error),
                None => format!("{} Loading task...", app.spinner()),
            };
            let loading = Paragraph::new(text)
                .block(Block::default().title("Task").borders(Borders::ALL))
                .alignment(Alignment::Center);
            f.render_widget(loading, area);
            return;
        }
        None => return,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(5)])
        .split(area);
    render_header(f, app, &page, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(chunks[1]);

    render_definition(f, app, &page.definition, columns[0]);
    render_cells(f, app, &page.cells, columns[1]);

    let panel = app
        .dashboard
        .detail()
        .map(|detail| detail.panel())
        .unwrap_or_default();
    match panel {
        DetailPanel::Screenshots => render_screenshots(f, app, &page.screenshots, columns[2]),
        DetailPanel::Logs => render_logs(f, &page.logs, columns[2]),
    }
}

fn render_header(f: &mut Frame, app: &App, page: &TaskPage, area: Rect) {
    let mut title = vec![
        Span::styled(page.name.clone(), Style::default().bold()),
        Span::raw("  "),
        badge_span(&page.badge, app.spinner()),
    ];
    if page.polling {
        title.push(Span::styled("  (polling)", Style::default().fg(Color::DarkGray)));
    }

    let start = if page.start_enabled {
        Span::styled("[s] Start", Style::default().fg(Color::Green).bold())
    } else {
        Span::styled("[s] Start", Style::default().fg(Color::DarkGray))
    };

    let mut lines = vec![
        Line::from(title),
        Line::from(vec![
            start,
            Span::raw("   [g] Toggle panel   [r] Refresh   [Esc] Back"),
        ]),
    ];
    if let Some(error) = &page.error {
        lines.push(Line::from(Span::styled(
            format!("Refresh failed: {}", error),
            Style::default().fg(Color::Red),
        )));
    }

    let header = Paragraph::new(lines).block(
        Block::default()
            .title(page.description.clone().unwrap_or_else(|| page.id.clone()))
            .borders(Borders::LEFT | Borders::RIGHT | Borders::TOP),
    );
    f.render_widget(header, area);
}

fn step_style(status: StepStatus) -> Style {
    match status {
        StepStatus::Completed => Style::default().fg(Color::Green),
        StepStatus::Running => Style::default().fg(Color::Cyan),
        StepStatus::Error => Style::default().fg(Color::Red),
        StepStatus::Pending => Style::default().fg(Color::Gray),
    }
}

fn render_definition(f: &mut Frame, app: &App, definition: &Definition, area: Rect) {
    match definition {
        Definition::Steps(steps) => {
            let items: Vec<ListItem> = steps
                .iter()
                .map(|step| {
                    let marker = match step.status {
                        StepStatus::Running => app.spinner(),
                        StepStatus::Completed => '✓',
                        StepStatus::Error => '✗',
                        StepStatus::Pending => '·',
                    };
                    ListItem::new(format!("{} {}. {}", marker, step.index + 1, step.content))
                        .style(step_style(step.status))
                })
                .collect();
            let list = List::new(items).block(Block::default().title("Steps").borders(Borders::ALL));
            f.render_widget(list, area);
        }
        Definition::Yaml(yaml) => {
            let yaml = Paragraph::new(yaml.as_str())
                .block(Block::default().title("Definition (YAML)").borders(Borders::ALL))
                .wrap(Wrap { trim: false });
            f.render_widget(yaml, area);
        }
    }
}

fn render_cells(f: &mut Frame, app: &App, cells: &[CellView], area: Rect) {
    let block = Block::default().title("Cells").borders(Borders::ALL);
    if cells.is_empty() {
        let empty = Paragraph::new("No execution yet")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for cell in cells {
        let (marker, color) = match cell.indicator {
            CellIndicator::Solid => ('●', Color::Green),
            CellIndicator::Animated => (app.spinner(), Color::Cyan),
            CellIndicator::Alert => ('!', Color::Red),
            CellIndicator::Dot => ('·', Color::Gray),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", marker), Style::default().fg(color).bold()),
            Span::styled(cell.id.clone(), Style::default().bold()),
            Span::styled(format!(" ({})", cell.status), Style::default().fg(color)),
        ]));
        for code in cell.code.lines() {
            lines.push(Line::from(Span::raw(format!("  {}", code))));
        }
        if let Some(output) = &cell.output {
            for out in output.lines() {
                lines.push(Line::from(Span::styled(
                    format!("  > {}", out),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_screenshots(f: &mut Frame, app: &App, screenshots: &[StepView], area: Rect) {
    let block = Block::default()
        .title("Screenshots (Enter to open)")
        .borders(Borders::ALL);
    if screenshots.is_empty() {
        let empty = Paragraph::new("No screenshots")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, area);
        return;
    }

    let selected = app
        .dashboard
        .detail()
        .map(|detail| detail.selected_screenshot())
        .unwrap_or(0);
    let items: Vec<ListItem> = screenshots
        .iter()
        .enumerate()
        .map(|(idx, step)| {
            let style = if idx == selected {
                Style::default().bg(Color::DarkGray).bold()
            } else {
                step_style(step.status)
            };
            ListItem::new(format!("Step {}: {}", step.index + 1, step.content)).style(style)
        })
        .collect();

    let list = List::new(items).block(block);
    f.render_widget(list, area);
}

fn render_logs(f: &mut Frame, logs: &[String], area: Rect) {
    let block = Block::default().title("Logs").borders(Borders::ALL);
    let visible = area.height.saturating_sub(2) as usize;
    let items: Vec<ListItem> = logs
        .iter()
        .skip(logs.len().saturating_sub(visible))
        .map(|line| ListItem::new(line.clone()))
        .collect();
    let list = List::new(items).block(block);
    f.render_widget(list, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = match app.dashboard.notice() {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Info => Color::Green,
                NoticeLevel::Error => Color::Red,
            };
            (format!(" {}", notice.message), Style::default().fg(color))
        }
        None => {
            let help = match app.dashboard.route() {
                Route::TaskDetail(_) => " ←/→ screenshot  Enter open  g panel  s start  Esc back  q quit",
                _ => " ↑/↓ select  Enter open  n new  s start  d delete  r refresh  q quit",
            };
            (help.to_string(), Style::default().fg(Color::DarkGray))
        }
    };

    let mut spans = vec![Span::styled(text, style)];
    let pending = app.dashboard.outstanding();
    if pending > 0 {
        spans.push(Span::styled(
            format!("  {} {} request(s)", app.spinner(), pending),
            Style::default().fg(Color::Cyan),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Rectangle centered in `area`, sized as a percentage of it
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{Dashboard, DashboardSettings};
    use crate::models::TaskStatus;
    use crate::testing::{fixtures, MockTaskApi};
    use ratatui::backend::TestBackend;
    use std::sync::Arc;
    use tokio::time::Instant;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_list_renders_badges() {
        let mock = Arc::new(MockTaskApi::with_tasks(vec![
            fixtures::task("1", TaskStatus::Completed),
            fixtures::task("2", TaskStatus::Pending),
        ]));
        let mut dashboard = Dashboard::new(mock, DashboardSettings::default());
        let now = Instant::now();
        dashboard.navigate(Route::Tasks, now);
        dashboard.tick(now);
        dashboard.settle(now).await;
        let app = App::new(dashboard, false);

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| render_ui(f, &app)).unwrap();
        let text = buffer_text(&terminal);

        assert!(text.contains("Finished"));
        assert!(text.contains("Pending"));
    }

    #[tokio::test]
    async fn test_detail_not_found_placeholder() {
        let mock = Arc::new(MockTaskApi::new());
        let mut dashboard = Dashboard::new(mock, DashboardSettings::default());
        let now = Instant::now();
        dashboard.navigate(Route::TaskDetail("missing".into()), now);
        dashboard.tick(now);
        dashboard.settle(now).await;
        let app = App::new(dashboard, false);

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| render_ui(f, &app)).unwrap();

        assert!(buffer_text(&terminal).contains("not found"));
    }
}
