//! Headless task watcher
//!
//! Runs the detail view model without a terminal UI and prints what
//! changes between polls until both pollers settle.

use super::task::colored_status;
use crate::api::TaskApi;
use crate::dashboard::{Dashboard, DashboardSettings, NoticeLevel};
use crate::error::{ForgeError, Result};
use crate::models::TaskStatus;
use crate::route::Route;
use crate::shutdown::ShutdownCoordinator;
use crate::views::{DetailView, TaskPage};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

/// Tracks what has already been printed
#[derive(Debug, Default)]
pub struct WatchReport {
    status: Option<TaskStatus>,
    logs_seen: usize,
    cells: HashMap<String, String>,
}

impl WatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines describing what changed since the previous page
    pub fn observe(&mut self, page: &TaskPage) -> Vec<String> {
        let mut lines = Vec::new();

        if self.status.as_ref() != Some(&page.status) {
            lines.push(format!("{} {}", "Status:".bold(), colored_status(&page.status)));
            self.status = Some(page.status.clone());
        }

        // a fresh execution starts its log over
        if page.logs.len() < self.logs_seen {
            self.logs_seen = 0;
        }
        for line in &page.logs[self.logs_seen..] {
            lines.push(line.dimmed().to_string());
        }
        self.logs_seen = page.logs.len();

        for cell in &page.cells {
            let changed = self.cells.get(&cell.id).map(String::as_str) != Some(cell.status.as_str());
            if changed {
                let label = match cell.status.as_str() {
                    "success" => cell.status.green(),
                    "error" => cell.status.red(),
                    "running" => cell.status.cyan(),
                    _ => cell.status.normal(),
                };
                lines.push(format!("  cell {} {}", cell.id, label));
                if cell.status == "error" {
                    if let Some(output) = &cell.output {
                        lines.push(format!("    {}", output.red()));
                    }
                }
                self.cells.insert(cell.id.clone(), cell.status.clone());
            }
        }

        lines
    }

    pub fn last_status(&self) -> Option<&TaskStatus> {
        self.status.as_ref()
    }
}

fn spinner(id: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {wide_msg}") {
        bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
    }
    bar.set_message(format!("Watching task {}", id));
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Follow a task until it settles, optionally starting it first
///
/// Returns the last status seen. Ctrl+C stops the watch, not the task.
pub async fn watch_task(
    api: Arc<dyn TaskApi>,
    settings: DashboardSettings,
    id: &str,
    start: bool,
    shutdown: &ShutdownCoordinator,
) -> Result<Option<TaskStatus>> {
    let mut dashboard = Dashboard::new(api, settings);
    dashboard.navigate(Route::TaskDetail(id.to_string()), Instant::now());

    if start {
        dashboard.start_task(id);
        dashboard.settle(Instant::now()).await;
        if let Some(notice) = dashboard.notice().filter(|n| n.level == NoticeLevel::Error) {
            return Err(ForgeError::Other(notice.message.clone()));
        }
        println!("{}", "✓ Task execution started".green().bold());
    }

    let bar = spinner(id);
    let mut report = WatchReport::new();

    loop {
        let now = Instant::now();
        dashboard.tick(now);
        dashboard.settle(now).await;

        match dashboard.detail_view() {
            Some(DetailView::Loaded(page)) => {
                for line in report.observe(&page) {
                    bar.suspend(|| println!("{}", line));
                }
                bar.set_message(format!("{} ({})", page.name, page.badge.label));
            }
            Some(DetailView::NotFound { id }) => {
                bar.finish_and_clear();
                return Err(ForgeError::NotFound(format!("task {}", id)));
            }
            Some(DetailView::Loading { error: Some(error) }) => {
                bar.finish_and_clear();
                return Err(ForgeError::Other(error));
            }
            _ => {}
        }

        let settled = dashboard.detail().is_some_and(|detail| detail.is_settled());
        let Some(wake) = dashboard.next_wakeup().filter(|_| !settled) else {
            break;
        };
        debug!(task_id = %id, "Waiting for next poll");

        tokio::select! {
            _ = sleep_until(wake) => {}
            _ = shutdown.wait_for_shutdown() => {
                bar.finish_and_clear();
                println!("{}", "Stopped watching; the task keeps running".yellow());
                return Ok(report.last_status().cloned());
            }
        }
    }

    bar.finish_and_clear();
    let status = report.last_status().cloned();
    if let Some(status) = &status {
        info!(task_id = %id, status = %status, "Task settled");
        println!("{} {}", "Finished watching:".bold(), colored_status(status));
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, CallKind, MockTaskApi};

    fn quick_settings() -> DashboardSettings {
        let mut settings = DashboardSettings::default();
        settings.policy = crate::poll::PollPolicy::new(Duration::from_millis(5));
        settings
    }

    #[tokio::test]
    async fn test_watch_follows_until_completed() {
        let mock = Arc::new(MockTaskApi::with_tasks(vec![fixtures::task("1", TaskStatus::Pending)]));
        mock.script_statuses("1", [TaskStatus::Running, TaskStatus::Running, TaskStatus::Completed]);

        let status = watch_task(mock.clone(), quick_settings(), "1", false, &ShutdownCoordinator::new())
            .await
            .unwrap();

        assert_eq!(status, Some(TaskStatus::Completed));
        assert_eq!(mock.count_for(CallKind::Get, "1"), 3);
    }

    #[tokio::test]
    async fn test_watch_missing_task_is_not_found() {
        let mock = Arc::new(MockTaskApi::new());
        let err = watch_task(mock, quick_settings(), "9", false, &ShutdownCoordinator::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_watch_with_failed_start_errors() {
        let mock = Arc::new(MockTaskApi::with_tasks(vec![fixtures::task("1", TaskStatus::Pending)]));
        mock.fail_next(CallKind::Start, ForgeError::Other("backend busy".into()));

        let err = watch_task(mock.clone(), quick_settings(), "1", true, &ShutdownCoordinator::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("backend busy"));
        assert_eq!(mock.count(CallKind::Get), 0);
    }

    #[test]
    fn test_report_prints_only_new_log_lines() {
        let mut page = TaskPage {
            id: "1".into(),
            name: "Login".into(),
            description: None,
            status: TaskStatus::Running,
            badge: crate::views::status_badge(&TaskStatus::Running),
            execution_status: Some(TaskStatus::Running),
            definition: crate::views::Definition::Yaml(String::new()),
            cells: vec![],
            logs: vec!["[10:00:00] INFO: a".into()],
            screenshots: vec![],
            start_enabled: false,
            polling: true,
            error: None,
        };

        let mut report = WatchReport::new();
        assert_eq!(report.observe(&page).len(), 2);
        assert!(report.observe(&page).is_empty());

        page.logs.push("[10:00:01] INFO: b".into());
        let lines = report.observe(&page);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("b"));
    }
}
