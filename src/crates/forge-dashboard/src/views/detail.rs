//! Task detail view model
//!
//! Drives two pollers, one for the task record and one for its execution
//! snapshot. The task poller follows `Task.status`; the execution poller
//! starts only once a task record has loaded and then follows
//! `ExecutionState.status`. The badge and the start button use
//! `Task.status`; cells and logs come from the execution snapshot.

use super::badge::{cell_indicator, status_badge, Badge, CellIndicator};
use crate::config::DetailPanel;
use crate::models::{StepStatus, Task, TaskStatus};
use crate::poll::{PollPhase, PollPolicy, Poller};
use crate::store::{QueryKey, QueryStore, Ticket};
use tokio::time::Instant;
use tracing::debug;

/// Resolve a step screenshot against the backend base URL
///
/// Absolute URLs pass through; paths are joined with exactly one slash.
pub fn screenshot_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub index: u32,
    pub content: String,
    pub status: StepStatus,
    pub screenshot_url: Option<String>,
}

/// Left column: per-step breakdown when available, otherwise raw YAML
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Steps(Vec<StepView>),
    Yaml(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    pub id: String,
    pub code: String,
    pub status: String,
    pub indicator: CellIndicator,
    pub output: Option<String>,
}

/// Everything the detail screen renders for a loaded task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPage {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub badge: Badge,
    pub execution_status: Option<TaskStatus>,
    pub definition: Definition,
    pub cells: Vec<CellView>,
    pub logs: Vec<String>,
    /// Steps that carry a screenshot, in step order
    pub screenshots: Vec<StepView>,
    pub start_enabled: bool,
    pub polling: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    /// Task not loaded yet; nothing else is rendered
    Loading { error: Option<String> },
    /// Backend has no such task
    NotFound { id: String },
    Loaded(Box<TaskPage>),
}

#[derive(Debug)]
pub struct TaskDetailViewModel {
    task_id: String,
    task_poller: Poller,
    execution_poller: Poller,
    panel: DetailPanel,
    selected_screenshot: usize,
}

impl TaskDetailViewModel {
    pub fn new(task_id: impl Into<String>, policy: PollPolicy, panel: DetailPanel) -> Self {
        Self {
            task_id: task_id.into(),
            task_poller: Poller::new(policy),
            execution_poller: Poller::new(policy),
            panel,
            selected_screenshot: 0,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn task_key(&self) -> QueryKey {
        QueryKey::Task(self.task_id.clone())
    }

    pub fn execution_key(&self) -> QueryKey {
        QueryKey::Execution(self.task_id.clone())
    }

    pub fn task_phase(&self) -> PollPhase {
        self.task_poller.phase()
    }

    pub fn execution_phase(&self) -> PollPhase {
        self.execution_poller.phase()
    }

    /// Begin polling the task record
    pub fn open(&mut self, now: Instant) {
        self.task_poller.arm(now);
    }

    pub fn stop(&mut self) {
        self.task_poller.stop();
        self.execution_poller.stop();
    }

    /// Neither poller has anything scheduled or in flight
    pub fn is_settled(&self) -> bool {
        self.task_poller.phase() != PollPhase::Polling && self.execution_poller.phase() != PollPhase::Polling
    }

    /// Resources whose next poll is due
    pub fn due(&self, now: Instant) -> Vec<QueryKey> {
        let mut keys = Vec::new();
        if self.task_poller.is_due(now) {
            keys.push(self.task_key());
        }
        if self.execution_poller.is_due(now) {
            keys.push(self.execution_key());
        }
        keys
    }

    /// Earliest scheduled poll
    pub fn next_due(&self) -> Option<Instant> {
        match (self.task_poller.next_due(), self.execution_poller.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn mark_dispatched(&mut self, ticket: &Ticket) {
        if ticket.key == self.task_key() {
            self.task_poller.mark_dispatched(ticket.epoch);
        } else if ticket.key == self.execution_key() {
            self.execution_poller.mark_dispatched(ticket.epoch);
        }
    }

    /// Feed a completed fetch after the store has applied it
    ///
    /// The verdict comes from the held copy: a failed fetch leaves it as it
    /// was, and a poller with nothing ever loaded stops.
    pub fn on_fetched(&mut self, ticket: &Ticket, store: &QueryStore, now: Instant) {
        if ticket.key == self.task_key() {
            if !self.task_poller.awaiting(ticket.epoch) {
                return;
            }
            match store.task(&self.task_id).and_then(|query| query.data()) {
                Some(record) => {
                    let status = record.as_ref().map(|task| &task.status);
                    self.task_poller.on_result(status, now);
                    if let Some(status) = status {
                        self.gate_execution(status, now);
                    }
                }
                None => self.task_poller.stop(),
            }
            debug!(task_id = %self.task_id, phase = ?self.task_poller.phase(), "Task poll completed");
        } else if ticket.key == self.execution_key() {
            if !self.execution_poller.awaiting(ticket.epoch) {
                return;
            }
            match store.execution(&self.task_id).and_then(|query| query.data()) {
                Some(execution) => self.execution_poller.on_result(Some(&execution.status), now),
                None => self.execution_poller.stop(),
            }
            debug!(task_id = %self.task_id, phase = ?self.execution_poller.phase(), "Execution poll completed");
        }
    }

    /// Arm the execution poller once a record exists, and again whenever
    /// the task reports activity after the execution had settled
    fn gate_execution(&mut self, task_status: &TaskStatus, now: Instant) {
        let rearm = match self.execution_poller.phase() {
            PollPhase::Idle => true,
            PollPhase::Settled => task_status.is_active(),
            PollPhase::Polling => false,
        };
        if rearm {
            self.execution_poller.arm(now);
        }
    }

    /// Re-poll after an invalidation
    pub fn on_invalidated(&mut self, key: &QueryKey, store: &QueryStore, now: Instant) {
        if *key == self.task_key() {
            self.task_poller.arm(now);
        } else if *key == self.execution_key() && store.task_record(&self.task_id).is_some() {
            self.execution_poller.arm(now);
        }
    }

    pub fn panel(&self) -> DetailPanel {
        self.panel
    }

    pub fn toggle_panel(&mut self) {
        self.panel = self.panel.toggled();
    }

    pub fn selected_screenshot(&self) -> usize {
        self.selected_screenshot
    }

    pub fn select_next_screenshot(&mut self, count: usize) {
        if count > 0 {
            self.selected_screenshot = (self.selected_screenshot.min(count - 1) + 1) % count;
        }
    }

    pub fn select_prev_screenshot(&mut self, count: usize) {
        if count > 0 {
            let current = self.selected_screenshot.min(count - 1);
            self.selected_screenshot = if current == 0 { count - 1 } else { current - 1 };
        }
    }

    /// Start is offered only for a loaded task that is not active
    pub fn start_enabled(&self, store: &QueryStore) -> bool {
        store.task_record(&self.task_id).is_some_and(|task| !task.is_active())
    }

    pub fn view(&self, store: &QueryStore, base_url: &str) -> DetailView {
        let Some(query) = store.task(&self.task_id) else {
            return DetailView::Loading { error: None };
        };
        let task = match query.data() {
            None => {
                return DetailView::Loading {
                    error: query.error().map(str::to_string),
                }
            }
            Some(None) => {
                return DetailView::NotFound {
                    id: self.task_id.clone(),
                }
            }
            Some(Some(task)) => task,
        };

        let execution = store.execution(&self.task_id);
        let snapshot = execution.and_then(|query| query.data());
        let error = query
            .error()
            .or_else(|| execution.and_then(|query| query.error()))
            .map(str::to_string);

        let steps = step_views(task, base_url);
        let screenshots = steps
            .iter()
            .filter(|step| step.screenshot_url.is_some())
            .cloned()
            .collect();
        let definition = if steps.is_empty() {
            Definition::Yaml(task.yaml_content.clone())
        } else {
            Definition::Steps(steps)
        };

        DetailView::Loaded(Box::new(TaskPage {
            id: task.id.clone(),
            name: task.name.clone(),
            description: task.description.clone(),
            status: task.status.clone(),
            badge: status_badge(&task.status),
            execution_status: snapshot.map(|execution| execution.status.clone()),
            definition,
            cells: snapshot
                .map(|execution| {
                    execution
                        .cells
                        .iter()
                        .map(|cell| CellView {
                            id: cell.id.clone(),
                            code: cell.code.clone(),
                            status: cell.status.clone(),
                            indicator: cell_indicator(&cell.status),
                            output: cell.output.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            logs: snapshot
                .map(|execution| execution.logs.iter().map(|log| log.display_line()).collect())
                .unwrap_or_default(),
            screenshots,
            start_enabled: !task.is_active(),
            polling: !self.is_settled(),
            error,
        }))
    }
}

fn step_views(task: &Task, base_url: &str) -> Vec<StepView> {
    task.steps
        .iter()
        .map(|step| StepView {
            index: step.index,
            content: step.content.clone(),
            status: step.status,
            screenshot_url: step.screenshot_path().map(|path| screenshot_url(base_url, path)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellExecutionState, ExecutionState, StepState};
    use crate::store::Fetched;
    use chrono::Utc;
    use std::time::Duration;

    const BASE: &str = "http://localhost:8000";

    fn task(id: &str, status: TaskStatus, steps: Vec<StepState>) -> Task {
        Task {
            id: id.to_string(),
            name: "checkout".to_string(),
            description: None,
            yaml_content: "steps:\n  - open /\n".to_string(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            execution_id: None,
            steps,
        }
    }

    fn vm(id: &str) -> TaskDetailViewModel {
        TaskDetailViewModel::new(id, PollPolicy::new(Duration::from_secs(1)), DetailPanel::Screenshots)
    }

    fn poll_task(vm: &mut TaskDetailViewModel, store: &mut QueryStore, record: Option<Task>, now: Instant) {
        let ticket = store.begin(vm.task_key());
        vm.mark_dispatched(&ticket);
        store.apply(&ticket, Ok(Fetched::Task(record)));
        vm.on_fetched(&ticket, store, now);
    }

    #[test]
    fn test_screenshot_url_resolution() {
        assert_eq!(
            screenshot_url(BASE, "/screenshots/1/step_0.png"),
            "http://localhost:8000/screenshots/1/step_0.png"
        );
        assert_eq!(
            screenshot_url("http://10.0.0.2:8000/", "/shots/a.png"),
            "http://10.0.0.2:8000/shots/a.png"
        );
    }

    #[test]
    fn test_screenshot_relative_path_gets_one_slash() {
        assert_eq!(
            screenshot_url(BASE, "screenshots/1/step_0.png"),
            "http://localhost:8000/screenshots/1/step_0.png"
        );
        assert_eq!(
            screenshot_url("http://host/forge/", "shots/a.png"),
            "http://host/forge/shots/a.png"
        );
    }

    #[test]
    fn test_screenshot_absolute_url_is_kept() {
        assert_eq!(
            screenshot_url(BASE, "http://cdn.example/s.png"),
            "http://cdn.example/s.png"
        );
        assert_eq!(
            screenshot_url(BASE, "https://cdn.example/1/step_0.png"),
            "https://cdn.example/1/step_0.png"
        );
    }

    #[test]
    fn test_loading_until_task_arrives() {
        let now = Instant::now();
        let store = QueryStore::new();
        let mut vm = vm("1");
        vm.open(now);

        assert_eq!(vm.view(&store, BASE), DetailView::Loading { error: None });
        assert_eq!(vm.due(now), vec![QueryKey::Task("1".into())]);
    }

    #[test]
    fn test_execution_waits_for_task_record() {
        let now = Instant::now();
        let mut store = QueryStore::new();
        let mut vm = vm("1");
        vm.open(now);
        assert_eq!(vm.execution_phase(), PollPhase::Idle);

        poll_task(&mut vm, &mut store, Some(task("1", TaskStatus::Pending, vec![])), now);
        assert_eq!(vm.execution_phase(), PollPhase::Polling);
        assert_eq!(vm.due(now), vec![QueryKey::Execution("1".into())]);
    }

    #[test]
    fn test_not_found_settles_without_execution() {
        let now = Instant::now();
        let mut store = QueryStore::new();
        let mut vm = vm("404");
        vm.open(now);
        poll_task(&mut vm, &mut store, None, now);

        assert_eq!(vm.view(&store, BASE), DetailView::NotFound { id: "404".into() });
        assert_eq!(vm.task_phase(), PollPhase::Settled);
        assert_eq!(vm.execution_phase(), PollPhase::Idle);
        assert!(vm.due(now + Duration::from_secs(30)).is_empty());
    }

    #[test]
    fn test_failed_first_fetch_stops_polling() {
        let now = Instant::now();
        let mut store = QueryStore::new();
        let mut vm = vm("1");
        vm.open(now);

        let ticket = store.begin(vm.task_key());
        vm.mark_dispatched(&ticket);
        store.apply(&ticket, Err("connection refused".into()));
        vm.on_fetched(&ticket, &store, now);

        assert_eq!(vm.task_phase(), PollPhase::Idle);
        assert_eq!(
            vm.view(&store, BASE),
            DetailView::Loading {
                error: Some("connection refused".into())
            }
        );
    }

    #[test]
    fn test_failed_poll_keeps_verdict_of_held_copy() {
        let now = Instant::now();
        let mut store = QueryStore::new();
        let mut vm = vm("1");
        vm.open(now);
        poll_task(&mut vm, &mut store, Some(task("1", TaskStatus::Running, vec![])), now);

        let later = now + Duration::from_secs(1);
        let ticket = store.begin(vm.task_key());
        vm.mark_dispatched(&ticket);
        store.apply(&ticket, Err("timeout".into()));
        vm.on_fetched(&ticket, &store, later);

        assert_eq!(vm.task_phase(), PollPhase::Polling);
        match vm.view(&store, BASE) {
            DetailView::Loaded(page) => {
                assert_eq!(page.badge.label, "Running");
                assert_eq!(page.error.as_deref(), Some("timeout"));
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn test_definition_prefers_steps() {
        let now = Instant::now();
        let mut store = QueryStore::new();
        let mut vm = vm("1");
        vm.open(now);

        let steps = vec![
            StepState {
                index: 0,
                content: "open /".into(),
                status: StepStatus::Completed,
                screenshot: Some("/screenshots/1/step_0.png".into()),
            },
            StepState {
                index: 1,
                content: "click buy".into(),
                status: StepStatus::Running,
                screenshot: None,
            },
        ];
        poll_task(&mut vm, &mut store, Some(task("1", TaskStatus::Running, steps)), now);

        let DetailView::Loaded(page) = vm.view(&store, BASE) else {
            panic!("task should be loaded");
        };
        let Definition::Steps(steps) = &page.definition else {
            panic!("expected steps");
        };
        assert_eq!(
            steps[0].screenshot_url.as_deref(),
            Some("http://localhost:8000/screenshots/1/step_0.png")
        );
        assert_eq!(steps[1].screenshot_url, None);
        assert_eq!(page.screenshots.len(), 1);
        assert!(!page.start_enabled);
    }

    #[test]
    fn test_definition_falls_back_to_yaml() {
        let now = Instant::now();
        let mut store = QueryStore::new();
        let mut vm = vm("1");
        vm.open(now);
        poll_task(&mut vm, &mut store, Some(task("1", TaskStatus::Completed, vec![])), now);

        let DetailView::Loaded(page) = vm.view(&store, BASE) else {
            panic!("task should be loaded");
        };
        assert_eq!(page.definition, Definition::Yaml("steps:\n  - open /\n".into()));
        assert!(page.start_enabled);
        assert!(vm.start_enabled(&store));
    }

    #[test]
    fn test_cells_and_logs_from_execution() {
        let now = Instant::now();
        let mut store = QueryStore::new();
        let mut vm = vm("1");
        vm.open(now);
        poll_task(&mut vm, &mut store, Some(task("1", TaskStatus::Running, vec![])), now);

        let ticket = store.begin(vm.execution_key());
        vm.mark_dispatched(&ticket);
        store.apply(
            &ticket,
            Ok(Fetched::Execution(ExecutionState {
                task_id: "1".into(),
                status: TaskStatus::Running,
                logs: vec![],
                cells: vec![
                    CellExecutionState {
                        id: "c1".into(),
                        status: "success".into(),
                        code: "page.goto('/')".into(),
                        output: Some("ok".into()),
                    },
                    CellExecutionState {
                        id: "c2".into(),
                        status: "pending".into(),
                        code: "page.click('#buy')".into(),
                        output: None,
                    },
                ],
            })),
        );
        vm.on_fetched(&ticket, &store, now);

        let DetailView::Loaded(page) = vm.view(&store, BASE) else {
            panic!("task should be loaded");
        };
        assert_eq!(page.execution_status, Some(TaskStatus::Running));
        assert_eq!(page.cells[0].indicator, CellIndicator::Solid);
        assert_eq!(page.cells[1].indicator, CellIndicator::Dot);
        assert_eq!(page.cells[1].output, None);
        assert_eq!(vm.execution_phase(), PollPhase::Polling);
    }

    #[test]
    fn test_screenshot_selection_wraps() {
        let mut vm = vm("1");
        vm.select_next_screenshot(3);
        vm.select_next_screenshot(3);
        vm.select_next_screenshot(3);
        assert_eq!(vm.selected_screenshot(), 0);
        vm.select_prev_screenshot(3);
        assert_eq!(vm.selected_screenshot(), 2);
        vm.select_next_screenshot(0);
        assert_eq!(vm.selected_screenshot(), 2);
    }
}
